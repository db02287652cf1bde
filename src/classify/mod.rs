//! Classification of raw matches into a per-page detection.
//!
//! `classify` is a pure function of its inputs: the same matches and target
//! always produce the same `Detection`.

mod advice;
mod target;

use std::collections::BTreeMap;

use crate::config::DetectionTarget;
use crate::models::{
    Detection, DirectTagFinding, ImplementationType, LoadAttribute, LoadingPattern, Methodology,
    Platform, SignatureCategory, SourceLocation, TagManagerFinding,
};
use crate::signatures::RawMatch;

/// Turns raw matches into tag-manager and direct-tag findings, a methodology,
/// conflicts and recommendations.
pub fn classify(matches: &[RawMatch], target: &DetectionTarget) -> Detection {
    let mut managed: BTreeMap<Platform, Vec<&RawMatch>> = BTreeMap::new();
    let mut direct: BTreeMap<Platform, Vec<&RawMatch>> = BTreeMap::new();
    for m in matches {
        match m.category {
            SignatureCategory::TagManager => managed.entry(m.platform).or_default().push(m),
            SignatureCategory::DirectTag => direct.entry(m.platform).or_default().push(m),
        }
    }

    let tag_managers: Vec<TagManagerFinding> = managed
        .into_iter()
        .map(|(platform, group)| {
            let mut finding = tag_manager_finding(platform, &group);
            finding.target_match = target::match_tag_manager(&finding, target);
            finding
        })
        .collect();

    let direct_tags: Vec<DirectTagFinding> = direct
        .into_iter()
        .map(|(platform, group)| DirectTagFinding {
            platform,
            ids: distinct(group.iter().filter_map(|m| m.captured_id.as_deref())),
            locations: {
                let mut locations = Vec::new();
                for m in &group {
                    if !locations.contains(&m.source_location) {
                        locations.push(m.source_location);
                    }
                }
                locations
            },
        })
        .collect();

    let methodology = match tag_managers.len() {
        0 => Methodology::None,
        1 => Methodology::SingleManaged,
        _ => Methodology::DualManaged,
    };

    let target_match = if target.is_unconstrained() {
        None
    } else {
        Some(tag_managers.iter().any(|tm| tm.target_match == Some(true)))
    };

    let conflicts = advice::conflicts(&tag_managers, &direct_tags);
    let recommendations = advice::recommendations(&tag_managers, &direct_tags, target);

    Detection {
        tag_managers,
        direct_tags,
        methodology,
        conflicts,
        recommendations,
        target_match,
        match_count: matches.len(),
    }
}

fn tag_manager_finding(platform: Platform, group: &[&RawMatch]) -> TagManagerFinding {
    let container_ids = distinct(group.iter().filter_map(|m| m.captured_id.as_deref()));

    // The first match that carries a structured identifier wins
    let structured = group
        .iter()
        .find(|m| m.account.is_some() || m.profile.is_some())
        .copied();
    let account = structured.and_then(|m| m.account.clone());
    let profile = structured.and_then(|m| m.profile.clone());
    let environment = structured.and_then(|m| normalize_environment(platform, m));

    TagManagerFinding {
        platform,
        container_ids,
        account,
        profile,
        environment,
        implementation: implementation_type(group),
        loading: loading_pattern(group),
        target_match: None,
    }
}

/// Maps platform-specific environment tokens onto prod/qa/dev where the
/// platform has a convention; other values are kept, lowercased.
fn normalize_environment(platform: Platform, m: &RawMatch) -> Option<String> {
    match (platform, m.environment.as_deref()) {
        // Launch libraries without a suffix are the production build
        (Platform::AdobeLaunch, None) => Some("prod".to_string()),
        (Platform::AdobeLaunch, Some("development")) => Some("dev".to_string()),
        (Platform::AdobeLaunch, Some("staging")) => Some("qa".to_string()),
        (_, Some(env)) => Some(env.to_ascii_lowercase()),
        (_, None) => None,
    }
}

fn implementation_type(group: &[&RawMatch]) -> ImplementationType {
    let external = group
        .iter()
        .any(|m| m.source_location == SourceLocation::ExternalScript);
    let inline = group
        .iter()
        .any(|m| m.source_location == SourceLocation::InlineScript);
    let inline_dynamic = group
        .iter()
        .any(|m| m.source_location == SourceLocation::InlineScript && m.creates_script);

    match (external, inline, inline_dynamic) {
        (true, _, true) => ImplementationType::Hybrid,
        (true, _, false) => ImplementationType::Static,
        (false, true, _) => ImplementationType::DynamicLoading,
        (false, false, _) => ImplementationType::NoscriptOnly,
    }
}

fn loading_pattern(group: &[&RawMatch]) -> LoadingPattern {
    let first_external = group
        .iter()
        .find(|m| m.source_location == SourceLocation::ExternalScript);
    if let Some(m) = first_external {
        return match m.load_attribute {
            LoadAttribute::Async => LoadingPattern::Async,
            LoadAttribute::Defer => LoadingPattern::Deferred,
            LoadAttribute::None => LoadingPattern::Synchronous,
        };
    }
    if group.iter().any(|m| m.creates_script) {
        LoadingPattern::Dynamic
    } else {
        LoadingPattern::Synchronous
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}
