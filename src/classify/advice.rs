//! Conflicts and recommendations derived from a page's findings.

use super::target::describe_mismatch;
use crate::config::DetectionTarget;
use crate::models::{
    Conflict, ConflictKind, DirectTagFinding, LoadingPattern, Recommendation,
    RecommendationPriority, TagManagerFinding,
};

pub(crate) fn conflicts(
    tag_managers: &[TagManagerFinding],
    direct_tags: &[DirectTagFinding],
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    if tag_managers.len() > 1 {
        let names: Vec<&str> = tag_managers
            .iter()
            .map(|tm| tm.platform.display_name())
            .collect();
        conflicts.push(Conflict {
            kind: ConflictKind::DuplicateTracking,
            platforms: tag_managers.iter().map(|tm| tm.platform).collect(),
            message: format!(
                "{} are loaded together on this page; duplicate tracking is likely because \
                 the same events can fire from each tag manager",
                names.join(" and ")
            ),
        });
    }

    for tm in tag_managers.iter().filter(|tm| tm.container_ids.len() > 1) {
        conflicts.push(Conflict {
            kind: ConflictKind::MultipleContainers,
            platforms: vec![tm.platform],
            message: format!(
                "{} is loaded with {} different containers ({})",
                tm.platform,
                tm.container_ids.len(),
                tm.container_ids.join(", ")
            ),
        });
    }

    if !tag_managers.is_empty() && !direct_tags.is_empty() {
        let mut platforms: Vec<_> = tag_managers.iter().map(|tm| tm.platform).collect();
        platforms.extend(direct_tags.iter().map(|dt| dt.platform));
        let direct: Vec<&str> = direct_tags
            .iter()
            .map(|dt| dt.platform.display_name())
            .collect();
        conflicts.push(Conflict {
            kind: ConflictKind::DirectAndManaged,
            platforms,
            message: format!(
                "{} embedded directly alongside a tag manager; these tags bypass its \
                 consent and governance rules",
                direct.join(", ")
            ),
        });
    }

    conflicts
}

pub(crate) fn recommendations(
    tag_managers: &[TagManagerFinding],
    direct_tags: &[DirectTagFinding],
    target: &DetectionTarget,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if tag_managers.len() > 1 {
        recommendations.push(Recommendation {
            priority: RecommendationPriority::High,
            message: "Consolidate onto a single tag manager and remove the other containers \
                      once their tags have been migrated"
                .to_string(),
        });
    }

    for dt in direct_tags {
        let ids = if dt.ids.is_empty() {
            String::new()
        } else {
            format!(" ({})", dt.ids.join(", "))
        };
        let message = match tag_managers.first() {
            Some(tm) => format!(
                "Migrate the directly embedded {}{} into {}",
                dt.platform, ids, tm.platform
            ),
            None => format!(
                "Deploy a tag manager and migrate the directly embedded {}{} into it",
                dt.platform, ids
            ),
        };
        recommendations.push(Recommendation {
            priority: RecommendationPriority::Medium,
            message,
        });
    }

    for tm in tag_managers
        .iter()
        .filter(|tm| tm.loading == LoadingPattern::Synchronous)
    {
        recommendations.push(Recommendation {
            priority: RecommendationPriority::Low,
            message: format!(
                "{} loads synchronously and blocks rendering; load it asynchronously unless \
                 a synchronous file is intentional",
                tm.platform
            ),
        });
    }

    for tm in tag_managers.iter().filter(|tm| tm.target_match == Some(false)) {
        recommendations.push(Recommendation {
            priority: RecommendationPriority::High,
            message: format!(
                "{} does not match the expected configuration: {}",
                tm.platform,
                describe_mismatch(tm, target)
            ),
        });
    }

    if tag_managers.is_empty() {
        recommendations.push(Recommendation {
            priority: RecommendationPriority::Medium,
            message: "No tag manager detected on this page".to_string(),
        });
    }

    recommendations.sort_by_key(|r| r.priority);
    recommendations
}
