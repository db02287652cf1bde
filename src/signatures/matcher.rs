//! Applies the catalog to a script inventory.

use std::collections::HashSet;

use serde::Serialize;

use super::catalog::{SignatureCatalog, TagSignature};
use crate::analyzer::ScriptInventory;
use crate::config::MATCH_EXCERPT_CHARS;
use crate::models::{LoadAttribute, Platform, SignatureCategory, SourceLocation};

/// One signature hit. Produced per document, discarded after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    pub signature_name: &'static str,
    pub platform: Platform,
    pub category: SignatureCategory,
    pub captured_id: Option<String>,
    pub account: Option<String>,
    pub profile: Option<String>,
    pub environment: Option<String>,
    pub source_location: SourceLocation,
    pub load_attribute: LoadAttribute,
    /// The inline text that matched also contains script-creation code
    pub creates_script: bool,
    /// Script src, or a short window of inline text around the match
    pub excerpt: String,
}

type MatchKey = (
    &'static str,
    Option<String>,
    SourceLocation,
    LoadAttribute,
    bool,
);

/// Finds every signature match in the inventory.
///
/// External scripts are matched on their `src`, inline scripts on their body
/// and noscript blocks on their markup. Identical hits (same signature, id,
/// location and attributes) are reported once.
pub fn find_matches(inventory: &ScriptInventory, catalog: &SignatureCatalog) -> Vec<RawMatch> {
    let mut matches = Vec::new();
    let mut seen: HashSet<MatchKey> = HashSet::new();

    let mut push = |m: RawMatch| {
        let key = (
            m.signature_name,
            m.captured_id.clone(),
            m.source_location,
            m.load_attribute,
            m.creates_script,
        );
        if seen.insert(key) {
            matches.push(m);
        }
    };

    for script in &inventory.external_scripts {
        for signature in catalog.signatures() {
            for m in match_text(
                signature,
                &script.src,
                SourceLocation::ExternalScript,
                script.load,
                false,
            ) {
                push(m);
            }
        }
    }

    for script in &inventory.inline_scripts {
        for signature in catalog.signatures() {
            for m in match_text(
                signature,
                &script.text,
                SourceLocation::InlineScript,
                LoadAttribute::None,
                script.creates_script,
            ) {
                push(m);
            }
        }
    }

    for block in &inventory.noscript_blocks {
        for signature in catalog.signatures() {
            for m in match_text(
                signature,
                block,
                SourceLocation::Noscript,
                LoadAttribute::None,
                false,
            ) {
                push(m);
            }
        }
    }

    log::trace!("{} raw signature matches", matches.len());
    matches
}

fn match_text(
    signature: &TagSignature,
    text: &str,
    location: SourceLocation,
    load: LoadAttribute,
    creates_script: bool,
) -> Vec<RawMatch> {
    if !signature.applies_to(text) {
        return Vec::new();
    }

    signature
        .matcher
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
            let account = group("account");
            let profile = group("profile");
            let environment = group("env");

            let captured_id = group("id").or_else(|| {
                let parts: Vec<&str> = [&account, &profile, &environment]
                    .into_iter()
                    .flatten()
                    .map(String::as_str)
                    .collect();
                (!parts.is_empty()).then(|| parts.join("/"))
            });

            let excerpt = match location {
                SourceLocation::ExternalScript => text.to_string(),
                _ => excerpt_around(text, whole.start(), whole.end()),
            };

            Some(RawMatch {
                signature_name: signature.name,
                platform: signature.platform,
                category: signature.category,
                captured_id,
                account,
                profile,
                environment,
                source_location: location,
                load_attribute: load,
                creates_script,
                excerpt,
            })
        })
        .collect()
}

/// At most `MATCH_EXCERPT_CHARS` characters of `text` centred on a match.
fn excerpt_around(text: &str, start: usize, end: usize) -> String {
    let pad = MATCH_EXCERPT_CHARS.saturating_sub(end - start) / 2;
    let mut from = start.saturating_sub(pad);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + pad).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].trim().to_string()
}
