//! Raw-text recovery for documents the HTML parser mangles.
//!
//! An unclosed `<title>` or `<textarea>`, or a stray comment opener, makes the
//! parser swallow the rest of the page as text. The sweep below works on the
//! raw document instead and never fails.

use std::sync::LazyLock;

use regex::Regex;

use super::extract::inline_script;
use super::types::{ExternalScript, ScriptInventory};
use crate::models::LoadAttribute;
use crate::signatures::{find_matches, SignatureCatalog};
use crate::utils::compile_regex_unsafe;

static SCRIPT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"(?is)<script\b([^>]*)>(.*?)</script\s*>", "SCRIPT_ELEMENT")
});
static SRC_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r#"(?i)\bsrc\s*=\s*["']?([^"'\s>]+)"#, "SRC_ATTRIBUTE")
});
static ASYNC_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"(?i)\basync\b", "ASYNC_ATTRIBUTE"));
static DEFER_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"(?i)\bdefer\b", "DEFER_ATTRIBUTE"));
static NOSCRIPT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"(?is)<noscript\b[^>]*>(.*?)</noscript\s*>", "NOSCRIPT_ELEMENT")
});
/// Script URLs anywhere in the text, for references outside any element.
static SCRIPT_URL: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r#"(?i)(?:https?:)?//[^\s"'<>()]+?\.js(?:\?[^\s"'<>()]*)?"#, "SCRIPT_URL")
});

/// Whether the raw-text sweep should run: the parsed scripts match no
/// signature, yet the raw text names a known platform.
pub(crate) fn needs_fallback(
    structural: &ScriptInventory,
    raw: &str,
    catalog: &SignatureCatalog,
) -> bool {
    catalog.mentions_known_platform(raw) && find_matches(structural, catalog).is_empty()
}

/// Adds what the sweep found and the parser did not.
///
/// The inventory is marked degraded only when something was recovered.
pub(crate) fn merge_recovered(inventory: &mut ScriptInventory, recovered: ScriptInventory) {
    let mut added = 0usize;
    for script in recovered.external_scripts {
        if !inventory.external_scripts.iter().any(|s| s.src == script.src) {
            inventory.external_scripts.push(script);
            added += 1;
        }
    }
    for script in recovered.inline_scripts {
        if !inventory.inline_scripts.iter().any(|s| s.text == script.text) {
            inventory.inline_scripts.push(script);
            added += 1;
        }
    }
    for block in recovered.noscript_blocks {
        if !inventory.noscript_blocks.contains(&block) {
            inventory.noscript_blocks.push(block);
            added += 1;
        }
    }
    if added > 0 {
        inventory.parse_degraded = true;
    }
}

/// Recovers scripts from raw document text with regular expressions.
pub(crate) fn sweep_raw_text(raw: &str, catalog: &SignatureCatalog) -> ScriptInventory {
    let mut inventory = ScriptInventory {
        parse_degraded: true,
        ..Default::default()
    };

    for caps in SCRIPT_ELEMENT.captures_iter(raw) {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str());

        if let Some(src) = SRC_ATTRIBUTE.captures(attrs).and_then(|c| c.get(1)) {
            let load = if ASYNC_ATTRIBUTE.is_match(attrs) {
                LoadAttribute::Async
            } else if DEFER_ATTRIBUTE.is_match(attrs) {
                LoadAttribute::Defer
            } else {
                LoadAttribute::None
            };
            push_external(&mut inventory, src.as_str(), load);
        } else if !body.trim().is_empty() {
            inventory.inline_scripts.push(inline_script(body));
        }
    }

    for caps in NOSCRIPT_ELEMENT.captures_iter(raw) {
        if let Some(inner) = caps.get(1).map(|m| m.as_str().trim()) {
            if !inner.is_empty() {
                inventory.noscript_blocks.push(inner.to_string());
            }
        }
    }

    // Loader URLs of known platforms that are not inside a recoverable element
    for m in SCRIPT_URL.find_iter(raw) {
        let url = m.as_str();
        if catalog.mentions_known_platform(url) {
            push_external(&mut inventory, url, LoadAttribute::None);
        }
    }

    log::debug!(
        "Raw-text sweep recovered {} external and {} inline scripts",
        inventory.external_scripts.len(),
        inventory.inline_scripts.len()
    );
    inventory
}

fn push_external(inventory: &mut ScriptInventory, src: &str, load: LoadAttribute) {
    if inventory.external_scripts.iter().any(|s| s.src == src) {
        return;
    }
    inventory.external_scripts.push(ExternalScript {
        src: src.to_string(),
        load,
    });
}
