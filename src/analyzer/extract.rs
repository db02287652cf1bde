//! Structural extraction with an HTML parser.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::types::{ExternalScript, InlineScript, ScriptInventory};
use crate::config::MAX_SCRIPT_CONTENT_SIZE;
use crate::models::LoadAttribute;
use crate::utils::{compile_regex_unsafe, parse_selector_unsafe};

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("script", "SCRIPT_SELECTOR"));
static NOSCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("noscript", "NOSCRIPT_SELECTOR"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("title", "TITLE_SELECTOR"));

/// Code that builds a script element and inserts it into the document.
static SCRIPT_CREATION: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"(?i)createElement\s*\(\s*['"]?script|\.(?:insertBefore|appendChild)\s*\(|\.async\s*=\s*(?:!0|true|1)|document\.write\s*\(\s*['"]<script"#,
        "SCRIPT_CREATION",
    )
});

/// Script types that carry data rather than code.
const NON_EXECUTABLE_TYPES: &[&str] = &["application/ld+json", "application/json", "text/template"];

/// Extracts scripts and noscript blocks from a parsed document.
pub(crate) fn extract_structural(document: &Html) -> ScriptInventory {
    let mut inventory = ScriptInventory::default();

    for element in document.select(&SCRIPT_SELECTOR) {
        if let Some(src) = element.value().attr("src") {
            let src = src.trim();
            if !src.is_empty() {
                inventory.external_scripts.push(ExternalScript {
                    src: src.to_string(),
                    load: load_attribute(&element),
                });
                continue;
            }
        }

        let is_data = element
            .value()
            .attr("type")
            .is_some_and(|t| NON_EXECUTABLE_TYPES.contains(&t.trim().to_ascii_lowercase().as_str()));
        if is_data {
            continue;
        }

        let text: String = element.text().collect();
        if text.trim().is_empty() {
            continue;
        }
        inventory.inline_scripts.push(inline_script(&text));
    }

    for element in document.select(&NOSCRIPT_SELECTOR) {
        let inner = element.inner_html();
        if !inner.trim().is_empty() {
            inventory.noscript_blocks.push(inner);
        }
    }

    inventory
}

fn load_attribute(element: &ElementRef<'_>) -> LoadAttribute {
    let attrs = element.value();
    if attrs.attr("async").is_some() {
        LoadAttribute::Async
    } else if attrs.attr("defer").is_some() {
        LoadAttribute::Defer
    } else {
        LoadAttribute::None
    }
}

pub(crate) fn inline_script(text: &str) -> InlineScript {
    let text = truncate_at_char_boundary(text, MAX_SCRIPT_CONTENT_SIZE);
    InlineScript {
        creates_script: SCRIPT_CREATION.is_match(text),
        text: text.to_string(),
    }
}

pub(crate) fn extract_title_from(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_creation_patterns() {
        assert!(inline_script("var s=document.createElement('script');").creates_script);
        assert!(inline_script("f.parentNode.insertBefore(j,f);").creates_script);
        assert!(inline_script("j.async=true;").creates_script);
        assert!(!inline_script("window.dataLayer = window.dataLayer || [];").creates_script);
    }

    #[test]
    fn test_truncate_at_char_boundary() {
        let text = "ééé";
        assert_eq!(truncate_at_char_boundary(text, 3), "é");
        assert_eq!(truncate_at_char_boundary(text, 10), "ééé");
    }
}
