//! Markup and script analysis.
//!
//! `analyze` never fails: malformed markup yields a best-effort (possibly
//! empty) inventory. When the parsed scripts match no signature but the raw
//! text mentions a known platform, a regex sweep over the raw document
//! recovers what the parser lost and marks the inventory as degraded.

mod extract;
mod fallback;
mod types;

use scraper::Html;

pub use types::{ExternalScript, InlineScript, ScriptInventory};

use crate::signatures::SignatureCatalog;

/// A parsed document: script inventory plus title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalyzedDocument {
    pub inventory: ScriptInventory,
    pub title: Option<String>,
}

/// Extracts script references, inline script bodies and noscript fallbacks
/// using the built-in catalog's hints for the fallback decision.
pub fn analyze(document_text: &str) -> ScriptInventory {
    analyze_with_catalog(document_text, SignatureCatalog::builtin()).inventory
}

/// Like `analyze`, with an explicit catalog, also returning the page title.
pub fn analyze_with_catalog(document_text: &str, catalog: &SignatureCatalog) -> AnalyzedDocument {
    let document = Html::parse_document(document_text);
    let structural = extract::extract_structural(&document);
    let title = extract::extract_title_from(&document);

    let mut inventory = structural;
    if fallback::needs_fallback(&inventory, document_text, catalog) {
        log::debug!("Parsed scripts match no signature, sweeping raw text");
        let recovered = fallback::sweep_raw_text(document_text, catalog);
        fallback::merge_recovered(&mut inventory, recovered);
    }

    AnalyzedDocument { inventory, title }
}
