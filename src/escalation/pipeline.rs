//! Document → finding: analysis, matching and classification of one page.

use chrono::Utc;

use crate::analyzer::{analyze_with_catalog, ScriptInventory};
use crate::classify::classify;
use crate::config::DetectionTarget;
use crate::engine::RetrievedDocument;
use crate::error_handling::RetrievalError;
use crate::models::{
    EscalationInfo, FetchTier, FindingError, PageFinding, ScriptSummary,
};
use crate::signatures::{find_matches, SignatureCatalog};

/// Runs the synchronous part of detection on a retrieved document.
pub(crate) fn process_document(
    url: &str,
    document: &RetrievedDocument,
    tier: FetchTier,
    target: &DetectionTarget,
    catalog: &SignatureCatalog,
) -> PageFinding {
    let analyzed = analyze_with_catalog(&document.body, catalog);
    let matches = find_matches(&analyzed.inventory, catalog);
    let detection = classify(&matches, target);

    PageFinding {
        url: url.to_string(),
        final_url: Some(document.final_url.clone()),
        timestamp: Utc::now(),
        success: true,
        fetch_tier: tier,
        http_status: Some(document.status),
        title: document.title.clone().or(analyzed.title),
        detection,
        scripts: summarize(&analyzed.inventory),
        parse_degraded: analyzed.inventory.parse_degraded,
        escalation: EscalationInfo::default(),
        error: None,
    }
}

/// A well-formed finding for a retrieval that produced no document.
pub(crate) fn failed_finding(url: &str, tier: FetchTier, error: &RetrievalError) -> PageFinding {
    PageFinding::failed(
        url,
        tier,
        FindingError::new(error.kind(), error.status(), error),
    )
}

fn summarize(inventory: &ScriptInventory) -> ScriptSummary {
    ScriptSummary {
        external: inventory.external_sources(),
        inline_count: inventory.inline_scripts.len(),
        noscript_count: inventory.noscript_blocks.len(),
    }
}
