//! Two-tier detection: lightweight first, rendered when warranted.
//!
//! The controller never returns an error. Fetch failures are classified into
//! the finding, and a failed render falls back to the lightweight result
//! with `escalation.failed` set.

mod pipeline;
mod policy;

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{DetectionTarget, EscalationPolicy};
use crate::engine::{DetectionEngine, RetrievedDocument};
use crate::models::{EscalationInfo, EscalationReason, PageFinding};
use crate::signatures::SignatureCatalog;

use pipeline::process_document;

/// Result of one detection: the finding plus the document it was built from,
/// which the crawler mines for links.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub finding: PageFinding,
    /// `None` when no tier produced a document
    pub document: Option<String>,
}

/// Chooses between the lightweight and render engines for each page.
pub struct EscalationController {
    lightweight: Arc<dyn DetectionEngine>,
    renderer: Option<Arc<dyn DetectionEngine>>,
    policy: EscalationPolicy,
    catalog: &'static SignatureCatalog,
}

impl EscalationController {
    pub fn new(
        lightweight: Arc<dyn DetectionEngine>,
        renderer: Option<Arc<dyn DetectionEngine>>,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            lightweight,
            renderer,
            policy,
            catalog: SignatureCatalog::builtin(),
        }
    }

    pub fn renderer(&self) -> Option<&Arc<dyn DetectionEngine>> {
        self.renderer.as_ref()
    }

    /// Runs detection on `url` against `target`.
    pub async fn detect(&self, url: &str, target: &DetectionTarget) -> DetectionOutcome {
        let forced = policy::forced_host(&self.policy, url);

        let (light, light_document, reason) = match self.lightweight.retrieve(url).await {
            Ok(document) => {
                let finding = process_document(
                    url,
                    &document,
                    self.lightweight.tier(),
                    target,
                    self.catalog,
                );
                let reason = forced.or_else(|| policy::on_success(&self.policy, &finding));
                (finding, Some(document), reason)
            }
            Err(e) => {
                debug!("Lightweight retrieval of {url} failed: {e}");
                let finding = pipeline::failed_finding(url, self.lightweight.tier(), &e);
                let reason = forced.or_else(|| policy::on_failure(&self.policy, &e));
                (finding, None, reason)
            }
        };

        let (Some(reason), Some(renderer), true) = (reason, &self.renderer, self.policy.enabled)
        else {
            return DetectionOutcome {
                finding: light,
                document: light_document.map(|d| d.body),
            };
        };

        info!("Escalating {url} to the render tier ({})", describe(&reason));
        match renderer.retrieve(url).await {
            Ok(document) => {
                let rendered =
                    process_document(url, &document, renderer.tier(), target, self.catalog);
                merge(light, light_document, rendered, document, reason)
            }
            Err(e) => {
                warn!("Render tier failed for {url}: {e}");
                let mut finding = light;
                finding.escalation = EscalationInfo {
                    attempted: true,
                    reason: Some(reason),
                    succeeded: false,
                    failed: true,
                    render_error: Some(e.to_string()),
                };
                DetectionOutcome {
                    finding,
                    document: light_document.map(|d| d.body),
                }
            }
        }
    }
}

/// Combines both tiers' results.
///
/// The rendered detection wins when the lightweight tier failed or when
/// rendering found more matches. Script lists are always unioned.
fn merge(
    light: PageFinding,
    light_document: Option<RetrievedDocument>,
    rendered: PageFinding,
    rendered_document: RetrievedDocument,
    reason: EscalationReason,
) -> DetectionOutcome {
    let prefer_rendered =
        !light.success || rendered.detection.match_count > light.detection.match_count;

    let (mut base, other, document) = if prefer_rendered {
        (rendered, light, Some(rendered_document.body))
    } else {
        (light, rendered, light_document.map(|d| d.body))
    };

    for src in other.scripts.external {
        if !base.scripts.external.contains(&src) {
            base.scripts.external.push(src);
        }
    }
    if base.title.is_none() {
        base.title = other.title;
    }
    base.escalation = EscalationInfo {
        attempted: true,
        reason: Some(reason),
        succeeded: true,
        failed: false,
        render_error: None,
    };

    DetectionOutcome {
        finding: base,
        document,
    }
}

fn describe(reason: &EscalationReason) -> String {
    match reason {
        EscalationReason::NetworkFailure { kind } => format!("network failure: {kind}"),
        EscalationReason::BlockingStatus { status } => format!("blocking status {status}"),
        EscalationReason::SuspiciouslyEmpty { script_count } => {
            format!("{script_count} scripts but no detections")
        }
        EscalationReason::ForcedHost { host } => format!("forced host {host}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::{ErrorKind, FetchError, RenderError, RetrievalError};
    use crate::models::{FetchTier, Methodology, Platform};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubEngine {
        tier: FetchTier,
        response: Result<RetrievedDocument, RetrievalError>,
        calls: AtomicUsize,
    }

    impl StubEngine {
        fn new(tier: FetchTier, response: Result<RetrievedDocument, RetrievalError>) -> Arc<Self> {
            Arc::new(Self {
                tier,
                response,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DetectionEngine for StubEngine {
        fn tier(&self) -> FetchTier {
            self.tier
        }

        async fn retrieve(&self, _url: &str) -> Result<RetrievedDocument, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn page(body: &str) -> Result<RetrievedDocument, RetrievalError> {
        Ok(RetrievedDocument {
            final_url: "https://example.test/".to_string(),
            status: 200,
            body: body.to_string(),
            title: None,
        })
    }

    fn blocked(status: u16) -> Result<RetrievedDocument, RetrievalError> {
        Err(RetrievalError::Fetch(FetchError::HttpStatus {
            status,
            url: "https://example.test/".to_string(),
        }))
    }

    const TEALIUM_PAGE: &str = r#"<html><head>
        <script async src="//tags.tiqcdn.com/utag/acme/main/prod/utag.js"></script>
        </head></html>"#;

    fn controller(
        light: &Arc<StubEngine>,
        render: &Arc<StubEngine>,
        policy: EscalationPolicy,
    ) -> EscalationController {
        let light: Arc<dyn DetectionEngine> = light.clone();
        let render: Arc<dyn DetectionEngine> = render.clone();
        EscalationController::new(light, Some(render), policy)
    }

    #[tokio::test]
    async fn test_blocking_status_triggers_render() {
        let light = StubEngine::new(FetchTier::Lightweight, blocked(403));
        let render = StubEngine::new(FetchTier::Rendered, page(TEALIUM_PAGE));
        let outcome = controller(&light, &render, EscalationPolicy::default())
            .detect("https://example.test/", &DetectionTarget::default())
            .await;

        assert_eq!(render.calls(), 1);
        let finding = outcome.finding;
        assert!(finding.success);
        assert_eq!(finding.fetch_tier, FetchTier::Rendered);
        assert!(finding.detection.has_platform(Platform::TealiumIq));
        assert!(finding.escalation.attempted && finding.escalation.succeeded);
        assert_eq!(
            finding.escalation.reason,
            Some(EscalationReason::BlockingStatus { status: 403 })
        );
        assert!(outcome.document.is_some());
    }

    #[tokio::test]
    async fn test_clean_result_is_not_escalated() {
        let light = StubEngine::new(FetchTier::Lightweight, page(TEALIUM_PAGE));
        let render = StubEngine::new(FetchTier::Rendered, page(TEALIUM_PAGE));
        let outcome = controller(&light, &render, EscalationPolicy::default())
            .detect("https://example.test/", &DetectionTarget::default())
            .await;

        assert_eq!(render.calls(), 0);
        assert_eq!(outcome.finding.fetch_tier, FetchTier::Lightweight);
        assert!(!outcome.finding.escalation.attempted);
        assert_eq!(outcome.finding.methodology(), Methodology::SingleManaged);
    }

    #[tokio::test]
    async fn test_suspiciously_empty_page_merges_script_lists() {
        let scripts: String = (0..6)
            .map(|i| format!(r#"<script src="/static/bundle-{i}.js"></script>"#))
            .collect();
        let light_body = format!("<html><head>{scripts}</head></html>");
        let light = StubEngine::new(FetchTier::Lightweight, page(&light_body));
        let render = StubEngine::new(FetchTier::Rendered, page(TEALIUM_PAGE));
        let outcome = controller(&light, &render, EscalationPolicy::default())
            .detect("https://example.test/", &DetectionTarget::default())
            .await;

        let finding = outcome.finding;
        assert_eq!(finding.fetch_tier, FetchTier::Rendered);
        assert_eq!(finding.scripts.external.len(), 7);
        assert!(finding.scripts.external[0].contains("utag.js"));
        assert!(matches!(
            finding.escalation.reason,
            Some(EscalationReason::SuspiciouslyEmpty { script_count: 6 })
        ));
    }

    #[tokio::test]
    async fn test_render_failure_returns_lightweight_result_flagged() {
        let light = StubEngine::new(FetchTier::Lightweight, blocked(503));
        let render = StubEngine::new(
            FetchTier::Rendered,
            Err(RetrievalError::Render(RenderError::Navigation(
                "net::ERR_ABORTED".into(),
            ))),
        );
        let outcome = controller(&light, &render, EscalationPolicy::default())
            .detect("https://example.test/", &DetectionTarget::default())
            .await;

        let finding = outcome.finding;
        assert_eq!(render.calls(), 1);
        assert!(!finding.success);
        assert_eq!(finding.fetch_tier, FetchTier::Lightweight);
        assert!(finding.escalation.failed);
        assert!(finding
            .escalation
            .render_error
            .as_deref()
            .is_some_and(|e| e.contains("ERR_ABORTED")));
        assert_eq!(
            finding.error.map(|e| e.kind),
            Some(ErrorKind::HttpBlocked)
        );
        assert!(outcome.document.is_none());
    }

    #[tokio::test]
    async fn test_not_found_is_not_escalated() {
        let light = StubEngine::new(FetchTier::Lightweight, blocked(404));
        let render = StubEngine::new(FetchTier::Rendered, page(TEALIUM_PAGE));
        let outcome = controller(&light, &render, EscalationPolicy::default())
            .detect("https://example.test/missing", &DetectionTarget::default())
            .await;

        assert_eq!(render.calls(), 0);
        assert_eq!(
            outcome.finding.error.map(|e| e.kind),
            Some(ErrorKind::HttpError)
        );
    }

    #[tokio::test]
    async fn test_rendered_result_with_fewer_matches_keeps_lightweight_detection() {
        let light = StubEngine::new(FetchTier::Lightweight, page(TEALIUM_PAGE));
        let render = StubEngine::new(
            FetchTier::Rendered,
            page(r#"<script src="https://cdn.example.test/app.js"></script>"#),
        );
        let policy = EscalationPolicy {
            force_render_hosts: vec!["example.test".into()],
            ..EscalationPolicy::default()
        };
        let outcome = controller(&light, &render, policy)
            .detect("https://example.test/", &DetectionTarget::default())
            .await;

        let finding = outcome.finding;
        assert_eq!(render.calls(), 1);
        assert_eq!(finding.fetch_tier, FetchTier::Lightweight);
        assert!(finding.detection.has_platform(Platform::TealiumIq));
        assert!(finding
            .scripts
            .external
            .iter()
            .any(|s| s == "https://cdn.example.test/app.js"));
        assert!(matches!(
            finding.escalation.reason,
            Some(EscalationReason::ForcedHost { .. })
        ));
    }

    #[tokio::test]
    async fn test_disabled_policy_never_renders() {
        let light = StubEngine::new(FetchTier::Lightweight, blocked(403));
        let render = StubEngine::new(FetchTier::Rendered, page(TEALIUM_PAGE));
        let policy = EscalationPolicy {
            enabled: false,
            ..EscalationPolicy::default()
        };
        let outcome = controller(&light, &render, policy)
            .detect("https://example.test/", &DetectionTarget::default())
            .await;
        assert_eq!(render.calls(), 0);
        assert!(!outcome.finding.success);
        assert!(!outcome.finding.escalation.attempted);
    }
}
