// Lightweight-to-render escalation through the public API.

mod helpers;

use httptest::{matchers::*, responders::*, Expectation, Server};

use helpers::{inspector_with_renderer, CannedRenderer};
use tag_inspector::models::EscalationReason;
use tag_inspector::{DetectionTarget, FetchTier, Platform};

const RENDERED_GTM: &str = r#"<html><head>
    <script async src="https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD3"></script>
    </head><body></body></html>"#;

#[tokio::test]
async fn test_blocked_page_is_rendered() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .times(2)
            .respond_with(status_code(403)),
    );
    let renderer = CannedRenderer::new(RENDERED_GTM);
    let inspector = inspector_with_renderer(renderer.clone());

    let finding = inspector
        .check_url(&server.url_str("/"), &DetectionTarget::default())
        .await
        .expect("valid URL");

    assert_eq!(renderer.calls(), 1);
    assert!(finding.success);
    assert_eq!(finding.fetch_tier, FetchTier::Rendered);
    assert!(finding.detection.has_platform(Platform::GoogleTagManager));
    assert_eq!(finding.title.as_deref(), Some("Rendered"));
    assert!(finding.escalation.attempted);
    assert!(finding.escalation.succeeded);
    assert_eq!(
        finding.escalation.reason,
        Some(EscalationReason::BlockingStatus { status: 403 })
    );
}

#[tokio::test]
async fn test_suspiciously_empty_page_is_rendered() {
    let server = Server::run();
    let scripts: String = (0..8)
        .map(|i| format!(r#"<script src="/static/bundle-{i}.js"></script>"#))
        .collect();
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .respond_with(
                status_code(200).body(format!("<html><head>{scripts}</head><body></body></html>")),
            ),
    );
    let renderer = CannedRenderer::new(RENDERED_GTM);
    let inspector = inspector_with_renderer(renderer.clone());

    let finding = inspector
        .check_url(&server.url_str("/"), &DetectionTarget::default())
        .await
        .expect("valid URL");

    assert_eq!(renderer.calls(), 1);
    assert!(matches!(
        finding.escalation.reason,
        Some(EscalationReason::SuspiciouslyEmpty { .. })
    ));
    assert!(finding.detection.has_platform(Platform::GoogleTagManager));
    // Scripts seen by either tier are kept
    assert!(finding.scripts.external.len() >= 8);
}

#[tokio::test]
async fn test_tagged_page_is_not_rendered() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .respond_with(status_code(200).body(RENDERED_GTM)),
    );
    let renderer = CannedRenderer::new(RENDERED_GTM);
    let inspector = inspector_with_renderer(renderer.clone());

    let finding = inspector
        .check_url(&server.url_str("/"), &DetectionTarget::default())
        .await
        .expect("valid URL");

    assert_eq!(renderer.calls(), 0);
    assert_eq!(finding.fetch_tier, FetchTier::Lightweight);
    assert!(!finding.escalation.attempted);
}
