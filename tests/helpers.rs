// Shared test helpers: offline configuration and mock-server wiring.

use httptest::{matchers::*, responders::*, Expectation, Server};

use tag_inspector::{Config, Inspector, RetryPolicy};

/// Configuration for tests: no browser, no courtesy delay, fast retries.
#[allow(dead_code)] // Used by other test files
pub fn test_config() -> Config {
    let mut config = Config {
        courtesy_delay_ms: 0,
        default_account: None,
        retry: RetryPolicy {
            max_attempts: 2,
            initial_delay_ms: 1,
            backoff_base: 2,
            max_delay_ms: 5,
        },
        ..Config::default()
    };
    config.render.enabled = false;
    config
}

#[allow(dead_code)]
pub fn test_inspector() -> Inspector {
    Inspector::new(test_config()).expect("inspector builds")
}

/// Answers 404 to any number of GETs on each of `paths`.
#[allow(dead_code)]
pub fn not_found_on(server: &Server, paths: &[&str]) {
    for path in paths {
        server.expect(
            Expectation::matching(request::method_path("GET", path.to_string()))
                .times(..)
                .respond_with(status_code(404)),
        );
    }
}

/// An HTML page whose body links to each of `paths`.
#[allow(dead_code)]
pub fn page_with_links(title: &str, paths: &[String]) -> String {
    let links: String = paths
        .iter()
        .map(|p| format!(r#"<a href="{p}">{p}</a>"#))
        .collect();
    format!("<html><head><title>{title}</title></head><body>{links}</body></html>")
}

/// Render tier stand-in that serves one canned document and counts calls.
#[allow(dead_code)]
pub struct CannedRenderer {
    pub body: String,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[allow(dead_code)]
impl CannedRenderer {
    pub fn new(body: &str) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            body: body.to_string(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl tag_inspector::DetectionEngine for CannedRenderer {
    fn tier(&self) -> tag_inspector::FetchTier {
        tag_inspector::FetchTier::Rendered
    }

    async fn retrieve(
        &self,
        url: &str,
    ) -> Result<tag_inspector::RetrievedDocument, tag_inspector::RetrievalError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(tag_inspector::RetrievedDocument {
            final_url: url.to_string(),
            status: 200,
            body: self.body.clone(),
            title: Some("Rendered".to_string()),
        })
    }
}

/// An inspector whose render tier is `renderer`.
#[allow(dead_code)]
pub fn inspector_with_renderer(renderer: std::sync::Arc<CannedRenderer>) -> Inspector {
    use std::sync::Arc;
    use tag_inspector::fetch::HttpFetcher;
    use tag_inspector::{DetectionEngine, LightweightEngine};

    let config = test_config();
    let fetcher = Arc::new(HttpFetcher::new(&config).expect("client builds"));
    let lightweight: Arc<dyn DetectionEngine> =
        Arc::new(LightweightEngine::new(Arc::clone(&fetcher)));
    let renderer: Arc<dyn DetectionEngine> = renderer;
    Inspector::with_engines(config, fetcher, lightweight, Some(renderer))
}
