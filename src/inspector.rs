//! The four caller-facing operations.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use url::Url;

use crate::config::{Config, CrawlOptions, DetectionTarget};
use crate::crawl::crawl;
use crate::engine::{DetectionEngine, LightweightEngine, RenderEngine};
use crate::error_handling::InspectorError;
use crate::escalation::EscalationController;
use crate::estimate::estimate;
use crate::fetch::HttpFetcher;
use crate::models::{CrawlReport, PageFinding, SiteEstimate};
use crate::render::RenderClient;
use crate::utils::validate_and_normalize_url;

/// Entry point for URL checks, site crawls and site estimates.
///
/// Independent calls may run concurrently on a shared `Inspector`; each call
/// owns its own crawl state and browser sessions.
///
/// # Examples
///
/// ```no_run
/// use tag_inspector::{Config, DetectionTarget, Inspector};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let inspector = Inspector::new(Config::default())?;
/// let target = DetectionTarget {
///     account: Some("acme".to_string()),
///     ..Default::default()
/// };
/// let finding = inspector.check_url("https://www.example.com/", &target).await?;
/// println!("{:?} via {:?}", finding.methodology(), finding.fetch_tier);
/// # Ok(())
/// # }
/// ```
pub struct Inspector {
    config: Config,
    fetcher: Arc<HttpFetcher>,
    controller: EscalationController,
}

impl Inspector {
    /// Builds the HTTP client, the lightweight engine and, when rendering is
    /// enabled, the render engine.
    pub fn new(config: Config) -> Result<Self, InspectorError> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        let lightweight: Arc<dyn DetectionEngine> =
            Arc::new(LightweightEngine::new(Arc::clone(&fetcher)));
        let render_client = RenderClient::new(config.render.clone());
        let renderer: Option<Arc<dyn DetectionEngine>> = if render_client.is_enabled() {
            Some(Arc::new(RenderEngine::new(render_client)))
        } else {
            None
        };
        Ok(Self::with_engines(config, fetcher, lightweight, renderer))
    }

    /// Assembles an inspector from explicit parts.
    pub fn with_engines(
        config: Config,
        fetcher: Arc<HttpFetcher>,
        lightweight: Arc<dyn DetectionEngine>,
        renderer: Option<Arc<dyn DetectionEngine>>,
    ) -> Self {
        let controller =
            EscalationController::new(lightweight, renderer, config.escalation.clone());
        Self {
            config,
            fetcher,
            controller,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Detects the tag setup of a single page.
    ///
    /// Only an unusable URL is an error; retrieval failures are reported in
    /// the returned finding.
    pub async fn check_url(
        &self,
        url: &str,
        target: &DetectionTarget,
    ) -> Result<PageFinding, InspectorError> {
        let url = parse_url(url)?;
        let target = self.resolve_target(target);
        Ok(self.controller.detect(url.as_str(), &target).await.finding)
    }

    /// Checks each URL in order, pausing for the courtesy delay in between.
    ///
    /// Every URL is validated before the first request is sent.
    pub async fn check_urls(
        &self,
        urls: &[String],
        target: &DetectionTarget,
    ) -> Result<Vec<PageFinding>, InspectorError> {
        if urls.is_empty() {
            return Err(InspectorError::InvalidOptions(
                "at least one URL is required".to_string(),
            ));
        }
        let parsed = urls
            .iter()
            .map(|u| parse_url(u))
            .collect::<Result<Vec<_>, _>>()?;
        let target = self.resolve_target(target);

        let mut findings = Vec::with_capacity(parsed.len());
        for (i, url) in parsed.iter().enumerate() {
            if i > 0 {
                self.courtesy_pause().await;
            }
            findings.push(self.controller.detect(url.as_str(), &target).await.finding);
        }
        info!(
            "Checked {} URLs ({} succeeded)",
            findings.len(),
            findings.iter().filter(|f| f.success).count()
        );
        Ok(findings)
    }

    /// Crawls the site at `url` within the budgets of `options`.
    pub async fn crawl_site(
        &self,
        url: &str,
        options: &CrawlOptions,
    ) -> Result<CrawlReport, InspectorError> {
        if options.max_pages == 0 {
            return Err(InspectorError::InvalidOptions(
                "maxPages must be at least 1".to_string(),
            ));
        }
        let seed = parse_url(url)?;
        let options = CrawlOptions {
            target: self.resolve_target(&options.target),
            ..options.clone()
        };
        Ok(crawl(&self.controller, &seed, &options, self.courtesy_delay()).await)
    }

    /// Recommends crawl budgets for the site at `url`.
    pub async fn estimate_site(&self, url: &str) -> Result<SiteEstimate, InspectorError> {
        let base = parse_url(url)?;
        let renderer = self.controller.renderer().map(|r| r.as_ref());
        Ok(estimate(&self.fetcher, renderer, &base).await)
    }

    fn resolve_target(&self, target: &DetectionTarget) -> DetectionTarget {
        target.with_default_account(self.config.default_account.as_deref())
    }

    fn courtesy_delay(&self) -> Duration {
        Duration::from_millis(self.config.courtesy_delay_ms)
    }

    async fn courtesy_pause(&self) {
        let delay = self.courtesy_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn parse_url(url: &str) -> Result<Url, InspectorError> {
    validate_and_normalize_url(url)
        .and_then(|normalized| Url::parse(&normalized).ok())
        .ok_or_else(|| InspectorError::InvalidUrl(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_inspector() -> Inspector {
        let mut config = Config {
            courtesy_delay_ms: 0,
            ..Config::default()
        };
        config.render.enabled = false;
        Inspector::new(config).expect("builds")
    }

    #[tokio::test]
    async fn test_invalid_url_is_caller_error() {
        let inspector = offline_inspector();
        let err = inspector
            .check_url("ftp://example.test/file", &DetectionTarget::default())
            .await
            .expect_err("unsupported scheme");
        assert!(matches!(err, InspectorError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_overlong_multibyte_url_is_caller_error() {
        let inspector = offline_inspector();
        let url = format!("https://a.test/{}é{}", "a".repeat(34), "b".repeat(2100));
        let err = inspector
            .check_url(&url, &DetectionTarget::default())
            .await
            .expect_err("too long");
        assert!(matches!(err, InspectorError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_check_urls_validates_before_fetching() {
        let inspector = offline_inspector();
        let urls = vec!["https://example.test/".to_string(), "   ".to_string()];
        let err = inspector
            .check_urls(&urls, &DetectionTarget::default())
            .await
            .expect_err("second URL is empty");
        assert!(matches!(err, InspectorError::InvalidUrl(_)));

        let err = inspector
            .check_urls(&[], &DetectionTarget::default())
            .await
            .expect_err("empty list");
        assert!(matches!(err, InspectorError::InvalidOptions(_)));
    }

    #[tokio::test]
    async fn test_zero_page_budget_is_rejected() {
        let inspector = offline_inspector();
        let options = CrawlOptions {
            max_pages: 0,
            ..CrawlOptions::default()
        };
        let err = inspector
            .crawl_site("https://example.test/", &options)
            .await
            .expect_err("invalid budget");
        assert!(matches!(err, InspectorError::InvalidOptions(_)));
    }

    #[test]
    fn test_default_account_fills_target() {
        let mut config = Config {
            default_account: Some("fallback".to_string()),
            ..Config::default()
        };
        config.render.enabled = false;
        let inspector = Inspector::new(config).expect("builds");
        let resolved = inspector.resolve_target(&DetectionTarget::default());
        assert_eq!(resolved.account.as_deref(), Some("fallback"));
    }
}
