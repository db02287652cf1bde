//! Headless-browser client.
//!
//! Every render launches a fresh browser with a throwaway profile directory,
//! so no cookies or storage leak between pages. The session is always shut
//! down, on success, failure and timeout alike.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use log::{debug, warn};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use super::interaction;
use super::stealth::SessionFingerprint;
use crate::config::RenderSettings;
use crate::error_handling::RenderError;
use crate::utils::retry_with_policy;

/// Status of the main navigation, read from the Navigation Timing API.
/// Browsers that do not expose `responseStatus` report 200.
const NAVIGATION_STATUS_SCRIPT: &str = "(() => { \
    const entry = performance.getEntriesByType('navigation')[0]; \
    return (entry && entry.responseStatus) ? entry.responseStatus : 200; \
})()";

/// A document after scripts have run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub final_url: String,
    pub status: u16,
    /// Serialized live DOM
    pub document_text: String,
    pub title: Option<String>,
}

/// Drives a headless Chrome/Chromium to retrieve fully rendered documents.
#[derive(Debug, Clone)]
pub struct RenderClient {
    settings: RenderSettings,
}

impl RenderClient {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Navigates to `url` and returns the DOM after scripts executed.
    ///
    /// Each attempt is bounded by the render timeout. Launch failures are not
    /// retried: a missing browser binary will not appear between attempts.
    pub async fn render(&self, url: &str) -> Result<RenderedPage, RenderError> {
        if !self.settings.enabled {
            return Err(RenderError::Unavailable);
        }

        retry_with_policy(
            &self.settings.retry,
            move |attempt| self.render_once(url, attempt),
            |e: &RenderError| !matches!(e, RenderError::Launch(_) | RenderError::Unavailable),
        )
        .await
    }

    async fn render_once(&self, url: &str, attempt: usize) -> Result<RenderedPage, RenderError> {
        let fingerprint = SessionFingerprint::randomized();
        debug!(
            "Rendering {url} (attempt {}, viewport {}x{})",
            attempt + 1,
            fingerprint.viewport_width,
            fingerprint.viewport_height
        );

        let session = BrowserSession::launch(&self.settings, &fingerprint).await?;
        let limit = Duration::from_secs(self.settings.timeout_seconds);
        let outcome = tokio::time::timeout(limit, self.visit(&session, url, &fingerprint)).await;
        session.close().await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(format!(
                "{url} did not finish rendering within {}s",
                limit.as_secs()
            ))),
        }
    }

    async fn visit(
        &self,
        session: &BrowserSession,
        url: &str,
        fingerprint: &SessionFingerprint,
    ) -> Result<RenderedPage, RenderError> {
        let page = session
            .browser()?
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Navigation(format!("could not open a tab: {e}")))?;

        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
            fingerprint.init_script(),
        ))
        .await
        .map_err(|e| RenderError::Script(format!("stealth script rejected: {e}")))?;

        page.goto(url)
            .await
            .map_err(|e| RenderError::Navigation(format!("{url}: {e}")))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| RenderError::Navigation(format!("{url}: {e}")))?;

        if self.settings.simulate_interaction {
            let steps = interaction::plan(fingerprint.viewport_width, fingerprint.viewport_height);
            interaction::simulate(&page, &steps).await;
        }
        tokio::time::sleep(Duration::from_millis(self.settings.settle_ms)).await;

        read_page(&page, url).await
    }
}

async fn read_page(page: &Page, requested_url: &str) -> Result<RenderedPage, RenderError> {
    let status = match page.evaluate(NAVIGATION_STATUS_SCRIPT).await {
        Ok(result) => result.into_value::<u16>().unwrap_or(200),
        Err(e) => {
            debug!("Navigation status unavailable for {requested_url}: {e}");
            200
        }
    };
    let document_text = page
        .content()
        .await
        .map_err(|e| RenderError::Script(format!("could not serialize DOM: {e}")))?;
    let title = page.get_title().await.ok().flatten();
    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| requested_url.to_string());

    Ok(RenderedPage {
        final_url,
        status,
        document_text,
        title,
    })
}

/// One launched browser plus its event-loop task and profile directory.
///
/// `close` is the normal shutdown path. Dropping an open session spawns the
/// same shutdown on the current runtime.
struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    profile_dir: Option<TempDir>,
}

impl BrowserSession {
    async fn launch(
        settings: &RenderSettings,
        fingerprint: &SessionFingerprint,
    ) -> Result<Self, RenderError> {
        let profile_dir = tempfile::Builder::new()
            .prefix("tag-inspector-profile-")
            .tempdir()
            .map_err(|e| RenderError::Launch(format!("could not create profile dir: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .user_data_dir(profile_dir.path());
        for arg in fingerprint.launch_args() {
            builder = builder.arg(arg);
        }
        if let Some(executable) = &settings.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::trace!("Browser event loop: {e}");
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            profile_dir: Some(profile_dir),
        })
    }

    fn browser(&self) -> Result<&Browser, RenderError> {
        self.browser
            .as_ref()
            .ok_or_else(|| RenderError::Launch("browser session already closed".to_string()))
    }

    async fn close(mut self) {
        if let Some(browser) = self.browser.take() {
            shutdown(browser, self.handler.take(), self.profile_dir.take()).await;
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let Some(browser) = self.browser.take() else {
            return;
        };
        let handler = self.handler.take();
        let profile_dir = self.profile_dir.take();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(shutdown(browser, handler, profile_dir));
            }
            Err(_) => {
                // chromiumoxide kills the child process when the Browser drops
                warn!("Browser session dropped outside a runtime");
            }
        }
    }
}

async fn shutdown(mut browser: Browser, handler: Option<JoinHandle<()>>, profile_dir: Option<TempDir>) {
    if let Err(e) = browser.close().await {
        debug!("Browser close failed: {e}");
    }
    if let Err(e) = browser.wait().await {
        debug!("Waiting for browser exit failed: {e}");
    }
    if let Some(handler) = handler {
        handler.abort();
    }
    drop(profile_dir);
}
