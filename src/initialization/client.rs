//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, MAX_REDIRECT_HOPS, TCP_CONNECT_TIMEOUT_SECS};

/// Initializes the HTTP client used by the lightweight fetch tier.
///
/// Creates a `reqwest::Client` configured with:
/// - Request timeout from the configuration
/// - TCP connect timeout
/// - Redirect following (up to `MAX_REDIRECT_HOPS` hops)
/// - Cookie-less, compression-aware defaults
///
/// No User-Agent is set on the client: the fetcher applies a full browser
/// header set per request so the identity can change between retries.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS))
        .build()?;
    Ok(Arc::new(client))
}
