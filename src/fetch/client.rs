//! Lightweight fetch tier: one HTTP GET with bounded retries.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use log::debug;

use super::request::{ClientIdentity, RequestHeaders};
use crate::config::{Config, RetryPolicy, DETECTION_TIMEOUT, MAX_RESPONSE_BODY_SIZE};
use crate::error_handling::{categorize_reqwest_error, FetchError, InitializationError};
use crate::initialization::init_client;
use crate::utils::retry_with_policy;

/// A successful lightweight fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    /// Body as text, truncated to `MAX_RESPONSE_BODY_SIZE`
    pub body: String,
}

/// Plain HTTP fetcher with browser-mimicking headers.
///
/// Cheap and fast, but cannot execute page scripts. Retries transient failures
/// with exponential backoff, rotating the simulated client identity on each
/// attempt.
pub struct HttpFetcher {
    client: Arc<reqwest::Client>,
    retry: RetryPolicy,
    overall_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, InitializationError> {
        let client = init_client(config)?;
        Ok(Self::with_client(client, config.retry.clone()))
    }

    pub fn with_client(client: Arc<reqwest::Client>, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            overall_timeout: DETECTION_TIMEOUT,
        }
    }

    /// Fetches `url`, returning the final URL, status and body.
    ///
    /// Non-success statuses are returned as `FetchError::HttpStatus`. The whole
    /// call, retries included, is bounded by `DETECTION_TIMEOUT`.
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let attempts = retry_with_policy(
            &self.retry,
            move |attempt| self.fetch_once(url, attempt),
            FetchError::is_retriable,
        );

        match tokio::time::timeout(self.overall_timeout, attempts).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(format!(
                "{url} did not complete within {}s including retries",
                self.overall_timeout.as_secs()
            ))),
        }
    }

    async fn fetch_once(&self, url: &str, attempt: usize) -> Result<FetchResponse, FetchError> {
        let identity = ClientIdentity::for_attempt(attempt);
        debug!("Fetching {url} (attempt {}, identity {})", attempt + 1, identity.name);

        let request = RequestHeaders::apply_to_request_builder(self.client.get(url), identity);
        let response = request
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            debug!("{url} answered {status} to {}", identity.name);
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let body = read_body_with_limit(response, MAX_RESPONSE_BODY_SIZE).await?;
        Ok(FetchResponse {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Streams the body, keeping at most `max_size` bytes.
///
/// Oversized documents are truncated rather than rejected: tag snippets live
/// in the head, so the first few megabytes are what matters.
async fn read_body_with_limit(
    response: reqwest::Response,
    max_size: usize,
) -> Result<String, FetchError> {
    let mut stream = response.bytes_stream();
    let mut buf: Vec<u8> = Vec::with_capacity(64 * 1024);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| categorize_reqwest_error(&e))?;
        let remaining = max_size.saturating_sub(buf.len());
        if chunk.len() >= remaining {
            buf.extend_from_slice(&chunk[..remaining]);
            debug!("Response body truncated at {} bytes", max_size);
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn fast_fetcher() -> HttpFetcher {
        let config = Config {
            retry: RetryPolicy {
                max_attempts: 3,
                initial_delay_ms: 1,
                backoff_base: 2,
                max_delay_ms: 10,
            },
            ..Config::default()
        };
        HttpFetcher::new(&config).expect("client builds")
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/"))
                .respond_with(status_code(200).body("<html><title>Hi</title></html>")),
        );

        let response = fast_fetcher()
            .fetch(&server.url_str("/"))
            .await
            .expect("fetch succeeds");
        assert_eq!(response.status, 200);
        assert!(response.body.contains("<title>Hi</title>"));
        assert_eq!(response.final_url, server.url_str("/"));
    }

    #[tokio::test]
    async fn test_fetch_does_not_retry_not_found() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/missing"))
                .times(1)
                .respond_with(status_code(404)),
        );

        let error = fast_fetcher()
            .fetch(&server.url_str("/missing"))
            .await
            .expect_err("404 is an error");
        assert_eq!(error.status(), Some(404));
    }

    #[tokio::test]
    async fn test_fetch_retries_blocking_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/"))
                .times(3)
                .respond_with(httptest::cycle![
                    status_code(403),
                    status_code(403),
                    status_code(200).body("ok")
                ]),
        );

        let response = fast_fetcher()
            .fetch(&server.url_str("/"))
            .await
            .expect("third identity gets through");
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_attempts() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/"))
                .times(3)
                .respond_with(status_code(503)),
        );

        let error = fast_fetcher()
            .fetch(&server.url_str("/"))
            .await
            .expect_err("always unavailable");
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.kind(), crate::error_handling::ErrorKind::HttpBlocked);
    }

    #[tokio::test]
    async fn test_fetch_truncates_large_body() {
        let server = Server::run();
        let big = "a".repeat(MAX_RESPONSE_BODY_SIZE + 1024);
        server.expect(
            Expectation::matching(request::method_path("GET", "/big"))
                .respond_with(status_code(200).body(big)),
        );

        let response = fast_fetcher()
            .fetch(&server.url_str("/big"))
            .await
            .expect("fetch succeeds");
        assert_eq!(response.body.len(), MAX_RESPONSE_BODY_SIZE);
    }
}
