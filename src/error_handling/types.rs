//! Error type definitions.
//!
//! This module defines the error enums of every fallible layer and the
//! serialisable `ErrorKind` classification carried on results.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Classified failure of the lightweight fetch tier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Host name could not be resolved.
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// The server actively refused the connection.
    #[error("Connection refused: {0}")]
    Refused(String),

    /// The connection was reset by the peer mid-request.
    #[error("Connection reset: {0}")]
    Reset(String),

    /// Any other connection-establishment failure (TLS, routing, ...).
    #[error("Connection failed: {0}")]
    Connect(String),

    /// No response within the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body could not be read or decoded.
    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Request failed: {0}")]
    Other(String),
}

impl FetchError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt might succeed.
    ///
    /// Definitive client errors (4xx) are never retried, except 403 which is
    /// usually a fingerprint-based block that a different client identity can
    /// get past. Server errors (including 503 rate limiting) and network-level
    /// failures are retried.
    pub fn is_retriable(&self) -> bool {
        match self {
            FetchError::HttpStatus { status, .. } => {
                *status == crate::config::HTTP_STATUS_FORBIDDEN || (500..600).contains(status)
            }
            FetchError::Dns(_)
            | FetchError::Refused(_)
            | FetchError::Reset(_)
            | FetchError::Connect(_)
            | FetchError::Timeout(_)
            | FetchError::Body(_) => true,
            FetchError::Other(_) => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Dns(_)
            | FetchError::Refused(_)
            | FetchError::Reset(_)
            | FetchError::Connect(_)
            | FetchError::Other(_) => ErrorKind::NetworkUnreachable,
            FetchError::Timeout(_) => ErrorKind::Timeout,
            FetchError::HttpStatus { status, .. } => {
                if *status == crate::config::HTTP_STATUS_FORBIDDEN
                    || *status == crate::config::HTTP_STATUS_SERVICE_UNAVAILABLE
                {
                    ErrorKind::HttpBlocked
                } else {
                    ErrorKind::HttpError
                }
            }
            FetchError::Body(_) => ErrorKind::HttpError,
        }
    }
}

/// Failure of the render (headless browser) tier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No browser binary, or it failed to start.
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Render timed out: {0}")]
    Timeout(String),

    /// Reading the DOM or running page scripts failed.
    #[error("Page script evaluation failed: {0}")]
    Script(String),

    /// Rendering is disabled by configuration.
    #[error("Rendering is not available")]
    Unavailable,
}

/// What a detection engine returns when it cannot produce a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl RetrievalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RetrievalError::Fetch(e) => e.kind(),
            RetrievalError::Render(_) => ErrorKind::RenderFailed,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RetrievalError::Fetch(e) => e.status(),
            RetrievalError::Render(_) => None,
        }
    }
}

/// Caller-facing errors. Only configuration problems surface this way; page
/// level failures are reported inside the returned results.
#[derive(Error, Debug)]
pub enum InspectorError {
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error(transparent)]
    Initialization(#[from] InitializationError),
}

/// Classification of a failure (or notable condition) carried on results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIterMacro, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// DNS failure or refused/failed connection
    NetworkUnreachable,
    Timeout,
    /// Non-success HTTP status
    HttpError,
    /// 403 or 503: typically bot-blocking or rate limiting
    HttpBlocked,
    /// Scripts were recovered only through the raw-text fallback
    ParseDegraded,
    RenderFailed,
    /// Crawl stopped on its page/depth budget
    BudgetExhausted,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NetworkUnreachable => "Network unreachable",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::HttpError => "HTTP error",
            ErrorKind::HttpBlocked => "Blocked (HTTP 403/503)",
            ErrorKind::ParseDegraded => "Parse degraded",
            ErrorKind::RenderFailed => "Render failed",
            ErrorKind::BudgetExhausted => "Budget exhausted",
        }
    }

    /// Verbose, human-oriented explanation of what usually causes this
    /// condition and what to try next.
    pub fn troubleshooting(&self) -> &'static str {
        match self {
            ErrorKind::NetworkUnreachable => {
                "The host could not be reached. Check the spelling of the domain, \
                 confirm it resolves in DNS (e.g. `dig <host>`), and that the site is \
                 reachable from this network without a VPN or proxy."
            }
            ErrorKind::Timeout => {
                "The server did not answer in time. The site may be slow, overloaded or \
                 silently dropping automated traffic. Retry later or raise the timeout."
            }
            ErrorKind::HttpError => {
                "The server answered with an error status. Verify the URL is correct and \
                 publicly accessible (not behind a login or geo restriction)."
            }
            ErrorKind::HttpBlocked => {
                "The server refused the request (403) or reported itself unavailable (503). \
                 This is usually bot protection or rate limiting. The rendered tier is tried \
                 automatically; if it also fails, allowlist the scanner or scan from a \
                 trusted network."
            }
            ErrorKind::ParseDegraded => {
                "The page's markup is malformed; scripts were recovered from the raw text. \
                 Results are best-effort and loading attributes may be missing."
            }
            ErrorKind::RenderFailed => {
                "The headless browser could not load the page. Make sure Chrome or Chromium \
                 is installed and can start in this environment, and that the page does not \
                 require interaction beyond scrolling (e.g. a CAPTCHA)."
            }
            ErrorKind::BudgetExhausted => {
                "The crawl stopped because its page or depth budget was reached. Increase \
                 maxPages/maxDepth, or use the site estimate to pick a budget."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_all_error_kinds_have_string_representation() {
        for kind in ErrorKind::iter() {
            assert!(!kind.as_str().is_empty(), "{:?} should have a summary", kind);
            assert!(
                !kind.troubleshooting().is_empty(),
                "{:?} should have a troubleshooting message",
                kind
            );
        }
    }

    #[test]
    fn test_fetch_error_kind_blocking_subclass() {
        let forbidden = FetchError::HttpStatus {
            status: 403,
            url: "https://example.test/".to_string(),
        };
        let unavailable = FetchError::HttpStatus {
            status: 503,
            url: "https://example.test/".to_string(),
        };
        let not_found = FetchError::HttpStatus {
            status: 404,
            url: "https://example.test/".to_string(),
        };
        assert_eq!(forbidden.kind(), ErrorKind::HttpBlocked);
        assert_eq!(unavailable.kind(), ErrorKind::HttpBlocked);
        assert_eq!(not_found.kind(), ErrorKind::HttpError);
        assert_eq!(not_found.status(), Some(404));
    }

    #[test]
    fn test_fetch_error_retriability() {
        let status = |status| FetchError::HttpStatus {
            status,
            url: String::new(),
        };
        assert!(status(403).is_retriable());
        assert!(status(503).is_retriable());
        assert!(status(500).is_retriable());
        assert!(!status(404).is_retriable());
        assert!(!status(401).is_retriable());
        assert!(!status(429).is_retriable());
        assert!(FetchError::Timeout("slow".into()).is_retriable());
        assert!(FetchError::Dns("nx".into()).is_retriable());
        assert!(!FetchError::Other("builder".into()).is_retriable());
    }

    #[test]
    fn test_network_kinds() {
        assert_eq!(
            FetchError::Dns("nx".into()).kind(),
            ErrorKind::NetworkUnreachable
        );
        assert_eq!(
            FetchError::Refused("closed".into()).kind(),
            ErrorKind::NetworkUnreachable
        );
        assert_eq!(FetchError::Timeout("slow".into()).kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_retrieval_error_kind() {
        let render: RetrievalError = RenderError::Navigation("net::ERR_ABORTED".into()).into();
        assert_eq!(render.kind(), ErrorKind::RenderFailed);
        assert_eq!(render.status(), None);

        let fetch: RetrievalError = FetchError::HttpStatus {
            status: 503,
            url: String::new(),
        }
        .into();
        assert_eq!(fetch.kind(), ErrorKind::HttpBlocked);
        assert_eq!(fetch.status(), Some(503));
    }

    #[test]
    fn test_error_kind_serialises_kebab_case() {
        let json = serde_json::to_string(&ErrorKind::NetworkUnreachable).expect("serialises");
        assert_eq!(json, "\"network-unreachable\"");
    }
}
