//! Error categorization and retry strategy.
//!
//! This module maps transport errors onto `FetchError` and builds the
//! backoff schedule used by the fetch and render clients.

use std::error::Error as StdError;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::FetchError;
use crate::config::RetryPolicy;

/// Creates an exponential backoff retry strategy from a policy.
///
/// The n-th retry waits `initial_delay_ms * backoff_base^n`, capped at
/// `max_delay_ms`. The iterator yields one delay per *retry*, so a policy of
/// `max_attempts = 3` yields two delays (initial attempt + two retries).
pub fn get_retry_strategy(policy: &RetryPolicy) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(policy.backoff_base.max(1))
        .factor(policy.initial_delay_ms)
        .max_delay(Duration::from_millis(policy.max_delay_ms))
        .take(policy.max_attempts.saturating_sub(1))
}

/// Categorizes a `reqwest::Error` into a `FetchError`.
///
/// Connection failures are split by inspecting the error source chain, since
/// reqwest reports DNS failures, refusals and resets all as `is_connect()`.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> FetchError {
    let detail = error_chain_message(error);

    if let Some(status) = error.status() {
        return FetchError::HttpStatus {
            status: status.as_u16(),
            url: error.url().map(|u| u.to_string()).unwrap_or_default(),
        };
    }

    if error.is_timeout() {
        return FetchError::Timeout(detail);
    }

    let lowered = detail.to_lowercase();
    if error.is_connect() {
        if lowered.contains("dns")
            || lowered.contains("failed to lookup")
            || lowered.contains("name or service not known")
        {
            FetchError::Dns(detail)
        } else if lowered.contains("refused") {
            FetchError::Refused(detail)
        } else if lowered.contains("reset") {
            FetchError::Reset(detail)
        } else {
            FetchError::Connect(detail)
        }
    } else if lowered.contains("connection reset") {
        FetchError::Reset(detail)
    } else if error.is_body() || error.is_decode() {
        FetchError::Body(detail)
    } else if error.is_request() {
        FetchError::Connect(detail)
    } else {
        FetchError::Other(detail)
    }
}

/// Flattens an error and its sources into one message.
fn error_chain_message(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_retry_strategy_initial_delay() {
        let policy = RetryPolicy::default();
        let first_delay = get_retry_strategy(&policy)
            .next()
            .expect("default policy retries at least once");

        let expected_ms = policy.initial_delay_ms as u128;
        assert!(
            first_delay.as_millis() >= expected_ms,
            "Expected delay >= {}ms, got {}ms",
            expected_ms,
            first_delay.as_millis()
        );
    }

    #[test]
    fn test_get_retry_strategy_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 8,
            ..RetryPolicy::default()
        };
        let delays: Vec<Duration> = get_retry_strategy(&policy).collect();
        for pair in delays.windows(2) {
            assert!(pair[1] >= pair[0], "Delay should not shrink: {:?}", pair);
        }
        for delay in &delays {
            assert!(delay.as_millis() <= policy.max_delay_ms as u128);
        }
    }

    #[test]
    fn test_get_retry_strategy_counts_retries_not_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(get_retry_strategy(&policy).count(), policy.max_attempts - 1);

        let single = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        assert_eq!(get_retry_strategy(&single).count(), 0);
    }

    #[tokio::test]
    async fn test_categorize_refused_connection() {
        // Port 9 on localhost is almost never listening
        let client = reqwest::Client::new();
        let error = client
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .expect_err("nothing listens on the discard port");
        let categorized = categorize_reqwest_error(&error);
        assert_eq!(
            categorized.kind(),
            crate::error_handling::ErrorKind::NetworkUnreachable,
            "{categorized:?}"
        );
    }
}
