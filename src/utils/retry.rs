//! Typed retry/backoff helper.

use std::future::Future;

use tokio_retry::RetryIf;

use crate::config::RetryPolicy;
use crate::error_handling::get_retry_strategy;

/// Runs `operation` until it succeeds, `should_retry` rejects the error, or the
/// policy's attempt budget is spent.
///
/// The operation receives the zero-based attempt number so callers can vary
/// their behavior per attempt (the fetch client rotates its client identity
/// this way). The last error is returned when every attempt fails.
pub async fn retry_with_policy<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut operation: F,
    mut should_retry: P,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0usize;
    RetryIf::spawn(
        get_retry_strategy(policy),
        || {
            let current = attempt;
            attempt += 1;
            operation(current)
        },
        |error: &E| {
            let retry = should_retry(error);
            if retry {
                log::debug!("Attempt failed, retrying: {error}");
            }
            retry
        },
    )
    .await
}
