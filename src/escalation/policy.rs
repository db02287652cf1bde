//! Escalation triggers.

use url::Url;

use crate::config::EscalationPolicy;
use crate::error_handling::{FetchError, RetrievalError};
use crate::models::{EscalationReason, PageFinding};

/// Forced hosts are checked before anything is fetched.
pub(crate) fn forced_host(policy: &EscalationPolicy, url: &str) -> Option<EscalationReason> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    policy
        .force_render_hosts
        .iter()
        .map(|h| h.trim().trim_start_matches("www.").to_ascii_lowercase())
        .find(|h| !h.is_empty() && (host == *h || host.ends_with(&format!(".{h}"))))
        .map(|_| EscalationReason::ForcedHost { host })
}

/// Whether a failed lightweight retrieval warrants rendering.
///
/// Only failures a browser can plausibly get past qualify: DNS failures,
/// resets and timeouts (often bot-mitigation tarpits), and blocking statuses.
pub(crate) fn on_failure(
    policy: &EscalationPolicy,
    error: &RetrievalError,
) -> Option<EscalationReason> {
    let RetrievalError::Fetch(fetch_error) = error else {
        return None;
    };
    match fetch_error {
        FetchError::Dns(_) | FetchError::Reset(_) | FetchError::Timeout(_) => {
            Some(EscalationReason::NetworkFailure {
                kind: fetch_error.kind(),
            })
        }
        FetchError::HttpStatus { status, .. } if policy.blocking_statuses.contains(status) => {
            Some(EscalationReason::BlockingStatus { status: *status })
        }
        _ => None,
    }
}

/// "Suspiciously empty": plenty of scripts, nothing recognised. The content
/// is probably injected after load or gated behind a bot check.
pub(crate) fn on_success(policy: &EscalationPolicy, finding: &PageFinding) -> Option<EscalationReason> {
    let script_count = finding.scripts.external.len();
    if script_count > policy.script_count_threshold && finding.detection.match_count == 0 {
        Some(EscalationReason::SuspiciouslyEmpty { script_count })
    } else {
        None
    }
}
