//! Matching findings against a detection target.

use crate::config::DetectionTarget;
use crate::models::TagManagerFinding;

/// Exact equality on every field the target supplies.
///
/// Returns `None` when the target constrains nothing. A field the finding
/// does not carry (e.g. GTM has no account) counts as a mismatch when the
/// target asks for it.
pub(crate) fn match_tag_manager(
    finding: &TagManagerFinding,
    target: &DetectionTarget,
) -> Option<bool> {
    if target.is_unconstrained() {
        return None;
    }

    let account_ok = field_matches(target.account.as_deref(), finding.account.as_deref());
    let profile_ok = field_matches(target.profile.as_deref(), finding.profile.as_deref());
    let environment_ok = field_matches(
        target.environment.as_ref().map(|e| e.as_str()),
        finding.environment.as_deref(),
    );
    let container_ok = match target.container_id.as_deref() {
        None => true,
        Some(expected) => finding.container_ids.iter().any(|id| id == expected),
    };

    Some(account_ok && profile_ok && environment_ok && container_ok)
}

fn field_matches(expected: Option<&str>, found: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => found == Some(expected),
    }
}

/// Human-readable "expected X, found Y" for the mismatching fields.
pub(crate) fn describe_mismatch(finding: &TagManagerFinding, target: &DetectionTarget) -> String {
    let mut parts = Vec::new();
    let mut check = |label: &str, expected: Option<&str>, found: Option<&str>| {
        if let Some(expected) = expected {
            if found != Some(expected) {
                parts.push(format!(
                    "{label} expected '{expected}' but found '{}'",
                    found.unwrap_or("none")
                ));
            }
        }
    };
    check("account", target.account.as_deref(), finding.account.as_deref());
    check("profile", target.profile.as_deref(), finding.profile.as_deref());
    check(
        "environment",
        target.environment.as_ref().map(|e| e.as_str()),
        finding.environment.as_deref(),
    );
    if let Some(expected) = target.container_id.as_deref() {
        if !finding.container_ids.iter().any(|id| id == expected) {
            parts.push(format!(
                "container expected '{expected}' but found '{}'",
                finding.container_ids.join(", ")
            ));
        }
    }
    parts.join("; ")
}
