//! Page-priority heuristic for the missing-page report.

use url::Url;

use crate::config::{HIGH_PRIORITY_PATH_KEYWORDS, MEDIUM_PRIORITY_PATH_KEYWORDS};
use crate::models::PagePriority;

/// Home, contact and conversion pages first, content and support pages
/// second, everything else last.
pub(crate) fn page_priority(url: &Url) -> PagePriority {
    let path = url.path().to_ascii_lowercase();
    if path.is_empty() || path == "/" {
        return PagePriority::High;
    }

    let tokens: Vec<&str> = path
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let has_keyword = |keywords: &[&str]| {
        tokens
            .iter()
            .any(|token| keywords.iter().any(|kw| token.starts_with(kw)))
    };

    if has_keyword(HIGH_PRIORITY_PATH_KEYWORDS) {
        PagePriority::High
    } else if has_keyword(MEDIUM_PRIORITY_PATH_KEYWORDS) {
        PagePriority::Medium
    } else {
        PagePriority::Low
    }
}
