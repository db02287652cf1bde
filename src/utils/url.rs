//! URL validation, normalization and same-site checks.

use log::warn;
use url::Url;

/// Maximum URL length (2048 characters) to prevent DoS attacks via extremely long URLs.
/// This matches common browser and server limits (e.g., IE, Apache, Nginx default limits).
const MAX_URL_LENGTH: usize = 2048;

/// Validates and normalizes a URL.
///
/// Adds an `https://` prefix if missing, then validates that the URL is
/// syntactically valid, has a host and uses the http/https scheme. Rejects URLs
/// longer than `MAX_URL_LENGTH`. Logs a warning and returns `None` if the URL is
/// unusable.
pub fn validate_and_normalize_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        warn!("Skipping empty URL");
        return None;
    }

    let normalized = if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.contains("://") {
            warn!("Skipping unsupported scheme for URL: {url}");
            return None;
        }
        format!("https://{url}")
    } else {
        url.to_string()
    };

    if normalized.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping URL exceeding maximum length ({} > {}): {}...",
            normalized.len(),
            MAX_URL_LENGTH,
            preview(&normalized)
        );
        return None;
    }

    match Url::parse(&normalized) {
        Ok(parsed) if parsed.host_str().is_some_and(|h| !h.is_empty()) => {
            match parsed.scheme() {
                "http" | "https" => Some(normalized),
                _ => {
                    warn!("Skipping unsupported scheme for URL: {url}");
                    None
                }
            }
        }
        _ => {
            warn!("Skipping invalid URL: {url}");
            None
        }
    }
}

/// The first 50 characters of `url`, cut on a character boundary.
fn preview(url: &str) -> String {
    url.chars().take(50).collect()
}

/// Host and port identifying a site, with a leading `www.` ignored.
///
/// `https://www.example.test/` and `https://example.test:443/a` share a key.
pub fn host_key(url: &Url) -> Option<(String, u16)> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);
    Some((host, url.port_or_known_default()?))
}

/// Whether two URLs belong to the same site for crawling purposes.
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (host_key(a), host_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
