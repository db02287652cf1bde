//! Configuration constants.
//!
//! This module defines every tunable default used throughout the crate,
//! including timeouts, retry schedule, escalation heuristics and crawl limits.
//! The runtime `Config` copies these values and may override them.

use std::time::Duration;

/// Environment variable holding the process-wide default target account.
pub const DEFAULT_ACCOUNT_ENV_VAR: &str = "TAG_INSPECTOR_DEFAULT_ACCOUNT";

// Network operation timeouts
/// Lightweight (plain HTTP) fetch timeout in seconds
pub const FETCH_TIMEOUT_SECS: u64 = 15;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Render (headless browser) navigation timeout in seconds
/// Rendering is 30-100x slower than a plain fetch, so this is much larger.
pub const RENDER_TIMEOUT_SECS: u64 = 45;
/// Idle time after navigation before the DOM is read, in milliseconds
pub const RENDER_SETTLE_MS: u64 = 2_000;

/// Maximum number of redirect hops to follow
pub const MAX_REDIRECT_HOPS: usize = 10;

// Response and body size limits
/// Maximum response body size in bytes (5MB)
/// Larger bodies are truncated before analysis to prevent memory exhaustion
pub const MAX_RESPONSE_BODY_SIZE: usize = 5 * 1024 * 1024;
/// Maximum inline script content kept per script (100KB)
pub const MAX_SCRIPT_CONTENT_SIZE: usize = 100 * 1024;
/// Length of the excerpt kept on a raw match for transparency
pub const MATCH_EXCERPT_CHARS: usize = 160;

// Retry strategy
/// Delay unit in milliseconds; the n-th retry waits `unit * base^n`
pub const RETRY_INITIAL_DELAY_MS: u64 = 250;
/// Exponential backoff base
pub const RETRY_BACKOFF_BASE: u64 = 2;
/// Maximum delay between retries in milliseconds
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;
/// Maximum number of attempts (including the initial attempt)
/// 3 = desktop browser, alternate desktop browser, mobile browser
pub const RETRY_MAX_ATTEMPTS: usize = 3;
/// Render attempts per escalation (each attempt is a fresh browser session)
pub const RENDER_MAX_ATTEMPTS: usize = 1;

// Escalation heuristics
/// A successful fetch with more than this many script references and zero
/// detections is treated as "suspiciously empty" and escalated.
pub const ESCALATION_SCRIPT_COUNT_THRESHOLD: usize = 5;
/// HTTP statuses that indicate bot-blocking or rate limiting
pub const BLOCKING_STATUSES: &[u16] = &[403, 503];

// Crawl
/// Delay between consecutive page requests of one crawl, in milliseconds
pub const COURTESY_DELAY_MS: u64 = 1_000;
/// Default page budget when the caller does not provide one
pub const DEFAULT_MAX_PAGES: usize = 25;
/// Default depth budget when the caller does not provide one
pub const DEFAULT_MAX_DEPTH: usize = 2;

// Site-structure estimation
/// Conventional sitemap locations tried in order
pub const SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemap/sitemap.xml",
    "/wp-sitemap.xml",
];
/// Maximum number of child sitemaps fetched when a sitemap index is found
pub const MAX_CHILD_SITEMAPS: usize = 5;
/// Upper bound for a small site (pages)
pub const SMALL_SITE_MAX_PAGES: usize = 10;
/// Upper bound for a medium site (pages)
pub const MEDIUM_SITE_MAX_PAGES: usize = 50;
/// Page budget recommended for large sites
pub const LARGE_SITE_PAGE_BUDGET: usize = 100;
/// Conservative budget used when nothing could be learned about the site
pub const CONSERVATIVE_MAX_PAGES: usize = 5;
pub const CONSERVATIVE_MAX_DEPTH: usize = 1;
/// Deepest crawl the estimator recommends, however nested the site looks
pub const MAX_ESTIMATED_DEPTH: usize = 4;
/// Depth budget for flat sites whose links sit at most one segment deep
pub const FLAT_SITE_MAX_DEPTH: usize = 2;

// Page priority heuristics (missing-page report)
/// Path keywords of tier-1 pages (home is matched separately)
pub const HIGH_PRIORITY_PATH_KEYWORDS: &[&str] = &[
    "home", "index", "contact", "checkout", "cart", "basket", "order", "purchase", "signup",
    "register", "login", "account",
];
/// Path keywords of tier-2 pages
pub const MEDIUM_PRIORITY_PATH_KEYWORDS: &[&str] = &[
    "blog", "news", "article", "content", "support", "help", "faq", "docs", "resources",
    "about", "product",
];

/// Overall budget for a single lightweight detection, including retries
pub const DETECTION_TIMEOUT: Duration = Duration::from_secs(60);

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;
pub const HTTP_STATUS_SERVICE_UNAVAILABLE: u16 = 503;

// Simulated client identities, rotated across lightweight fetch retries
/// First attempt: desktop Chrome
pub const DESKTOP_CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
/// Second attempt: desktop Firefox
pub const DESKTOP_FIREFOX_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0";
/// Third attempt: mobile Safari
pub const MOBILE_SAFARI_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Mobile/15E148 Safari/604.1";
