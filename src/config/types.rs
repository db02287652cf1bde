//! Configuration types.
//!
//! This module defines the runtime configuration, the per-call detection
//! target and the crawl options consumed by the public operations.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::models::Platform;

/// Process-wide default target account, resolved once from the environment.
static DEFAULT_ACCOUNT: LazyLock<Option<String>> = LazyLock::new(|| {
    std::env::var(DEFAULT_ACCOUNT_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
});

/// Returns the default target account configured for this process, if any.
pub fn default_account() -> Option<String> {
    DEFAULT_ACCOUNT.clone()
}

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Publishing environment of a tag-management container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Qa,
    Dev,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Qa => "qa",
            Environment::Dev => "dev",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Environment::Prod),
            "qa" => Ok(Environment::Qa),
            "dev" | "development" => Ok(Environment::Dev),
            other => Err(format!("unknown environment '{other}' (expected prod, qa or dev)")),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller expects to find on a page.
///
/// Every field is optional: an absent field does not constrain the match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionTarget {
    pub environment: Option<Environment>,
    pub account: Option<String>,
    pub profile: Option<String>,
    pub container_id: Option<String>,
}

impl DetectionTarget {
    /// True when no field constrains the match.
    pub fn is_unconstrained(&self) -> bool {
        self.environment.is_none()
            && self.account.is_none()
            && self.profile.is_none()
            && self.container_id.is_none()
    }

    /// Fills a missing account from the configured default.
    pub fn with_default_account(&self, default_account: Option<&str>) -> Self {
        let mut resolved = self.clone();
        if resolved.account.is_none() {
            resolved.account = default_account.map(str::to_string);
        }
        resolved
    }
}

/// Retry/backoff schedule shared by the fetch and render clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    /// Delay unit; the n-th retry waits `initial_delay_ms * backoff_base^n`
    pub initial_delay_ms: u64,
    pub backoff_base: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_delay_ms: RETRY_INITIAL_DELAY_MS,
            backoff_base: RETRY_BACKOFF_BASE,
            max_delay_ms: RETRY_MAX_DELAY_MS,
        }
    }
}

/// When a lightweight result should be retried with the render tier.
///
/// The thresholds are empirical; callers are expected to tune them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub enabled: bool,
    /// "Suspiciously empty": more script references than this, zero detections
    pub script_count_threshold: usize,
    /// HTTP statuses treated as bot-blocking
    pub blocking_statuses: Vec<u16>,
    /// Hosts that are always rendered (suffix match on the host name)
    pub force_render_hosts: Vec<String>,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            script_count_threshold: ESCALATION_SCRIPT_COUNT_THRESHOLD,
            blocking_statuses: BLOCKING_STATUSES.to_vec(),
            force_render_hosts: Vec::new(),
        }
    }
}

/// Headless browser settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub enabled: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when `None`
    pub chrome_executable: Option<PathBuf>,
    pub timeout_seconds: u64,
    pub settle_ms: u64,
    /// Simulate pointer movement, scrolling and idle pauses after navigation
    pub simulate_interaction: bool,
    pub retry: RetryPolicy,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            chrome_executable: None,
            timeout_seconds: RENDER_TIMEOUT_SECS,
            settle_ms: RENDER_SETTLE_MS,
            simulate_interaction: true,
            retry: RetryPolicy {
                max_attempts: RENDER_MAX_ATTEMPTS,
                ..RetryPolicy::default()
            },
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use tag_inspector::Config;
///
/// let config = Config {
///     courtesy_delay_ms: 250,
///     default_account: Some("acme".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    /// Per-request timeout for the lightweight tier, in seconds
    pub timeout_seconds: u64,
    /// Default target account applied when a call does not supply one
    pub default_account: Option<String>,
    pub retry: RetryPolicy,
    pub escalation: EscalationPolicy,
    pub render: RenderSettings,
    /// Delay between consecutive requests of one crawl or batch
    pub courtesy_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: FETCH_TIMEOUT_SECS,
            default_account: default_account(),
            retry: RetryPolicy::default(),
            escalation: EscalationPolicy::default(),
            render: RenderSettings::default(),
            courtesy_delay_ms: COURTESY_DELAY_MS,
        }
    }
}

/// Which platform a site is moving away from, and which one it is moving to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub from: Platform,
    pub to: Platform,
}

impl Default for MigrationPlan {
    fn default() -> Self {
        Self {
            from: Platform::GoogleTagManager,
            to: Platform::TealiumIq,
        }
    }
}

/// Options for a site crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlOptions {
    pub max_pages: usize,
    pub max_depth: usize,
    /// Path prefixes that are never enqueued (e.g. `/admin`)
    pub exclude_paths: Vec<String>,
    pub target: DetectionTarget,
    pub migration: MigrationPlan,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            exclude_paths: Vec::new(),
            target: DetectionTarget::default(),
            migration: MigrationPlan::default(),
        }
    }
}
