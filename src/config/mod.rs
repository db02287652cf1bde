//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, retry schedule, escalation heuristics)
//! - Runtime configuration (`Config`) and its policy sub-structures
//! - Per-call inputs (`DetectionTarget`, `CrawlOptions`)

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    default_account, Config, CrawlOptions, DetectionTarget, Environment, EscalationPolicy,
    LogFormat, LogLevel, MigrationPlan, RenderSettings, RetryPolicy,
};
