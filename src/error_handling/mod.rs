//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for each layer (fetch, render, public API)
//! - `ErrorKind`, the classification attached to failed findings
//! - Retry strategy configuration and reqwest error categorization
//! - Per-kind counters used for crawl error summaries

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, get_retry_strategy};
pub use stats::ProcessingStats;
pub use types::{
    ErrorKind, FetchError, InitializationError, InspectorError, RenderError, RetrievalError,
};
