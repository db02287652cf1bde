//! tag_inspector library: tag-management detection for web pages and sites
//!
//! This library inspects pages for tag managers (Tealium iQ, Google Tag
//! Manager, Adobe Launch) and directly embedded analytics tags, classifies
//! how each page is tagged, and reports migration progress across a crawled
//! site. Pages that look bot-blocked or suspiciously empty are retried with a
//! headless browser.
//!
//! # Example
//!
//! ```no_run
//! use tag_inspector::{Config, CrawlOptions, Inspector};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inspector = Inspector::new(Config::default())?;
//! let estimate = inspector.estimate_site("https://www.example.com/").await?;
//! let options = CrawlOptions {
//!     max_pages: estimate.max_pages,
//!     max_depth: estimate.max_depth,
//!     ..Default::default()
//! };
//!
//! let report = inspector.crawl_site("https://www.example.com/", &options).await?;
//! println!("Scanned {} pages: {} succeeded, {} failed",
//!          report.pages_scanned, report.pages_successful, report.pages_failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. The render tier additionally needs
//! a Chrome or Chromium installation.

pub mod analyzer;
pub mod classify;
pub mod config;
pub mod crawl;
pub mod engine;
pub mod error_handling;
pub mod escalation;
pub mod estimate;
pub mod fetch;
pub mod initialization;
mod inspector;
pub mod models;
pub mod render;
pub mod signatures;
mod utils;

// Re-export public API
pub use config::{
    Config, CrawlOptions, DetectionTarget, Environment, EscalationPolicy, LogFormat, LogLevel,
    MigrationPlan, RenderSettings, RetryPolicy,
};
pub use engine::{DetectionEngine, LightweightEngine, RenderEngine, RetrievedDocument};
pub use error_handling::{ErrorKind, FetchError, InspectorError, RenderError, RetrievalError};
pub use inspector::Inspector;
pub use models::{
    CrawlCompletion, CrawlReport, Detection, FetchTier, Methodology, PageFinding, Platform,
    SiteEstimate,
};
