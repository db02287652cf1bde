//! Shared helpers.
//!
//! This module provides:
//! - A typed retry/backoff helper shared by the fetch and render clients
//! - CSS selector and regex construction helpers
//! - URL validation, normalization and same-site checks

mod retry;
mod selector;
mod url;

pub use retry::retry_with_policy;
pub use selector::{compile_regex_unsafe, parse_selector_unsafe};
pub use self::url::{is_same_site, validate_and_normalize_url};
