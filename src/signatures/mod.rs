//! Signature catalog and matching.
//!
//! This module provides:
//! - The static table of tag-manager and direct-tag signatures
//! - `find_matches`, which turns a script inventory into raw matches

mod catalog;
mod matcher;

pub use catalog::{IdFormat, SignatureCatalog, TagSignature};
pub use matcher::{find_matches, RawMatch};
