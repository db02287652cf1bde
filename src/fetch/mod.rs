//! Lightweight fetch tier.
//!
//! This module provides:
//! - Browser-mimicking request headers with rotating client identities
//! - `HttpFetcher`, a single GET with bounded retries/backoff and a body cap

mod client;
mod request;

pub use client::{FetchResponse, HttpFetcher};
pub use request::{ClientIdentity, CLIENT_IDENTITIES};
