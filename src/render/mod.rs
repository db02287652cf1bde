//! Render tier: headless browser retrieval for script-injected tags.
//!
//! Rendering is 30-100x slower than a plain fetch and is only used when the
//! escalation controller decides the lightweight result cannot be trusted.

mod browser;
mod interaction;
mod stealth;

pub use browser::{RenderClient, RenderedPage};
