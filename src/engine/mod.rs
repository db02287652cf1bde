//! Detection engines: interchangeable strategies for retrieving a document.
//!
//! Both tiers produce the same `RetrievedDocument`, so everything downstream
//! (analysis, matching, classification) is tier-agnostic.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error_handling::{FetchError, RetrievalError};
use crate::fetch::HttpFetcher;
use crate::models::FetchTier;
use crate::render::RenderClient;

/// A retrieved document, ready for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedDocument {
    pub final_url: String,
    pub status: u16,
    pub body: String,
    /// Title as reported by the engine; falls back to the parsed `<title>`
    pub title: Option<String>,
}

/// A retrieval strategy.
#[async_trait]
pub trait DetectionEngine: Send + Sync {
    fn tier(&self) -> FetchTier;

    async fn retrieve(&self, url: &str) -> Result<RetrievedDocument, RetrievalError>;
}

/// Plain HTTP GET; cannot see tags injected by page scripts.
pub struct LightweightEngine {
    fetcher: Arc<HttpFetcher>,
}

impl LightweightEngine {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl DetectionEngine for LightweightEngine {
    fn tier(&self) -> FetchTier {
        FetchTier::Lightweight
    }

    async fn retrieve(&self, url: &str) -> Result<RetrievedDocument, RetrievalError> {
        let response = self.fetcher.fetch(url).await?;
        Ok(RetrievedDocument {
            final_url: response.final_url,
            status: response.status,
            body: response.body,
            title: None,
        })
    }
}

/// Headless-browser retrieval.
pub struct RenderEngine {
    client: RenderClient,
}

impl RenderEngine {
    pub fn new(client: RenderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DetectionEngine for RenderEngine {
    fn tier(&self) -> FetchTier {
        FetchTier::Rendered
    }

    async fn retrieve(&self, url: &str) -> Result<RetrievedDocument, RetrievalError> {
        let page = self.client.render(url).await?;
        // A rendered error page is still a failed retrieval
        if page.status >= 400 {
            return Err(FetchError::HttpStatus {
                status: page.status,
                url: page.final_url,
            }
            .into());
        }
        Ok(RetrievedDocument {
            final_url: page.final_url,
            status: page.status,
            body: page.document_text,
            title: page.title,
        })
    }
}
