//! Handlers module bridging jobs to their domain logic
//!
//! One handler per job kind, all behind the same `JobHandler` trait:
//! - `SearchHandler` runs a query through the search provider, optionally
//!   fanning out crawl jobs for the hits
//! - `CrawlHandler` drives the crawl frontier and chains lead processing
//! - `LeadHandler` runs extraction over fetched content
//!
//! Search and extraction themselves are external integrations; this module
//! only defines the narrow traits they plug in through.

mod crawl;
mod leads;
mod search;

pub use crawl::CrawlHandler;
pub use leads::LeadHandler;
pub use search::SearchHandler;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One result from a search provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// One lead pulled out of page content
///
/// A plain data carrier; which fields an extractor can fill depends entirely
/// on the page and the extraction method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source_url: String,
}

/// External search integration
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns up to `max_results` hits for the query.
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// External lead extraction integration
#[async_trait]
pub trait LeadExtractor: Send + Sync {
    /// Pulls leads out of one page's content.
    async fn extract(&self, text: &str, html: &str, source_url: &str)
        -> anyhow::Result<Vec<Lead>>;
}
