// file: src/search/mod.rs
// description: web search provider abstraction and fallback chain
// reference: internal module structure

mod chain;
mod duckduckgo;
mod google;

pub use chain::SearchChain;
pub use duckduckgo::DuckDuckGoProvider;
pub use google::GoogleProvider;

use crate::error::Result;
use crate::models::SearchHit;
use async_trait::async_trait;

/// Uniform capability every search backend offers to the chain.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `max_results` hits for `query`. An empty list is a valid answer.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}
