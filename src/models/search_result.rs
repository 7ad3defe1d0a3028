// file: src/models/search_result.rs
// description: web search hit model tagged with the sub-query that produced it
// reference: used for source attribution and url deduplication

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// A single hit returned by a search provider, before it is tied to a sub-query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page URL as returned by the provider
    pub url: String,

    /// Page title, "Untitled" when the provider gave none
    pub title: String,

    /// Provider snippet text
    pub snippet: String,

    /// Sub-query that surfaced this result
    pub source_query: String,
}

impl SearchResult {
    pub fn from_hit(hit: SearchHit, source_query: &str) -> Self {
        let title = if hit.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            hit.title.trim().to_string()
        };

        Self {
            url: hit.url.trim().to_string(),
            title,
            snippet: hit.snippet.trim().to_string(),
            source_query: source_query.to_string(),
        }
    }

    /// Canonical form used for deduplication: fragment dropped, trailing slash trimmed.
    pub fn dedup_key(&self) -> Option<String> {
        normalize_url(&self.url)
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_snippet_len: usize) -> String {
        let snippet_preview: String = if self.snippet.chars().count() > max_snippet_len {
            let cut: String = self.snippet.chars().take(max_snippet_len).collect();
            format!("{}...", cut)
        } else {
            self.snippet.clone()
        };

        format!("{}\n{}\n{}\n", self.title, self.url, snippet_preview)
    }
}

pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    let normalized = url.to_string();
    Some(normalized.trim_end_matches('/').to_string())
}

/// Drop results whose URL was already seen (or is not an http(s) URL),
/// keeping the first occurrence and the original order.
pub fn dedup_by_url(results: impl IntoIterator<Item = SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|result| match result.dedup_key() {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}
