// file: src/fetcher/mod.rs
// description: page retrieval and html to clean text conversion
// reference: internal module structure

mod content;
mod extract;

pub use content::{ContentFetcher, ContentSource};
pub use extract::{ExtractedPage, HtmlExtractor};
