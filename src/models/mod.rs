// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod fact;
pub mod report;
pub mod search_result;
pub mod synthesis;

pub use document::FetchedDocument;
pub use fact::{Confidence, ExtractedFact};
pub use report::ResearchReport;
pub use search_result::{SearchHit, SearchResult, dedup_by_url, normalize_url};
pub use synthesis::{Contradiction, SynthesisResult};
