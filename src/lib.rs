// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod analysis;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fetcher;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod utils;

pub use analysis::{FactExtractor, QueryDecomposer, Synthesizer};
pub use config::{Config, LlmProvider};
pub use error::{ResearchError, Result};
pub use exporter::{JsonExporter, ReportWriter, SavedReport, render};
pub use fetcher::{ContentFetcher, ContentSource, HtmlExtractor};
pub use llm::LlmClient;
pub use models::{
    Confidence, Contradiction, ExtractedFact, FetchedDocument, ResearchReport, SearchHit,
    SearchResult, SynthesisResult,
};
pub use pipeline::{ProgressTracker, ResearchOrchestrator, ResearchOutcome, RunStage, RunStats};
pub use search::{SearchChain, SearchProvider};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, RetryPolicy, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        let _writer = ReportWriter::new(&config.output);
    }
}
