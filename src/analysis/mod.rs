// file: src/analysis/mod.rs
// description: llm-backed reasoning stages: decomposition, fact extraction, synthesis
// reference: internal module structure

mod decomposer;
mod extractor;
mod synthesizer;

pub use decomposer::QueryDecomposer;
pub use extractor::FactExtractor;
pub use synthesizer::Synthesizer;
