// file: src/exporter/mod.rs
// description: report rendering and persistence
// reference: internal module structure

pub mod json;
pub mod markdown;
pub mod writer;

pub use json::JsonExporter;
pub use markdown::render;
pub use writer::{ReportWriter, SavedReport};
