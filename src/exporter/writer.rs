// file: src/exporter/writer.rs
// description: persists the rendered report and optional companion artifacts
// reference: research_report_<timestamp>_<id>.md in the configured report directory

use super::json::JsonExporter;
use crate::config::OutputConfig;
use crate::error::{ResearchError, Result};
use crate::models::{FetchedDocument, ResearchReport};
use crate::utils::Validator;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SOURCE_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub markdown: PathBuf,
    pub json: Option<PathBuf>,
    pub sources: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    report_dir: PathBuf,
    save_intermediate: bool,
    export_json: bool,
}

impl ReportWriter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            report_dir: config.report_dir.clone(),
            save_intermediate: config.save_intermediate,
            export_json: config.export_json,
        }
    }

    pub fn save(
        &self,
        report: &ResearchReport,
        markdown: &str,
        documents: &[FetchedDocument],
    ) -> Result<SavedReport> {
        Validator::ensure_writable_directory(&self.report_dir)?;

        let markdown_path = self.report_dir.join(format!("{}.md", report.file_stem()));
        write_file(&markdown_path, markdown)?;
        info!("Report saved to: {}", markdown_path.display());

        // Companion files are best effort once the report itself is on disk.
        let json = if self.export_json {
            JsonExporter::new(&self.report_dir)
                .and_then(|exporter| exporter.export(report, true))
                .map_err(|e| warn!("Skipping JSON export: {}", e))
                .ok()
        } else {
            None
        };

        let sources = if self.save_intermediate {
            self.save_sources(report, documents)
                .map_err(|e| warn!("Skipping sources dump: {}", e))
                .ok()
        } else {
            None
        };

        Ok(SavedReport {
            markdown: markdown_path,
            json,
            sources,
        })
    }

    fn save_sources(&self, report: &ResearchReport, documents: &[FetchedDocument]) -> Result<PathBuf> {
        let path = self
            .report_dir
            .join(format!("sources_{}.txt", report.artifact_suffix()));

        let mut body = String::new();
        let _ = writeln!(body, "Sources for: {}", report.question);
        let _ = writeln!(body, "Collected at: {}", report.generated_at.to_rfc3339());
        let _ = writeln!(body, "{}\n", "=".repeat(80));

        for (idx, doc) in documents.iter().enumerate() {
            let _ = writeln!(body, "Source {}: {}", idx + 1, doc.title);
            let _ = writeln!(body, "URL: {}", doc.url);
            let _ = writeln!(body, "Fetched at: {}", doc.fetched_at.to_rfc3339());
            let _ = writeln!(body, "Content length: {} characters", doc.clean_text.chars().count());
            let _ = writeln!(body, "SHA-256: {}", doc.content_hash);
            let _ = writeln!(body, "{}", "-".repeat(80));
            let _ = writeln!(
                body,
                "{}\n",
                Validator::truncate_text(&doc.clean_text, SOURCE_PREVIEW_CHARS)
            );
        }

        write_file(&path, &body)?;
        info!("Sources saved to: {}", path.display());
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| ResearchError::FileOperation {
        path: path.to_path_buf(),
        source,
    })
}
