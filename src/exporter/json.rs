// file: src/exporter/json.rs
// description: json export and re-import of complete research reports
// reference: https://docs.rs/serde_json

use crate::error::{ResearchError, Result};
use crate::models::ResearchReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| ResearchError::FileOperation {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir })
    }

    /// Write `<report stem>.json` and return its path.
    pub fn export(&self, report: &ResearchReport, pretty: bool) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{}.json", report.file_stem()));

        let body = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };

        fs::write(&path, body).map_err(|source| ResearchError::FileOperation {
            path: path.clone(),
            source,
        })?;

        info!("Exported report JSON to {}", path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<ResearchReport> {
        let body = fs::read_to_string(path).map_err(|source| ResearchError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&body)?)
    }
}
