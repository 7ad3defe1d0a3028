// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{ResearchError, Result};
use std::fs;
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_question(question: &str) -> Result<()> {
        if question.trim().is_empty() {
            return Err(ResearchError::Validation(
                "Research question is empty".to_string(),
            ));
        }

        if question.chars().count() > 2000 {
            return Err(ResearchError::Validation(
                "Research question too long (max 2000 characters)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ResearchError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(ResearchError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Create the directory if needed and prove it accepts writes.
    pub fn ensure_writable_directory(path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|source| ResearchError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;
        Self::validate_directory(path)?;

        let probe = path.join(".write_probe");
        fs::write(&probe, b"ok").map_err(|source| ResearchError::FileOperation {
            path: probe.clone(),
            source,
        })?;
        fs::remove_file(&probe).ok();

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ResearchError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Character-boundary safe truncation with a trailing ellipsis.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            None => text.to_string(),
            Some((idx, _)) => format!("{}...", &text[..idx]),
        }
    }

    /// Character-boundary safe prefix without decoration.
    pub fn char_prefix(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            None => text,
            Some((idx, _)) => &text[..idx],
        }
    }

    pub fn truncate_words(text: &str, max_words: usize) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= max_words {
            text.to_string()
        } else {
            words[..max_words].join(" ")
        }
    }
}
