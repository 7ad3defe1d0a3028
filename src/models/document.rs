// file: src/models/document.rs
// description: fetched web page model holding extracted clean text
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedDocument {
    pub url: String,
    pub title: String,
    pub clean_text: String,
    pub fetched_at: DateTime<Utc>,
    pub length_bytes: usize,
    pub content_hash: String,
}

impl FetchedDocument {
    pub fn new(url: String, title: String, clean_text: String, fetched_at: DateTime<Utc>) -> Self {
        let content_hash = Self::compute_hash(&clean_text);
        let length_bytes = clean_text.len();

        Self {
            url,
            title,
            clean_text,
            fetched_at,
            length_bytes,
            content_hash,
        }
    }

    fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn word_count(&self) -> usize {
        self.clean_text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = FetchedDocument::new(
            "https://example.com/page".to_string(),
            "Example".to_string(),
            "Plants convert light into energy".to_string(),
            Utc::now(),
        );

        assert_eq!(doc.url, "https://example.com/page");
        assert_eq!(doc.length_bytes, 32);
        assert_eq!(doc.word_count(), 5);
        assert_eq!(doc.content_hash.len(), 64);
    }

    #[test]
    fn test_hash_consistency() {
        let content = "Test content";
        let hash1 = FetchedDocument::compute_hash(content);
        let hash2 = FetchedDocument::compute_hash(content);
        assert_eq!(hash1, hash2);
    }
}
