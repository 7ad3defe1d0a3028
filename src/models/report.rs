// file: src/models/report.rs
// description: terminal research report aggregating every artifact of a run
// reference: exportable as markdown and json

use crate::models::{Confidence, ExtractedFact, SearchResult, SynthesisResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub id: Uuid,
    pub question: String,
    pub sub_queries: Vec<String>,
    /// Only results whose page was fetched successfully.
    pub sources: Vec<SearchResult>,
    pub facts: Vec<ExtractedFact>,
    pub synthesis: SynthesisResult,
    pub generated_at: DateTime<Utc>,
}

impl ResearchReport {
    pub fn facts_with_confidence(&self, confidence: Confidence) -> Vec<&ExtractedFact> {
        self.facts
            .iter()
            .filter(|fact| fact.confidence == confidence)
            .collect()
    }

    /// 1-based citation number of a source URL, following `sources` order.
    pub fn citation_for(&self, url: &str) -> Option<usize> {
        self.sources
            .iter()
            .position(|source| source.url == url)
            .map(|idx| idx + 1)
    }

    /// Distinct sub-queries that contributed at least one source, in sub-query order.
    pub fn queries_with_sources(&self) -> Vec<&str> {
        let mut queries: Vec<&str> = self
            .sub_queries
            .iter()
            .map(String::as_str)
            .filter(|q| self.sources.iter().any(|s| s.source_query == *q))
            .collect();

        for source in &self.sources {
            if !queries.contains(&source.source_query.as_str()) {
                queries.push(source.source_query.as_str());
            }
        }

        queries
    }

    /// `research_report_<timestamp>_<id prefix>`; the id prefix keeps two
    /// runs finishing in the same second from sharing a file name.
    pub fn file_stem(&self) -> String {
        format!("research_report_{}", self.artifact_suffix())
    }

    /// Timestamp plus the first 8 hex digits of the report id.
    pub fn artifact_suffix(&self) -> String {
        let id = self.id.simple().to_string();
        format!(
            "{}_{}",
            self.generated_at.format("%Y%m%d_%H%M%S"),
            &id[..8]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn source(url: &str, query: &str) -> SearchResult {
        SearchResult {
            url: url.to_string(),
            title: "t".to_string(),
            snippet: String::new(),
            source_query: query.to_string(),
        }
    }

    fn report() -> ResearchReport {
        ResearchReport {
            id: Uuid::nil(),
            question: "q".to_string(),
            sub_queries: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            sources: vec![source("https://x.test/1", "b"), source("https://x.test/2", "a")],
            facts: vec![ExtractedFact::new(
                "fact".to_string(),
                Confidence::Low,
                "https://x.test/2".to_string(),
                None,
            )],
            synthesis: SynthesisResult::without_facts(),
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap(),
        }
    }

    #[test]
    fn test_citation_numbers_follow_source_order() {
        let report = report();
        assert_eq!(report.citation_for("https://x.test/1"), Some(1));
        assert_eq!(report.citation_for("https://x.test/2"), Some(2));
        assert_eq!(report.citation_for("https://x.test/3"), None);
    }

    #[test]
    fn test_queries_with_sources_keeps_subquery_order() {
        assert_eq!(report().queries_with_sources(), vec!["a", "b"]);
    }

    #[test]
    fn test_file_stem_uses_timestamp_and_id() {
        assert_eq!(report().file_stem(), "research_report_20240301_090507_00000000");

        let mut other = report();
        other.id = Uuid::parse_str("9f1c2d3e-0000-4000-8000-000000000000").unwrap();
        assert_eq!(other.file_stem(), "research_report_20240301_090507_9f1c2d3e");
        assert_eq!(report().facts_with_confidence(Confidence::Low).len(), 1);
        assert!(report().facts_with_confidence(Confidence::High).is_empty());
    }
}
