// file: src/analysis/extractor.rs
// description: per-document fact extraction with confidence labels
// reference: a failed extraction contributes zero facts, never an error

use crate::config::AgentConfig;
use crate::error::Result;
use crate::llm::{LlmClient, json, prompts};
use crate::models::{Confidence, ExtractedFact, FetchedDocument};
use crate::utils::Validator;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    facts: Vec<RawFact>,
}

#[derive(Debug, Deserialize)]
struct RawFact {
    #[serde(default, alias = "text", alias = "fact")]
    claim: String,
    #[serde(default)]
    caveat: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
}

pub struct FactExtractor {
    llm: Arc<dyn LlmClient>,
    facts_per_source: usize,
    max_source_chars: usize,
}

impl FactExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, config: &AgentConfig) -> Self {
        Self {
            llm,
            facts_per_source: config.facts_per_source,
            max_source_chars: config.max_source_chars,
        }
    }

    /// Facts from one document, each attributed to `document.url`.
    pub async fn extract(&self, question: &str, document: &FetchedDocument) -> Vec<ExtractedFact> {
        match self.try_extract(question, document).await {
            Ok(facts) => {
                debug!("Extracted {} facts from {}", facts.len(), document.url);
                facts
            }
            Err(e) => {
                warn!("Fact extraction failed for {}: {}", document.url, e);
                Vec::new()
            }
        }
    }

    async fn try_extract(
        &self,
        question: &str,
        document: &FetchedDocument,
    ) -> Result<Vec<ExtractedFact>> {
        let content = Validator::char_prefix(&document.clean_text, self.max_source_chars);
        let prompt =
            prompts::extract_prompt(question, &document.url, content, self.facts_per_source);

        let response = self.llm.complete(&prompt).await?;
        let parsed: ExtractionResponse = json::parse_embedded_object(&response)?;

        Ok(parsed
            .facts
            .into_iter()
            .filter(|raw| !raw.claim.trim().is_empty())
            .take(self.facts_per_source)
            .map(|raw| {
                let confidence = raw
                    .confidence
                    .as_deref()
                    .and_then(Confidence::parse)
                    .unwrap_or(Confidence::Medium);
                ExtractedFact::new(raw.claim, confidence, document.url.clone(), raw.caveat)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::testing::StaticLlm;
    use chrono::Utc;

    fn document(text: &str) -> FetchedDocument {
        FetchedDocument::new(
            "https://plants.test/photosynthesis".to_string(),
            "Photosynthesis".to_string(),
            text.to_string(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_extracts_and_attributes_facts() {
        let reply = r#"```json
        {"facts": [
            {"claim": "Plants use sunlight", "caveat": null, "confidence": "high"},
            {"claim": "  ", "confidence": "high"},
            {"claim": "Oxygen is a by-product", "caveat": "in oxygenic photosynthesis", "confidence": "certain"},
            {"claim": "Source url claimed by model", "confidence": "LOW", "source": "https://elsewhere.test"}
        ]}
        ```"#;
        let extractor = FactExtractor::new(
            Arc::new(StaticLlm::replying(reply)),
            &Config::default_config().agent,
        );

        let facts = extractor.extract("What is photosynthesis?", &document("text")).await;

        assert_eq!(facts.len(), 3);
        assert_eq!(facts[0].confidence, Confidence::High);
        assert_eq!(facts[0].caveat, None);
        assert_eq!(facts[1].confidence, Confidence::Medium);
        assert_eq!(facts[1].caveat.as_deref(), Some("in oxygenic photosynthesis"));
        assert_eq!(facts[2].confidence, Confidence::Low);
        assert!(
            facts
                .iter()
                .all(|f| f.source_url == "https://plants.test/photosynthesis")
        );
    }

    #[tokio::test]
    async fn test_caps_facts_per_source_and_content() {
        let facts_json: Vec<String> = (0..9)
            .map(|i| format!(r#"{{"claim": "fact {}", "confidence": "low"}}"#, i))
            .collect();
        let reply = format!(r#"{{"facts": [{}]}}"#, facts_json.join(","));

        let llm = Arc::new(StaticLlm::replying(&reply));
        let mut agent = Config::default_config().agent;
        agent.facts_per_source = 2;
        agent.max_source_chars = 5;
        let extractor = FactExtractor::new(llm.clone(), &agent);

        let facts = extractor.extract("q", &document("abcdefghij")).await;
        assert_eq!(facts.len(), 2);

        let prompt = llm.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("abcde"));
        assert!(!prompt.contains("abcdef"));
    }

    #[tokio::test]
    async fn test_failure_yields_no_facts() {
        let agent = Config::default_config().agent;

        let extractor = FactExtractor::new(Arc::new(StaticLlm::failing()), &agent);
        assert!(extractor.extract("q", &document("text")).await.is_empty());

        let extractor = FactExtractor::new(Arc::new(StaticLlm::replying("not json")), &agent);
        assert!(extractor.extract("q", &document("text")).await.is_empty());
    }
}
