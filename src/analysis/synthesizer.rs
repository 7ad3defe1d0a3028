// file: src/analysis/synthesizer.rs
// description: cross-source synthesis of extracted facts into a single answer
// reference: the only stage whose model failure aborts the run

use crate::config::LlmConfig;
use crate::error::{ResearchError, Result};
use crate::llm::{LlmClient, json, prompts};
use crate::models::{Contradiction, ExtractedFact, SynthesisResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct FactPayload<'a> {
    claim: &'a str,
    confidence: &'a str,
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caveat: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    #[serde(default, alias = "narrative")]
    answer: String,
    #[serde(default)]
    agreements: Vec<String>,
    #[serde(default)]
    contradictions: Vec<RawContradiction>,
    #[serde(default)]
    gaps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawContradiction {
    #[serde(default, alias = "issue")]
    claim: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    sources: Vec<String>,
}

pub struct Synthesizer {
    llm: Arc<dyn LlmClient>,
    context_char_budget: usize,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            llm,
            context_char_budget: config.context_char_budget,
        }
    }

    /// One model call over the whole fact set.
    ///
    /// With no facts the model is not consulted and a fixed "unable to answer"
    /// synthesis is returned. Any model failure, or a reply without an
    /// answer, is [`ResearchError::ModelUnavailable`].
    pub async fn synthesize(
        &self,
        question: &str,
        facts: &[ExtractedFact],
    ) -> Result<SynthesisResult> {
        if facts.is_empty() {
            warn!("No facts to synthesize, returning placeholder synthesis");
            return Ok(SynthesisResult::without_facts());
        }

        let kept = self.fit_to_budget(facts)?;
        if kept.len() < facts.len() {
            warn!(
                "Dropped {} low-priority facts to fit the {} char context budget",
                facts.len() - kept.len(),
                self.context_char_budget
            );
        }

        let num_sources = kept
            .iter()
            .map(|fact| fact.source_url.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let facts_json = serialize_facts(&kept)?;
        let prompt = prompts::synthesize_prompt(question, num_sources, &facts_json);

        let response = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| ResearchError::ModelUnavailable(e.to_string()))?;

        let parsed: SynthesisResponse = json::parse_embedded_object(&response)
            .map_err(|e| ResearchError::ModelUnavailable(e.to_string()))?;

        if parsed.answer.trim().is_empty() {
            return Err(ResearchError::ModelUnavailable(
                "synthesis reply contained no answer".to_string(),
            ));
        }

        info!(
            "Synthesized answer from {} facts across {} sources",
            kept.len(),
            num_sources
        );

        Ok(SynthesisResult {
            narrative: parsed.answer.trim().to_string(),
            agreements: clean_list(parsed.agreements),
            contradictions: parsed
                .contradictions
                .into_iter()
                .filter(|c| !c.claim.trim().is_empty())
                .map(|c| Contradiction {
                    claim: c.claim.trim().to_string(),
                    explanation: c.explanation.trim().to_string(),
                    sources: c.sources,
                })
                .collect(),
            gaps: clean_list(parsed.gaps),
        })
    }

    /// Drop facts until the serialized set fits the budget: low confidence
    /// before medium before high, later facts before earlier ones within a
    /// tier. At least one fact is always kept. Input order is preserved.
    fn fit_to_budget<'a>(&self, facts: &'a [ExtractedFact]) -> Result<Vec<&'a ExtractedFact>> {
        let mut drop_order: Vec<usize> = (0..facts.len()).collect();
        drop_order.sort_by(|&a, &b| {
            facts[b]
                .confidence
                .cmp(&facts[a].confidence)
                .then(b.cmp(&a))
        });

        let mut keep = vec![true; facts.len()];
        let mut remaining = facts.len();
        let mut dropped = drop_order.into_iter();

        loop {
            let kept: Vec<&ExtractedFact> = facts
                .iter()
                .zip(&keep)
                .filter_map(|(fact, &k)| k.then_some(fact))
                .collect();

            if remaining <= 1 || serialize_facts(&kept)?.chars().count() <= self.context_char_budget {
                return Ok(kept);
            }

            match dropped.next() {
                Some(index) => {
                    keep[index] = false;
                    remaining -= 1;
                }
                None => return Ok(kept),
            }
        }
    }
}

fn serialize_facts(facts: &[&ExtractedFact]) -> Result<String> {
    let payload: Vec<FactPayload<'_>> = facts
        .iter()
        .map(|fact| FactPayload {
            claim: &fact.text,
            confidence: fact.confidence.as_str(),
            source: &fact.source_url,
            caveat: fact.caveat.as_deref(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&payload)?)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::testing::StaticLlm;
    use crate::models::Confidence;

    const REPLY: &str = r#"{
        "agreements": ["Light is required", " "],
        "contradictions": [{"claim": "Efficiency figures differ", "sources": ["https://a.test"], "explanation": "Different plants"}],
        "gaps": ["Night-time processes"],
        "answer": "Photosynthesis turns light into chemical energy."
    }"#;

    fn fact(text: &str, confidence: Confidence, url: &str) -> ExtractedFact {
        ExtractedFact::new(text.to_string(), confidence, url.to_string(), None)
    }

    fn synthesizer(llm: Arc<StaticLlm>, budget: usize) -> Synthesizer {
        let mut config = Config::default_config().llm;
        config.context_char_budget = budget;
        Synthesizer::new(llm, &config)
    }

    #[tokio::test]
    async fn test_synthesize_parses_reply() {
        let llm = Arc::new(StaticLlm::replying(REPLY));
        let facts = vec![
            fact("Plants use light", Confidence::High, "https://a.test"),
            fact("Leaves are green", Confidence::Low, "https://b.test"),
        ];

        let result = synthesizer(llm.clone(), 48_000)
            .synthesize("What is photosynthesis?", &facts)
            .await
            .unwrap();

        assert_eq!(result.narrative, "Photosynthesis turns light into chemical energy.");
        assert_eq!(result.agreements, vec!["Light is required"]);
        assert_eq!(result.contradictions.len(), 1);
        assert_eq!(result.contradictions[0].sources, vec!["https://a.test"]);
        assert_eq!(result.gaps, vec!["Night-time processes"]);

        let prompt = llm.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Facts gathered from 2 sources"));
        assert!(prompt.contains("Leaves are green"));
    }

    #[tokio::test]
    async fn test_zero_facts_skips_model() {
        let llm = Arc::new(StaticLlm::replying(REPLY));
        let result = synthesizer(llm.clone(), 48_000).synthesize("q", &[]).await.unwrap();

        assert_eq!(result, SynthesisResult::without_facts());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_fatal() {
        let facts = vec![fact("Plants use light", Confidence::High, "https://a.test")];

        let err = synthesizer(Arc::new(StaticLlm::failing()), 48_000)
            .synthesize("q", &facts)
            .await
            .unwrap_err();
        assert!(matches!(err, ResearchError::ModelUnavailable(_)));

        let err = synthesizer(Arc::new(StaticLlm::replying(r#"{"answer": ""}"#)), 48_000)
            .synthesize("q", &facts)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_budget_drops_low_confidence_and_later_facts_first() {
        let facts = vec![
            fact("high one", Confidence::High, "https://a.test"),
            fact("low one", Confidence::Low, "https://a.test"),
            fact("medium one", Confidence::Medium, "https://b.test"),
            fact("low two", Confidence::Low, "https://b.test"),
            fact("high two", Confidence::High, "https://b.test"),
        ];

        let two_facts = serialize_facts(&[&facts[0], &facts[4]]).unwrap().chars().count();
        let three_facts = serialize_facts(&[&facts[0], &facts[2], &facts[4]])
            .unwrap()
            .chars()
            .count();
        assert!(two_facts < three_facts);

        let synth = synthesizer(Arc::new(StaticLlm::failing()), three_facts);
        let kept: Vec<&str> = synth
            .fit_to_budget(&facts)
            .unwrap()
            .iter()
            .map(|f| f.text.as_str())
            .collect();
        assert_eq!(kept, vec!["high one", "medium one", "high two"]);

        let synth = synthesizer(Arc::new(StaticLlm::failing()), two_facts);
        let kept = synth.fit_to_budget(&facts).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|f| f.confidence == Confidence::High));

        let synth = synthesizer(Arc::new(StaticLlm::failing()), 1);
        assert_eq!(synth.fit_to_budget(&facts).unwrap()[0].text, "high one");
    }
}
