// file: src/analysis/decomposer.rs
// description: splits a research question into focused web search sub-queries
// reference: falls back to the question itself whenever the model cannot help

use crate::config::AgentConfig;
use crate::error::{ResearchError, Result};
use crate::llm::{LlmClient, json, prompts};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

pub struct QueryDecomposer {
    llm: Arc<dyn LlmClient>,
    min_subqueries: usize,
    max_subqueries: usize,
}

impl QueryDecomposer {
    pub fn new(llm: Arc<dyn LlmClient>, config: &AgentConfig) -> Self {
        Self {
            llm,
            min_subqueries: config.min_subqueries,
            max_subqueries: config.max_subqueries,
        }
    }

    /// Between `min_subqueries` and `max_subqueries` sub-queries, or exactly
    /// `[question]` when the model fails or returns too few.
    pub async fn decompose(&self, question: &str) -> Vec<String> {
        let prompt = prompts::decompose_prompt(question, self.min_subqueries, self.max_subqueries);

        let outcome = match self.llm.complete(&prompt).await {
            Ok(response) => self.parse(&response),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(sub_queries) => {
                info!("Decomposed into {} sub-queries", sub_queries.len());
                sub_queries
            }
            Err(e) => {
                warn!("Query decomposition failed, using the original question: {}", e);
                vec![question.to_string()]
            }
        }
    }

    fn parse(&self, response: &str) -> Result<Vec<String>> {
        let entries: Vec<Value> = json::parse_embedded_array(response)?;

        let mut seen = HashSet::new();
        let mut sub_queries: Vec<String> = entries
            .iter()
            .filter_map(Value::as_str)
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty() && seen.insert(q.to_lowercase()))
            .collect();

        if sub_queries.len() < self.min_subqueries {
            return Err(ResearchError::MalformedResponse(format!(
                "expected at least {} sub-queries, got {}",
                self.min_subqueries,
                sub_queries.len()
            )));
        }

        sub_queries.truncate(self.max_subqueries);
        Ok(sub_queries)
    }
}
