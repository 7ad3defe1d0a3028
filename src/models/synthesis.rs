// file: src/models/synthesis.rs
// description: cross-source synthesis model: narrative, agreements, contradictions, gaps
// reference: single synthesis instance per research run

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contradiction {
    pub claim: String,
    pub explanation: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub narrative: String,
    pub agreements: Vec<String>,
    pub contradictions: Vec<Contradiction>,
    pub gaps: Vec<String>,
}

impl SynthesisResult {
    /// Used when sources were fetched but nothing could be extracted from them.
    pub fn without_facts() -> Self {
        Self {
            narrative: "Unable to answer the question due to lack of relevant information in the fetched sources."
                .to_string(),
            agreements: Vec::new(),
            contradictions: Vec::new(),
            gaps: vec!["No sources found with relevant information".to_string()],
        }
    }
}
