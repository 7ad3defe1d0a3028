// file: src/models/fact.rs
// description: extracted fact model with three-valued confidence label
// reference: source-attributed claims produced by the fact extractor

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub const ALL: [Confidence; 3] = [Confidence::High, Confidence::Medium, Confidence::Low];

    /// Lenient parse of a model-supplied label; anything unrecognised is `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" | "moderate" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Confidence::High => "High Confidence",
            Confidence::Medium => "Medium Confidence",
            Confidence::Low => "Low Confidence",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub text: String,
    pub confidence: Confidence,
    pub source_url: String,
    pub caveat: Option<String>,
}

impl ExtractedFact {
    pub fn new(
        text: String,
        confidence: Confidence,
        source_url: String,
        caveat: Option<String>,
    ) -> Self {
        let caveat = caveat
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("null"));

        Self {
            text: text.trim().to_string(),
            confidence,
            source_url,
            caveat,
        }
    }
}
