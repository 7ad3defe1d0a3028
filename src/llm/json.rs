// file: src/llm/json.rs
// description: pull structured json out of free-form model replies
// reference: models often wrap the payload in prose or code fences

use crate::error::{ResearchError, Result};
use serde::de::DeserializeOwned;

/// Deserialize the outermost `[...]` span of `text`.
pub fn parse_embedded_array<T: DeserializeOwned>(text: &str) -> Result<T> {
    parse_span(text, '[', ']')
}

/// Deserialize the outermost `{...}` span of `text`.
pub fn parse_embedded_object<T: DeserializeOwned>(text: &str) -> Result<T> {
    parse_span(text, '{', '}')
}

fn parse_span<T: DeserializeOwned>(text: &str, open: char, close: char) -> Result<T> {
    let start = text.find(open);
    let end = text.rfind(close);

    let span = match (start, end) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => {
            return Err(ResearchError::MalformedResponse(format!(
                "No JSON {} found in response",
                if open == '[' { "array" } else { "object" }
            )));
        }
    };

    serde_json::from_str(span)
        .map_err(|e| ResearchError::MalformedResponse(format!("Invalid JSON response: {}", e)))
}
