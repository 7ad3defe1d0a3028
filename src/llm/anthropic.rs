// file: src/llm/anthropic.rs
// description: Anthropic Messages API client
// reference: https://docs.anthropic.com/en/api/messages

use super::LlmClient;
use crate::config::LlmConfig;
use crate::error::{ResearchError, Result};
use crate::utils::retry::{RetryPolicy, retry_with_backoff};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const SERVICE: &str = "anthropic";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    endpoint: String,
    config: LlmConfig,
    retry: RetryPolicy,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ResearchError::Config(format!("failed to build HTTP client: {}", e)))?;
        let endpoint = format!("{}/v1/messages", config.resolved_base_url());
        let retry = RetryPolicy::from_millis(config.max_retries, config.retry_base_delay_ms);

        Ok(Self {
            client,
            api_key,
            endpoint,
            config,
            retry,
        })
    }

    async fn send(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!(
            "Requesting completion from Anthropic ({}) for {} chars",
            self.config.model,
            prompt.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ResearchError::from_response(SERVICE, response).await);
        }

        let body: MessagesResponse = response.json().await.map_err(|e| {
            ResearchError::MalformedResponse(format!("Failed to parse Anthropic response: {}", e))
        })?;

        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ResearchError::MalformedResponse(
                "Anthropic response contained no text".to_string(),
            ));
        }

        debug!("Received {} chars from Anthropic", text.len());
        Ok(text)
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        retry_with_backoff(&self.retry, "anthropic completion", || self.send(prompt)).await
    }
}
