// file: src/llm/groq.rs
// description: Groq chat completions client (OpenAI-compatible endpoint)
// reference: https://console.groq.com/docs/api-reference#chat

use super::LlmClient;
use crate::config::LlmConfig;
use crate::error::{ResearchError, Result};
use crate::utils::retry::{RetryPolicy, retry_with_backoff};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "groq";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct GroqClient {
    client: Client,
    api_key: String,
    endpoint: String,
    config: LlmConfig,
    retry: RetryPolicy,
}

impl GroqClient {
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ResearchError::Config(format!("failed to build HTTP client: {}", e)))?;
        let endpoint = format!("{}/chat/completions", config.resolved_base_url());
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
        let request = ChatRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(
            "Requesting completion from Groq API ({}) for {} chars",
            self.config.model,
            prompt.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ResearchError::from_response(SERVICE, response).await);
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            ResearchError::MalformedResponse(format!("Failed to parse Groq API response: {}", e))
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                ResearchError::MalformedResponse("No completion returned from Groq API".to_string())
            })
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        retry_with_backoff(&self.retry, "groq completion", || self.send(prompt)).await
    }
}
