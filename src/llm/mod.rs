// file: src/llm/mod.rs
// description: language model client abstraction and provider selection
// reference: https://docs.rs/async-trait

mod anthropic;
mod groq;
pub mod json;
pub mod prompts;

pub use anthropic::AnthropicClient;
pub use groq::GroqClient;

use crate::config::{Config, LlmProvider};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Single-prompt completion against an external model.
///
/// Implementations own their retry behaviour: a returned error has already
/// exhausted the configured attempts.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub fn build_client(config: &Config) -> Result<Arc<dyn LlmClient>> {
    let api_key = config.require_llm_key()?.to_string();

    let client: Arc<dyn LlmClient> = match config.llm.provider {
        LlmProvider::Anthropic => Arc::new(AnthropicClient::new(config.llm.clone(), api_key)?),
        LlmProvider::Groq => Arc::new(GroqClient::new(config.llm.clone(), api_key)?),
    };

    Ok(client)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::LlmClient;
    use crate::error::{ResearchError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed text (or fails) and records every prompt it saw.
    pub struct StaticLlm {
        reply: Option<String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl StaticLlm {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmClient for StaticLlm {
        fn name(&self) -> &str {
            "static"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().ok_or_else(|| ResearchError::Timeout {
                service: "static".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_requires_key() {
        let mut config = Config::default_config();
        config.llm.api_key = None;
        assert!(build_client(&config).is_err());

        config.llm.api_key = Some("sk-ant-test".to_string());
        let client = build_client(&config).unwrap();
        assert_eq!(client.name(), "anthropic");

        config.llm.provider = LlmProvider::Groq;
        config.llm.api_key = Some("gsk_test".to_string());
        let client = build_client(&config).unwrap();
        assert_eq!(client.name(), "groq");
    }
}
