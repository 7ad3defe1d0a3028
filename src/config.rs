// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{ResearchError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const KNOWN_SEARCH_PROVIDERS: &[&str] = &["duckduckgo", "google"];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub fetching: FetchConfig,
    pub agent: AgentConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Anthropic,
    Groq,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Upper bound on the serialized fact set sent to the synthesizer.
    pub context_char_budget: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Tried in order; later providers are fallbacks.
    pub providers: Vec<String>,
    pub max_results_per_query: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub duckduckgo_url: String,
    pub google_url: String,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub max_content_words: usize,
    pub min_content_chars: usize,
    pub max_body_bytes: usize,
    pub concurrency: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub min_subqueries: usize,
    pub max_subqueries: usize,
    pub facts_per_source: usize,
    pub max_source_chars: usize,
    pub extraction_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub report_dir: PathBuf,
    pub save_intermediate: bool,
    pub export_json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
    pub console: bool,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn default_base_url(&self) -> &'static str {
        match self.provider {
            LlmProvider::Anthropic => "https://api.anthropic.com",
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
        }
    }

    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_google_credentials(&self) -> bool {
        matches!(
            (&self.google_api_key, &self.google_cse_id),
            (Some(key), Some(cx)) if !key.is_empty() && !cx.is_empty()
        )
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Built-in defaults, then the TOML file, then `RESEARCH_ASSISTANT__*`
    /// environment overrides. An explicit path must exist; the default
    /// `config/default.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| ResearchError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RESEARCH_ASSISTANT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| ResearchError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| ResearchError::Config(e.to_string()))?;

        config.apply_env_fallbacks();
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Anthropic,
                model: "claude-3-5-sonnet-20241022".to_string(),
                api_key: None,
                base_url: None,
                max_tokens: 4000,
                temperature: 0.3,
                timeout_secs: 60,
                max_retries: 3,
                retry_base_delay_ms: 1000,
                context_char_budget: 48_000,
            },
            search: SearchConfig {
                providers: vec!["duckduckgo".to_string(), "google".to_string()],
                max_results_per_query: 5,
                timeout_secs: 10,
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                    .to_string(),
                google_api_key: None,
                google_cse_id: None,
                duckduckgo_url: "https://html.duckduckgo.com/html/".to_string(),
                google_url: "https://www.googleapis.com/customsearch/v1".to_string(),
                max_retries: 3,
                retry_base_delay_ms: 1000,
                concurrency: 3,
            },
            fetching: FetchConfig {
                timeout_secs: 10,
                retry_attempts: 2,
                max_content_words: 5000,
                min_content_chars: 200,
                max_body_bytes: 5 * 1_048_576,
                concurrency: 4,
                user_agent: "Mozilla/5.0 (compatible; ResearchAssistant/1.0)".to_string(),
            },
            agent: AgentConfig {
                min_subqueries: 3,
                max_subqueries: 5,
                facts_per_source: 5,
                max_source_chars: 10_000,
                extraction_concurrency: 2,
            },
            output: OutputConfig {
                report_dir: PathBuf::from("./reports"),
                save_intermediate: false,
                export_json: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
                console: true,
            },
        }
    }

    /// Fill unset API credentials from the conventional vendor variables.
    pub fn apply_env_fallbacks(&mut self) {
        if self.llm.api_key.as_deref().is_none_or(str::is_empty) {
            let var = match self.llm.provider {
                LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
                LlmProvider::Groq => "GROQ_API_KEY",
            };
            self.llm.api_key = std::env::var(var).ok().filter(|v| !v.is_empty());
        }

        if self.search.google_api_key.is_none() {
            self.search.google_api_key = std::env::var("GOOGLE_API_KEY").ok();
        }

        if self.search.google_cse_id.is_none() {
            self.search.google_cse_id = std::env::var("GOOGLE_CSE_ID").ok();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent.min_subqueries == 0 {
            return Err(ResearchError::Config(
                "min_subqueries must be greater than 0".to_string(),
            ));
        }

        if self.agent.min_subqueries > self.agent.max_subqueries {
            return Err(ResearchError::Config(format!(
                "min_subqueries ({}) exceeds max_subqueries ({})",
                self.agent.min_subqueries, self.agent.max_subqueries
            )));
        }

        if self.agent.facts_per_source == 0 {
            return Err(ResearchError::Config(
                "facts_per_source must be greater than 0".to_string(),
            ));
        }

        if self.search.max_results_per_query == 0 {
            return Err(ResearchError::Config(
                "max_results_per_query must be greater than 0".to_string(),
            ));
        }

        if self.search.concurrency == 0
            || self.fetching.concurrency == 0
            || self.agent.extraction_concurrency == 0
        {
            return Err(ResearchError::Config(
                "concurrency limits must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(ResearchError::Config(format!(
                "temperature must be within [0, 1], got {}",
                self.llm.temperature
            )));
        }

        if self.llm.max_retries == 0 || self.search.max_retries == 0 || self.fetching.retry_attempts == 0
        {
            return Err(ResearchError::Config(
                "retry attempts must be at least 1".to_string(),
            ));
        }

        if self.search.providers.is_empty() {
            return Err(ResearchError::Config(
                "at least one search provider must be configured".to_string(),
            ));
        }

        for provider in &self.search.providers {
            if !KNOWN_SEARCH_PROVIDERS.contains(&provider.to_lowercase().as_str()) {
                return Err(ResearchError::Config(format!(
                    "unknown search provider '{}' (expected one of: {})",
                    provider,
                    KNOWN_SEARCH_PROVIDERS.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// API key for the configured model provider, required before any LLM call.
    pub fn require_llm_key(&self) -> Result<&str> {
        let key = self
            .llm
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty() && !k.starts_with("${"))
            .ok_or_else(|| {
                ResearchError::Config(match self.llm.provider {
                    LlmProvider::Anthropic => {
                        "ANTHROPIC_API_KEY not set. Export it or set llm.api_key".to_string()
                    }
                    LlmProvider::Groq => {
                        "GROQ_API_KEY not set. Export it or set llm.api_key".to_string()
                    }
                })
            })?;

        if self.llm.provider == LlmProvider::Anthropic && !key.starts_with("sk-ant-") {
            return Err(ResearchError::Config(
                "Invalid Anthropic API key format. Expected format: sk-ant-...".to_string(),
            ));
        }

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.min_subqueries, 3);
        assert_eq!(config.agent.max_subqueries, 5);
    }

    #[test]
    fn test_rejects_inverted_subquery_bounds() {
        let mut config = Config::default_config();
        config.agent.min_subqueries = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let mut config = Config::default_config();
        config.search.providers = vec!["altavista".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("altavista"));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let mut config = Config::default_config();
        config.llm.temperature = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_llm_key() {
        let mut config = Config::default_config();
        config.llm.api_key = Some("${ANTHROPIC_API_KEY}".to_string());
        assert!(config.require_llm_key().is_err());

        config.llm.api_key = Some("not-a-real-key".to_string());
        assert!(config.require_llm_key().is_err());

        config.llm.api_key = Some("sk-ant-test".to_string());
        assert_eq!(config.require_llm_key().unwrap(), "sk-ant-test");

        config.llm.provider = LlmProvider::Groq;
        config.llm.api_key = Some("gsk_test".to_string());
        assert!(config.require_llm_key().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("research.toml");
        let defaults = Config::default_config();
        let mut toml_text = String::new();
        toml_text.push_str(&format!(
            "[llm]\nprovider = \"groq\"\nmodel = \"llama-3.3-70b-versatile\"\napi_key = \"gsk_file\"\nmax_tokens = 2000\ntemperature = 0.2\ntimeout_secs = 30\nmax_retries = 2\nretry_base_delay_ms = 10\ncontext_char_budget = {}\n\n",
            defaults.llm.context_char_budget
        ));
        toml_text.push_str(
            "[search]\nproviders = [\"duckduckgo\"]\nmax_results_per_query = 4\ntimeout_secs = 5\nuser_agent = \"test\"\nduckduckgo_url = \"http://localhost/html/\"\ngoogle_url = \"http://localhost/cse\"\nmax_retries = 1\nretry_base_delay_ms = 10\nconcurrency = 2\n\n",
        );
        toml_text.push_str(
            "[fetching]\ntimeout_secs = 5\nretry_attempts = 1\nmax_content_words = 100\nmin_content_chars = 10\nmax_body_bytes = 1000000\nconcurrency = 2\nuser_agent = \"test\"\n\n",
        );
        toml_text.push_str(
            "[agent]\nmin_subqueries = 2\nmax_subqueries = 4\nfacts_per_source = 3\nmax_source_chars = 5000\nextraction_concurrency = 1\n\n",
        );
        toml_text.push_str(
            "[output]\nreport_dir = \"./out\"\nsave_intermediate = true\nexport_json = false\n\n",
        );
        toml_text.push_str("[logging]\nlevel = \"debug\"\nconsole = true\n");
        fs::write(&path, toml_text).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Groq);
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk_file"));
        assert_eq!(config.search.max_results_per_query, 4);
        assert_eq!(config.agent.max_subqueries, 4);
        assert!(config.output.save_intermediate);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "[agent]\nmax_subqueries = 4\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.agent.max_subqueries, 4);
        assert_eq!(config.agent.min_subqueries, 3);
        assert_eq!(config.search.providers, vec!["duckduckgo", "google"]);
    }

    #[test]
    fn test_resolved_base_url_trims_slash() {
        let mut config = Config::default_config();
        config.llm.base_url = Some("http://127.0.0.1:9000/".to_string());
        assert_eq!(config.llm.resolved_base_url(), "http://127.0.0.1:9000");
        config.llm.base_url = None;
        assert_eq!(config.llm.resolved_base_url(), "https://api.anthropic.com");
    }
}
