// file: src/fetcher/content.rs
// description: http retrieval of search result pages into clean documents
// reference: https://docs.rs/reqwest

use super::extract::HtmlExtractor;
use crate::config::FetchConfig;
use crate::error::{ResearchError, Result};
use crate::models::{FetchedDocument, SearchResult};
use crate::utils::{RetryPolicy, Validator, retry_with_backoff};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, header, redirect};
use tracing::debug;

const SERVICE: &str = "fetch";
const RETRY_BASE_DELAY_MS: u64 = 500;
const MAX_REDIRECTS: usize = 5;

/// Anything that can turn a search result into a fetched document.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, result: &SearchResult) -> Result<FetchedDocument>;
}

pub struct ContentFetcher {
    client: Client,
    extractor: HtmlExtractor,
    retry: RetryPolicy,
    max_body_bytes: usize,
    max_content_words: usize,
}

impl ContentFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ResearchError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            extractor: HtmlExtractor::new(config.min_content_chars),
            retry: RetryPolicy::from_millis(config.retry_attempts, RETRY_BASE_DELAY_MS),
            max_body_bytes: config.max_body_bytes,
            max_content_words: config.max_content_words,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn download(&self, url: &str) -> Result<String> {
        let mut response = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| ResearchError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ResearchError::from_response(SERVICE, response).await);
        }

        if let Some(content_type) = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            let lowered = content_type.to_lowercase();
            if !lowered.contains("text/html") && !lowered.contains("application/xhtml") {
                return Err(ResearchError::UnsupportedContent {
                    url: url.to_string(),
                    content_type: content_type.to_string(),
                });
            }
        }

        if response
            .content_length()
            .is_some_and(|len| len as usize > self.max_body_bytes)
        {
            return Err(self.oversized(url));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ResearchError::from_reqwest(SERVICE, e))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.oversized(url));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn oversized(&self, url: &str) -> ResearchError {
        ResearchError::Request {
            service: SERVICE.to_string(),
            message: format!("{} exceeds {} bytes", url, self.max_body_bytes),
        }
    }
}

#[async_trait]
impl ContentSource for ContentFetcher {
    async fn fetch(&self, result: &SearchResult) -> Result<FetchedDocument> {
        Validator::validate_url(&result.url)?;
        debug!("Fetching {}", result.url);

        let operation = format!("fetch {}", result.url);
        let html = retry_with_backoff(&self.retry, &operation, || self.download(&result.url)).await?;

        let page = self.extractor.extract(&html, &result.url)?;
        let text = Validator::truncate_words(&page.text, self.max_content_words);
        let title = page.title.unwrap_or_else(|| result.title.clone());

        let document = FetchedDocument::new(result.url.clone(), title, text, Utc::now());
        debug!(
            "Fetched {} ({} words)",
            document.url,
            document.word_count()
        );
        Ok(document)
    }
}
