// file: src/search/google.rs
// description: Google Custom Search JSON api provider
// reference: https://developers.google.com/custom-search/v1/reference/rest/v1/cse/list

use super::SearchProvider;
use crate::config::SearchConfig;
use crate::error::{ResearchError, Result};
use crate::models::SearchHit;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const SERVICE: &str = "google";

/// The API never returns more than 10 items per request.
const MAX_PER_REQUEST: usize = 10;

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

pub struct GoogleProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    cse_id: String,
}

impl GoogleProvider {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let (api_key, cse_id) = match (&config.google_api_key, &config.google_cse_id) {
            (Some(key), Some(cx)) if !key.is_empty() && !cx.is_empty() => {
                (key.clone(), cx.clone())
            }
            _ => {
                return Err(ResearchError::Config(
                    "Google API credentials missing: set search.google_api_key and search.google_cse_id"
                        .to_string(),
                ));
            }
        };

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ResearchError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.google_url.clone(),
            api_key,
            cse_id,
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleProvider {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let num = max_results.clamp(1, MAX_PER_REQUEST).to_string();
        debug!("Searching Google for: '{}' (max_results={})", query, num);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ResearchError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ResearchError::from_response(SERVICE, response).await);
        }

        let body: CseResponse = response.json().await.map_err(|e| {
            ResearchError::MalformedResponse(format!(
                "Failed to parse Google response: {}",
                e.without_url()
            ))
        })?;

        let hits: Vec<SearchHit> = body
            .items
            .into_iter()
            .filter(|item| !item.link.is_empty())
            .map(|item| SearchHit {
                url: item.link,
                title: item.title,
                snippet: item.snippet,
            })
            .take(max_results)
            .collect();

        debug!("Found {} results from Google for '{}'", hits.len(), query);
        Ok(hits)
    }
}
