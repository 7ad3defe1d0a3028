// file: src/search/duckduckgo.rs
// description: DuckDuckGo html endpoint search, no api key required
// reference: https://html.duckduckgo.com/html/

use super::SearchProvider;
use crate::config::SearchConfig;
use crate::error::{ResearchError, Result};
use crate::models::SearchHit;
use async_trait::async_trait;
use lazy_static::lazy_static;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

const SERVICE: &str = "duckduckgo";

lazy_static! {
    static ref RESULT: Selector = Selector::parse("div.result").expect("static selector");
    static ref RESULT_LINK: Selector = Selector::parse("a.result__a").expect("static selector");
    static ref RESULT_SNIPPET: Selector =
        Selector::parse(".result__snippet").expect("static selector");
}

pub struct DuckDuckGoProvider {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoProvider {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ResearchError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.duckduckgo_url.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        debug!("Searching DuckDuckGo for: '{}' (max_results={})", query, max_results);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("kp", "-1")])
            .send()
            .await
            .map_err(|e| ResearchError::from_reqwest(SERVICE, e))?;

        // The html endpoint answers 202 with a challenge page when throttling.
        if response.status() == StatusCode::ACCEPTED {
            return Err(ResearchError::RateLimited {
                service: SERVICE.to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            return Err(ResearchError::from_response(SERVICE, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResearchError::from_reqwest(SERVICE, e))?;

        let hits = parse_results(&body, max_results);
        debug!("Found {} results for '{}'", hits.len(), query);
        Ok(hits)
    }
}

fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT)
        .filter(|result| {
            !result
                .value()
                .classes()
                .any(|class| class == "result--ad")
        })
        .filter_map(|result| {
            let link = result.select(&RESULT_LINK).next()?;
            let url = decode_result_link(link.value().attr("href")?)?;
            let title = collapse(&link.text().collect::<String>());
            let snippet = result
                .select(&RESULT_SNIPPET)
                .next()
                .map(|s| collapse(&s.text().collect::<String>()))
                .unwrap_or_default();

            Some(SearchHit {
                url,
                title,
                snippet,
            })
        })
        .take(max_results)
        .collect()
}

/// Result links are usually redirects of the form `//duckduckgo.com/l/?uddg=<target>`.
fn decode_result_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;

    if parsed.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) {
        if parsed.path() == "/y.js" {
            return None;
        }
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned());
    }

    Some(parsed.to_string())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
