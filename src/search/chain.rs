// file: src/search/chain.rs
// description: ordered provider fallback with per-provider retry
// reference: primary provider first, next provider on error or empty results

use super::{DuckDuckGoProvider, GoogleProvider, SearchProvider};
use crate::config::{KNOWN_SEARCH_PROVIDERS, SearchConfig};
use crate::error::{ResearchError, Result};
use crate::models::SearchResult;
use crate::utils::{RetryPolicy, retry_cancellable};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct SearchChain {
    providers: Vec<Box<dyn SearchProvider>>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl SearchChain {
    pub fn new(providers: Vec<Box<dyn SearchProvider>>, retry: RetryPolicy) -> Self {
        Self {
            providers,
            retry,
            cancel: CancellationToken::new(),
        }
    }

    /// Build the chain in the configured order. Google is left out when its
    /// credentials are missing; an empty chain is a configuration error.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let mut providers: Vec<Box<dyn SearchProvider>> = Vec::new();

        for name in &config.providers {
            match name.to_lowercase().as_str() {
                "duckduckgo" => providers.push(Box::new(DuckDuckGoProvider::new(config)?)),
                "google" if config.has_google_credentials() => {
                    providers.push(Box::new(GoogleProvider::new(config)?))
                }
                "google" => {
                    warn!("Google search configured without api key / cse id, skipping it")
                }
                other => {
                    return Err(ResearchError::Config(format!(
                        "Unknown search provider '{}' (expected one of {:?})",
                        other, KNOWN_SEARCH_PROVIDERS
                    )));
                }
            }
        }

        if providers.is_empty() {
            return Err(ResearchError::Config(
                "No usable search provider configured".to_string(),
            ));
        }

        let retry = RetryPolicy::from_millis(config.max_retries, config.retry_base_delay_ms);
        Ok(Self::new(providers, retry))
    }

    /// Share the run's token so retries and fallbacks stop once it fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Results for one sub-query from the first provider that yields any.
    /// Never fails: when every provider errors or comes back empty, or the
    /// run is cancelled, the result is an empty list.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        for provider in &self.providers {
            if self.cancel.is_cancelled() {
                debug!("Search for '{}' cancelled before {}", query, provider.name());
                return Vec::new();
            }

            let operation = format!("{} search", provider.name());
            let outcome = retry_cancellable(&self.retry, &operation, &self.cancel, || {
                provider.search(query, max_results)
            })
            .await;

            match outcome {
                Ok(hits) if !hits.is_empty() => {
                    info!(
                        "{} returned {} results for '{}'",
                        provider.name(),
                        hits.len(),
                        query
                    );
                    return hits
                        .into_iter()
                        .take(max_results)
                        .map(|hit| SearchResult::from_hit(hit, query))
                        .collect();
                }
                Ok(_) => {
                    debug!("{} returned no results for '{}'", provider.name(), query);
                }
                Err(ResearchError::Cancelled) => return Vec::new(),
                Err(e) => {
                    warn!("{} search failed for '{}': {}", provider.name(), query, e);
                }
            }
        }

        warn!("All search providers failed for '{}'", query);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::SearchHit;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    enum Behaviour {
        Hits(usize),
        Empty,
        Transient,
        Fatal,
        CancelThenTimeout(CancellationToken),
    }

    struct StubProvider {
        name: &'static str,
        behaviour: Behaviour,
        calls: Arc<AtomicU32>,
    }

    impl StubProvider {
        fn boxed(name: &'static str, behaviour: Behaviour) -> (Box<dyn SearchProvider>, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let provider = Self {
                name,
                behaviour,
                calls: calls.clone(),
            };
            (Box::new(provider), calls)
        }
    }

    #[async_trait]
    impl SearchProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Hits(n) => Ok((0..*n)
                    .map(|i| SearchHit {
                        url: format!("https://{}.test/{}", self.name, i),
                        title: format!("Result {}", i),
                        snippet: String::new(),
                    })
                    .collect()),
                Behaviour::Empty => Ok(Vec::new()),
                Behaviour::Transient => Err(ResearchError::Timeout {
                    service: self.name.to_string(),
                }),
                Behaviour::Fatal => Err(ResearchError::Auth {
                    service: self.name.to_string(),
                    message: "bad key".to_string(),
                }),
                Behaviour::CancelThenTimeout(cancel) => {
                    cancel.cancel();
                    Err(ResearchError::Timeout {
                        service: self.name.to_string(),
                    })
                }
            }
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_primary_results_stop_the_chain() {
        let (primary, _) = StubProvider::boxed("primary", Behaviour::Hits(8));
        let (fallback, fallback_calls) = StubProvider::boxed("fallback", Behaviour::Hits(3));
        let chain = SearchChain::new(vec![primary, fallback], policy());

        let results = chain.search("rust", 5).await;

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.source_query == "rust"));
        assert!(results[0].url.starts_with("https://primary.test"));
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_primary_falls_back() {
        let (primary, _) = StubProvider::boxed("primary", Behaviour::Empty);
        let (fallback, _) = StubProvider::boxed("fallback", Behaviour::Hits(2));
        let chain = SearchChain::new(vec![primary, fallback], policy());

        let results = chain.search("rust", 5).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].url.starts_with("https://fallback.test"));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_before_falling_back() {
        let (primary, primary_calls) = StubProvider::boxed("primary", Behaviour::Transient);
        let (fallback, _) = StubProvider::boxed("fallback", Behaviour::Hits(1));
        let chain = SearchChain::new(vec![primary, fallback], policy());

        let results = chain.search("rust", 5).await;
        assert_eq!(results.len(), 1);
        assert_eq!(primary_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_providers_failing_yields_empty() {
        let (primary, primary_calls) = StubProvider::boxed("primary", Behaviour::Fatal);
        let (fallback, _) = StubProvider::boxed("fallback", Behaviour::Empty);
        let chain = SearchChain::new(vec![primary, fallback], policy());

        assert!(chain.search("rust", 5).await.is_empty());
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_retries_and_fallback() {
        let cancel = CancellationToken::new();
        let (primary, primary_calls) =
            StubProvider::boxed("primary", Behaviour::CancelThenTimeout(cancel.clone()));
        let (fallback, fallback_calls) =
            StubProvider::boxed("fallback", Behaviour::CancelThenTimeout(cancel.clone()));
        let chain = SearchChain::new(
            vec![primary, fallback],
            RetryPolicy::new(3, Duration::from_millis(1)),
        )
        .with_cancellation(cancel.clone());

        assert!(chain.search("rust", 5).await.is_empty());
        assert!(cancel.is_cancelled());
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config_skips_google_without_credentials() {
        let mut config = Config::default_config().search;
        config.providers = vec!["duckduckgo".to_string(), "google".to_string()];
        config.google_api_key = None;

        let chain = SearchChain::from_config(&config).unwrap();
        assert_eq!(chain.provider_names(), vec!["duckduckgo"]);

        config.providers = vec!["google".to_string()];
        assert!(SearchChain::from_config(&config).is_err());

        config.providers = vec!["bing".to_string()];
        assert!(SearchChain::from_config(&config).is_err());
    }
}
