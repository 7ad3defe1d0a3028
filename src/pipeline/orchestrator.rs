// file: src/pipeline/orchestrator.rs
// description: drives a research run through decompose, search, fetch, extract, synthesize
// reference: stages run in sequence, items inside a stage run with bounded concurrency

use crate::analysis::{FactExtractor, QueryDecomposer, Synthesizer};
use crate::config::Config;
use crate::error::{ResearchError, Result};
use crate::exporter::{ReportWriter, SavedReport, markdown};
use crate::fetcher::{ContentFetcher, ContentSource};
use crate::llm::{self, LlmClient};
use crate::models::{ExtractedFact, FetchedDocument, ResearchReport, SearchResult, dedup_by_url};
use crate::pipeline::progress::{ProgressTracker, RunStage, RunStats};
use crate::search::SearchChain;
use crate::utils::{OperationTimer, Validator};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

const SLOW_STAGE: Duration = Duration::from_secs(90);

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub report: ResearchReport,
    pub markdown: String,
    pub documents: Vec<FetchedDocument>,
    pub stats: RunStats,
}

pub struct ResearchOrchestrator {
    config: Config,
    decomposer: QueryDecomposer,
    search: SearchChain,
    fetcher: Arc<dyn ContentSource>,
    extractor: FactExtractor,
    synthesizer: Synthesizer,
    writer: ReportWriter,
    cancel: CancellationToken,
    show_progress: bool,
    colored: bool,
}

impl ResearchOrchestrator {
    /// Wire the production collaborators from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let llm = llm::build_client(&config)?;
        let search = SearchChain::from_config(&config.search)?;
        let fetcher: Arc<dyn ContentSource> = Arc::new(ContentFetcher::new(&config.fetching)?);

        info!(
            "Using {} with model {} and search providers {:?}",
            llm.name(),
            config.llm.model,
            search.provider_names()
        );

        Ok(Self::with_components(config, llm, search, fetcher))
    }

    pub fn with_components(
        config: Config,
        llm: Arc<dyn LlmClient>,
        search: SearchChain,
        fetcher: Arc<dyn ContentSource>,
    ) -> Self {
        let cancel = CancellationToken::new();
        Self {
            decomposer: QueryDecomposer::new(llm.clone(), &config.agent),
            extractor: FactExtractor::new(llm.clone(), &config.agent),
            synthesizer: Synthesizer::new(llm, &config.llm),
            writer: ReportWriter::new(&config.output),
            search: search.with_cancellation(cancel.clone()),
            fetcher,
            config,
            cancel,
            show_progress: false,
            colored: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool, colored: bool) -> Self {
        self.show_progress = show_progress;
        self.colored = colored;
        self
    }

    /// Cancelling this token aborts the run before its next external call.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Research and persist: the report file is only written for a run
    /// that reached the Rendered stage.
    pub async fn run(&self, question: &str) -> Result<(ResearchOutcome, SavedReport)> {
        let outcome = self.research(question).await?;
        let saved = self
            .writer
            .save(&outcome.report, &outcome.markdown, &outcome.documents)?;
        Ok((outcome, saved))
    }

    /// Run every stage in memory and render the report without writing it.
    pub async fn research(&self, question: &str) -> Result<ResearchOutcome> {
        Validator::validate_question(question)?;
        let question = question.trim();

        let progress = if self.show_progress {
            ProgressTracker::new(self.colored)
        } else {
            ProgressTracker::hidden()
        };

        info!("Starting research: {}", question);
        let mut stage = RunStage::Decomposing;

        match self.run_stages(question, &progress, &mut stage).await {
            Ok((report, documents)) => {
                progress.enter_stage(RunStage::Rendered);
                let markdown = markdown::render(&report);
                progress.finish();

                let stats = progress.get_stats();
                log_final_stats(&stats);

                Ok(ResearchOutcome {
                    report,
                    markdown,
                    documents,
                    stats,
                })
            }
            Err(e) => {
                warn!("Research failed during '{}': {}", stage, e);
                progress.fail(stage);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        question: &str,
        progress: &ProgressTracker,
        stage: &mut RunStage,
    ) -> Result<(ResearchReport, Vec<FetchedDocument>)> {
        *stage = RunStage::Decomposing;
        progress.enter_stage(*stage);
        let timer = OperationTimer::new("decompose");
        let sub_queries = self.cancellable(self.decomposer.decompose(question)).await?;
        timer.finish_with_count(sub_queries.len());
        progress.set_sub_queries(sub_queries.len());

        *stage = RunStage::Searching;
        progress.enter_stage(*stage);
        let timer = OperationTimer::new("search");
        let results = self.search_all(&sub_queries).await?;
        timer.finish_with_count(results.len());
        progress.set_search_results(results.len());

        if results.is_empty() {
            return Err(ResearchError::NoSources);
        }

        *stage = RunStage::Fetching;
        progress.enter_stage(*stage);
        let timer = OperationTimer::new("fetch");
        let (sources, documents) = self.fetch_all(results, progress).await?;
        timer.warn_if_slow(SLOW_STAGE, "fetching sources");
        timer.finish_with_count(documents.len());

        if documents.is_empty() {
            return Err(ResearchError::NoSources);
        }

        *stage = RunStage::Extracting;
        progress.enter_stage(*stage);
        let timer = OperationTimer::new("extract");
        let facts = self.extract_all(question, &documents, progress).await?;
        timer.finish_with_count(facts.len());

        *stage = RunStage::Synthesizing;
        progress.enter_stage(*stage);
        let timer = OperationTimer::new("synthesize");
        let synthesis = self
            .cancellable(self.synthesizer.synthesize(question, &facts))
            .await??;
        timer.warn_if_slow(SLOW_STAGE, "synthesis call");
        timer.finish();

        let report = ResearchReport {
            id: Uuid::new_v4(),
            question: question.to_string(),
            sub_queries,
            sources,
            facts,
            synthesis,
            generated_at: Utc::now(),
        };

        Ok((report, documents))
    }

    /// Per-query results merged in sub-query order, deduplicated by URL.
    async fn search_all(&self, sub_queries: &[String]) -> Result<Vec<SearchResult>> {
        let cap = self.config.search.max_results_per_query;

        let per_query: Vec<Vec<SearchResult>> = stream::iter(sub_queries)
            .map(|query| async move {
                if self.cancel.is_cancelled() {
                    return Vec::new();
                }
                self.search.search(query, cap).await
            })
            .buffered(self.config.search.concurrency)
            .collect()
            .await;
        self.ensure_active()?;

        let total: usize = per_query.iter().map(Vec::len).sum();
        let merged = dedup_by_url(per_query.into_iter().flatten());
        info!(
            "Found {} unique results ({} before deduplication)",
            merged.len(),
            total
        );
        Ok(merged)
    }

    /// Fetch every result, keeping input order. Failures are logged and skipped.
    async fn fetch_all(
        &self,
        results: Vec<SearchResult>,
        progress: &ProgressTracker,
    ) -> Result<(Vec<SearchResult>, Vec<FetchedDocument>)> {
        let fetched: Vec<Option<(SearchResult, FetchedDocument)>> = stream::iter(results)
            .map(|result| async move {
                if self.cancel.is_cancelled() {
                    return None;
                }
                progress.set_message(format!("Fetching {}", result.url));
                match self.cancellable(self.fetcher.fetch(&result)).await {
                    Ok(Ok(document)) => {
                        progress.inc_fetched();
                        Some((result, document))
                    }
                    Ok(Err(e)) => {
                        progress.inc_fetch_failed();
                        warn!("Skipping {}: {}", result.url, e);
                        None
                    }
                    Err(_) => None,
                }
            })
            .buffered(self.config.fetching.concurrency)
            .collect()
            .await;
        self.ensure_active()?;

        Ok(fetched.into_iter().flatten().unzip())
    }

    /// Facts from every document in document order. Facts whose source is not
    /// one of the fetched documents are discarded.
    async fn extract_all(
        &self,
        question: &str,
        documents: &[FetchedDocument],
        progress: &ProgressTracker,
    ) -> Result<Vec<ExtractedFact>> {
        let per_document: Vec<Vec<ExtractedFact>> = stream::iter(documents)
            .map(|document| async move {
                self.cancellable(self.extractor.extract(question, document))
                    .await
                    .unwrap_or_default()
            })
            .buffered(self.config.agent.extraction_concurrency)
            .collect()
            .await;
        self.ensure_active()?;

        let fetched_urls: HashSet<&str> = documents.iter().map(|d| d.url.as_str()).collect();
        let (facts, discarded): (Vec<ExtractedFact>, Vec<ExtractedFact>) = per_document
            .into_iter()
            .flatten()
            .partition(|fact| fetched_urls.contains(fact.source_url.as_str()));

        if !discarded.is_empty() {
            warn!("Discarded {} facts with unknown source", discarded.len());
        }
        progress.add_facts(facts.len());
        progress.add_discarded_facts(discarded.len());
        info!("Extracted {} facts from {} sources", facts.len(), documents.len());

        Ok(facts)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ResearchError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve `future` unless the run is cancelled first.
    async fn cancellable<T>(&self, future: impl Future<Output = T>) -> Result<T> {
        self.ensure_active()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResearchError::Cancelled),
            output = future => Ok(output),
        }
    }
}

fn log_final_stats(stats: &RunStats) {
    info!("=== Research Run Summary ===");
    info!("Duration: {:.2} seconds", stats.duration_secs);
    info!("Sub-queries: {}", stats.sub_queries);
    info!("Search results: {}", stats.search_results);
    info!("Sources fetched: {}", stats.sources_fetched);
    info!("Fetch failures: {}", stats.fetch_failures);
    info!("Fetch success rate: {:.2}%", stats.fetch_success_rate());
    info!("Facts extracted: {}", stats.facts_extracted);
    info!("Facts per source: {:.2}", stats.facts_per_source());
    info!("============================");
}
