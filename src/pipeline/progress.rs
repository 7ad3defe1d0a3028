// file: src/pipeline/progress.rs
// description: run stage tracking, terminal progress display and run statistics
// reference: uses indicatif for progress bars and tracks per-run counters

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Linear state machine of a research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Decomposing,
    Searching,
    Fetching,
    Extracting,
    Synthesizing,
    Rendered,
    Failed,
}

impl RunStage {
    pub const TOTAL_STEPS: usize = 6;

    /// 1-based position in the happy path; `Failed` has none.
    pub fn step(&self) -> Option<usize> {
        match self {
            RunStage::Decomposing => Some(1),
            RunStage::Searching => Some(2),
            RunStage::Fetching => Some(3),
            RunStage::Extracting => Some(4),
            RunStage::Synthesizing => Some(5),
            RunStage::Rendered => Some(6),
            RunStage::Failed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunStage::Decomposing => "Breaking down question",
            RunStage::Searching => "Searching the web",
            RunStage::Fetching => "Fetching sources",
            RunStage::Extracting => "Extracting facts",
            RunStage::Synthesizing => "Synthesizing findings",
            RunStage::Rendered => "Report ready",
            RunStage::Failed => "Failed",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub sub_queries: usize,
    pub search_results: usize,
    pub sources_fetched: usize,
    pub fetch_failures: usize,
    pub facts_extracted: usize,
    pub facts_discarded: usize,
    pub duration_secs: f64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_success_rate(&self) -> f64 {
        let total = self.sources_fetched + self.fetch_failures;
        if total == 0 {
            return 0.0;
        }
        (self.sources_fetched as f64 / total as f64) * 100.0
    }

    pub fn facts_per_source(&self) -> f64 {
        if self.sources_fetched == 0 {
            return 0.0;
        }
        self.facts_extracted as f64 / self.sources_fetched as f64
    }
}

pub struct ProgressTracker {
    stage_bar: ProgressBar,
    detail_bar: ProgressBar,
    sub_queries: AtomicUsize,
    search_results: AtomicUsize,
    sources_fetched: AtomicUsize,
    fetch_failures: AtomicUsize,
    facts_extracted: AtomicUsize,
    facts_discarded: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(colored: bool) -> Self {
        Self::build(MultiProgress::new(), colored)
    }

    /// Counts everything but draws nothing; used under `--quiet` and in tests.
    pub fn hidden() -> Self {
        Self::build(
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            false,
        )
    }

    fn build(multi_progress: MultiProgress, colored: bool) -> Self {
        let stage_bar = create_stage_bar(&multi_progress, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            stage_bar,
            detail_bar,
            sub_queries: AtomicUsize::new(0),
            search_results: AtomicUsize::new(0),
            sources_fetched: AtomicUsize::new(0),
            fetch_failures: AtomicUsize::new(0),
            facts_extracted: AtomicUsize::new(0),
            facts_discarded: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn enter_stage(&self, stage: RunStage) {
        if let Some(step) = stage.step() {
            self.stage_bar.set_position(step as u64);
        }
        self.stage_bar.set_message(stage.label());
    }

    pub fn set_sub_queries(&self, count: usize) {
        self.sub_queries.store(count, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn set_search_results(&self, count: usize) {
        self.search_results.store(count, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn inc_fetched(&self) {
        self.sources_fetched.fetch_add(1, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn inc_fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn add_facts(&self, count: usize) {
        self.facts_extracted.fetch_add(count, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn add_discarded_facts(&self, count: usize) {
        self.facts_discarded.fetch_add(count, Ordering::SeqCst);
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn fail(&self, stage: RunStage) {
        self.stage_bar
            .abandon_with_message(format!("{} at: {}", RunStage::Failed, stage.label()));
        self.detail_bar.finish_and_clear();
    }

    pub fn finish(&self) {
        if !self.stage_bar.is_finished() {
            self.stage_bar.finish_with_message(RunStage::Rendered.label());
        }
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> RunStats {
        RunStats {
            sub_queries: self.sub_queries.load(Ordering::SeqCst),
            search_results: self.search_results.load(Ordering::SeqCst),
            sources_fetched: self.sources_fetched.load(Ordering::SeqCst),
            fetch_failures: self.fetch_failures.load(Ordering::SeqCst),
            facts_extracted: self.facts_extracted.load(Ordering::SeqCst),
            facts_discarded: self.facts_discarded.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Queries: {} | Results: {} | Fetched: {} | Failed: {} | Facts: {}",
            self.sub_queries.load(Ordering::SeqCst),
            self.search_results.load(Ordering::SeqCst),
            self.sources_fetched.load(Ordering::SeqCst),
            self.fetch_failures.load(Ordering::SeqCst),
            self.facts_extracted.load(Ordering::SeqCst),
        );

        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.detail_bar.finish_and_clear();
    }
}

fn create_stage_bar(multi_progress: &MultiProgress, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(RunStage::TOTAL_STEPS as u64));
    let template = if colored {
        format!(
            "{{spinner:.green}} [{{elapsed_precise}}] {} {{pos}}/{{len}} {{msg}}",
            "Research".cyan().bold()
        )
    } else {
        "{spinner} [{elapsed_precise}] Research {pos}/{len} {msg}".to_string()
    };

    if let Ok(style) = ProgressStyle::default_spinner().template(&template) {
        bar.set_style(style);
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("  {msg}") {
        bar.set_style(style);
    }
    bar
}
