// file: src/utils/telemetry.rs
// description: stage timing and configuration health checks
// reference: backs the doctor command and per-stage log lines

use crate::config::{Config, KNOWN_SEARCH_PROVIDERS};
use crate::utils::validation::Validator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn tag(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "ok",
            HealthStatus::Degraded => "warn",
            HealthStatus::Unhealthy => "fail",
        }
    }
}

/// One line of `doctor` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub detail: String,
}

impl HealthCheck {
    fn new(component: impl Into<String>, status: HealthStatus, detail: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status,
            detail: detail.into(),
        }
    }

    pub fn healthy(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Healthy, detail)
    }

    pub fn degraded(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Degraded, detail)
    }

    pub fn unhealthy(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Unhealthy, detail)
    }
}

/// Readiness of a configuration for a research run. No network calls are made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub checked_at: DateTime<Utc>,
    pub version: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, version: String) -> Self {
        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        Self {
            overall_status,
            checks,
            checked_at: Utc::now(),
            version,
        }
    }

    pub fn for_config(config: &Config) -> Self {
        let mut checks = vec![llm_check(config)];
        checks.extend(search_checks(config));

        checks.push(HealthCheck::healthy(
            "fetching",
            format!(
                "{} concurrent, {}s timeout, {} words per page",
                config.fetching.concurrency,
                config.fetching.timeout_secs,
                config.fetching.max_content_words
            ),
        ));

        let report_dir = config.output.report_dir.display().to_string();
        checks.push(match Validator::ensure_writable_directory(&config.output.report_dir) {
            Ok(()) => HealthCheck::healthy("reports", report_dir),
            Err(e) => HealthCheck::unhealthy("reports", e.to_string()),
        });

        Self::new(checks, env!("CARGO_PKG_VERSION").to_string())
    }

    pub fn format(&self) -> String {
        let width = self
            .checks
            .iter()
            .map(|c| c.component.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = format!(
            "research_assistant {} doctor ({})\n\n",
            self.version,
            self.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        for check in &self.checks {
            let tag = format!("[{}]", check.status.tag());
            let _ = writeln!(
                out,
                "  {:<6} {:<width$}  {}",
                tag,
                check.component,
                check.detail,
                width = width
            );
        }
        let _ = writeln!(out, "\nOverall: {:?}", self.overall_status);
        out
    }
}

fn llm_check(config: &Config) -> HealthCheck {
    match config.require_llm_key() {
        Ok(_) => HealthCheck::healthy(
            "llm",
            format!("{:?} {}", config.llm.provider, config.llm.model),
        ),
        Err(e) => HealthCheck::unhealthy("llm", e.to_string()),
    }
}

/// One check per configured provider plus one for the chain as a whole.
fn search_checks(config: &Config) -> Vec<HealthCheck> {
    let mut checks = Vec::new();
    let mut usable = 0;

    for provider in &config.search.providers {
        let component = format!("search/{}", provider);
        let check = match provider.to_lowercase().as_str() {
            "google" if !config.search.has_google_credentials() => HealthCheck::degraded(
                component,
                "google_api_key / google_cse_id not set, provider will be skipped",
            ),
            name if KNOWN_SEARCH_PROVIDERS.contains(&name) => {
                usable += 1;
                HealthCheck::healthy(component, "configured")
            }
            _ => HealthCheck::unhealthy(
                component,
                format!("unknown provider, expected one of {:?}", KNOWN_SEARCH_PROVIDERS),
            ),
        };
        checks.push(check);
    }

    if usable == 0 {
        checks.push(HealthCheck::unhealthy("search", "no usable provider"));
    }
    checks
}

/// Logs the duration of one pipeline stage.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        debug!("Stage {} started", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!("Stage {} done in {:.2}s", self.operation, elapsed.as_secs_f64());
        elapsed
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Stage {} done in {:.2}s ({} items)",
            self.operation,
            elapsed.as_secs_f64(),
            count
        );
        elapsed
    }

    pub fn warn_if_slow(&self, threshold: Duration, what: &str) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "Stage {} is slow: {} took {:.0}s (over {:.0}s)",
                self.operation,
                what,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}
