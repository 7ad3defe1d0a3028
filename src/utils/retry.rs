// file: src/utils/retry.rs
// description: bounded exponential backoff around fallible async operations
// reference: shared by search providers, page fetching and llm clients

use crate::error::{ResearchError, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    pub fn from_millis(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self::new(max_attempts, Duration::from_millis(base_delay_ms))
    }

    /// Delay before retry number `attempt` (0-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `operation` up to `policy.max_attempts` times.
///
/// Only transient errors (timeouts, rate limits, 5xx, connection failures)
/// are retried; any other error is returned immediately. After the last
/// attempt the final error is returned. A server-provided `retry_after`
/// replaces the computed delay when it is larger.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_inner(policy, operation_name, None, operation).await
}

/// Same as [`retry_with_backoff`], but stops with `ResearchError::Cancelled`
/// once `cancel` fires: no further attempt starts and a pending backoff
/// sleep is cut short.
pub async fn retry_cancellable<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_inner(policy, operation_name, Some(cancel), operation).await
}

async fn retry_inner<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    cancel: Option<&CancellationToken>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!("{} cancelled before attempt {}", operation_name, attempt + 1);
            return Err(ResearchError::Cancelled);
        }

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt + 1 < policy.max_attempts => {
                let mut delay = policy.delay_for(attempt);
                if let ResearchError::RateLimited {
                    retry_after: Some(secs),
                    ..
                } = &err
                {
                    delay = delay.max(Duration::from_secs(*secs)).min(policy.max_delay);
                }

                warn!(
                    "{} attempt {}/{} failed: {}. Retrying in {:?}",
                    operation_name,
                    attempt + 1,
                    policy.max_attempts,
                    err,
                    delay
                );

                match cancel {
                    Some(token) => {
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => return Err(ResearchError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    None => tokio::time::sleep(delay).await,
                }
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    warn!(
                        "{} failed after {} attempts: {}",
                        operation_name,
                        attempt + 1,
                        err
                    );
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(&fast_policy(3), "flaky", || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ResearchError::Timeout {
                        service: "test".to_string(),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error_when_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = retry_with_backoff(&fast_policy(2), "down", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ResearchError::Upstream {
                    service: "test".to_string(),
                    status: 503,
                    message: "unavailable".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ResearchError::Upstream { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_transient_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = retry_with_backoff(&fast_policy(5), "auth", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ResearchError::Auth {
                    service: "test".to_string(),
                    message: "invalid key".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ResearchError::Auth { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_further_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let result: Result<()> = retry_cancellable(&fast_policy(5), "stopped", &cancel, || {
            let counter = counter.clone();
            let trigger = trigger.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                trigger.cancel();
                Err(ResearchError::Timeout {
                    service: "test".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ResearchError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_backoff_sleep() {
        let policy = RetryPolicy::new(3, Duration::from_secs(30));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result: Result<()> = retry_cancellable(&policy, "slow", &cancel, || async {
            Err(ResearchError::Timeout {
                service: "test".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ResearchError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
