//! Per-provider retry with bounded exponential backoff
//!
//! This is the inner layer of the orchestration: it retries one provider while
//! the error is retryable and the attempt budget lasts. Switching providers is
//! the orchestrator's job.

use super::error::{AttemptOutcome, ProviderError};
use crate::config::{AiConfig, BackoffConfig};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Retry budget and backoff constants
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: BackoffConfig,
    pub rate_limited: BackoffConfig,
    pub unavailable: BackoffConfig,
    pub max_jitter_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(ai: &AiConfig) -> Self {
        Self {
            max_attempts: ai.max_attempts.max(1),
            timeout: ai.timeout_backoff,
            rate_limited: ai.rate_limit_backoff,
            unavailable: ai.unavailable_backoff,
            max_jitter_ms: ai.max_jitter_ms,
        }
    }

    /// Backoff before the next attempt, or `None` if the error is not retryable.
    ///
    /// `min(base * 2^attempt + jitter, cap)`, with base/cap chosen by error class.
    pub fn delay(&self, err: &ProviderError, attempt: u32, jitter_ms: u64) -> Option<Duration> {
        let backoff = match err {
            ProviderError::Timeout(_) => self.timeout,
            ProviderError::RateLimited => self.rate_limited,
            ProviderError::ServiceUnavailable => self.unavailable,
            ProviderError::Transport { .. } | ProviderError::Configuration(_) => return None,
        };
        let exponential = backoff
            .base_ms
            .saturating_mul(1u64 << attempt.min(20))
            .saturating_add(jitter_ms);
        Some(Duration::from_millis(exponential.min(backoff.cap_ms)))
    }

    fn draw_jitter(&self) -> u64 {
        rand::thread_rng().gen_range(0..=self.max_jitter_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AiConfig::default())
    }
}

/// Record of one attempt inside [`with_retry`]
#[derive(Debug, Clone)]
pub struct AttemptLog {
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
    pub error: Option<ProviderError>,
}

/// Final result of a retried call plus every attempt made
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, ProviderError>,
    pub attempts: Vec<AttemptLog>,
}

/// Run `op` until it succeeds, fails non-retryably, or the budget runs out.
///
/// `op` receives the 1-based attempt number.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, provider: &str, mut op: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempts = Vec::new();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let started_at = Utc::now();
        let start = Instant::now();
        let result = op(attempt).await;
        let elapsed = start.elapsed();

        let outcome = match &result {
            Ok(_) => AttemptOutcome::Success,
            Err(e) => e.outcome(),
        };
        info!(
            provider,
            attempt,
            outcome = outcome.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Provider attempt finished"
        );
        metrics::counter!(
            "ai_provider_attempts_total",
            "provider" => provider.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!("ai_provider_attempt_duration_ms", "provider" => provider.to_string())
            .record(elapsed.as_millis() as f64);

        attempts.push(AttemptLog {
            attempt,
            started_at,
            elapsed,
            outcome,
            error: result.as_ref().err().cloned(),
        });

        let err = match result {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                }
            }
            Err(err) => err,
        };

        let delay = match policy.delay(&err, attempt, policy.draw_jitter()) {
            Some(delay) if attempt < policy.max_attempts => delay,
            _ => {
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                }
            }
        };

        warn!(
            provider,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Retrying provider after backoff"
        );
        tokio::time::sleep(delay).await;
    }
}
