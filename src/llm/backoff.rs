// file: src/llm/backoff.rs
// description: exponential backoff with jitter for rate-limited API calls
// reference: https://docs.rs/tokio/latest/tokio/time/fn.sleep.html

use crate::config::SummarizationConfig;
use crate::error::{QaError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub base: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, base: Duration) -> Self {
        Self { max_retries, base }
    }

    pub fn from_config(config: &SummarizationConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.backoff_base_ms),
        )
    }

    /// `base * 2^attempt` plus a uniform jitter in `[0, base)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self.base.saturating_mul(1u32 << attempt.min(16));
        let jitter = self.base.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
        exponential.saturating_add(jitter)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

/// Runs `operation` until it succeeds, retrying only on rate-limit errors.
///
/// A fresh future is built for every attempt, so `operation` is a factory.
/// The error of the final attempt is returned once `max_retries` attempts
/// have been made.
pub async fn retry_with_exponential_backoff<T, F, Fut>(
    policy: &BackoffPolicy,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 0..policy.max_retries {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limit() => {
                if attempt + 1 == policy.max_retries {
                    return Err(err);
                }

                let mut wait = policy.delay_for(attempt);
                if let QaError::RateLimited {
                    retry_after_ms: Some(ms),
                } = err
                {
                    wait = wait.max(Duration::from_millis(ms));
                }

                warn!(
                    "Rate limit hit. Retrying in {:.2} seconds...",
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
            }
            Err(err) => return Err(err),
        }
    }

    Err(QaError::RetriesExhausted)
}
