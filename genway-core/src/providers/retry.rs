//! Retry policy and executor for transient provider failures
//!
//! A `RetryExecutor` wraps one provider's attempts in a bounded loop:
//! - transient errors (see `ProviderError::is_retryable`) are retried with
//!   exponential backoff until `max_attempts` is reached, then converted into
//!   `ProviderError::RetriesExhausted`, so no transient error leaves the loop
//! - fatal errors are returned immediately
//! - both the attempt and the backoff sleep race a `CancellationToken`

use crate::providers::error::{ProviderError, TransientKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between attempts (milliseconds)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after each failed attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Jitter factor (0.0 to 1.0) to randomize delays
    #[serde(default)]
    pub jitter_factor: f64,

    /// Whether a rate-limit `retry_after` hint overrides the computed delay
    #[serde(default)]
    pub respect_retry_after: bool,

    /// Transient error classes this policy retries
    #[serde(default = "TransientKind::all")]
    pub retry_on: Vec<TransientKind>,
}

fn default_max_attempts() -> u32 { 3 }
fn default_initial_delay() -> u64 { 2_000 }
fn default_max_delay() -> u64 { 60_000 }
fn default_backoff_multiplier() -> f64 { 2.0 }

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_factor: 0.0,
            respect_retry_after: false,
            retry_on: TransientKind::all(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and default backoff
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Policy for providers with flaky TLS: 3 attempts, 2s base, doubling
    pub fn tls_resilient() -> Self {
        Self::default()
    }

    /// Create a policy with a single attempt and no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Set the backoff base and multiplier
    pub fn with_backoff(mut self, initial_delay: Duration, multiplier: f64) -> Self {
        self.initial_delay_ms = initial_delay.as_millis() as u64;
        self.backoff_multiplier = multiplier;
        self
    }

    /// Restrict which transient classes are retried
    pub fn retrying_on(mut self, kinds: Vec<TransientKind>) -> Self {
        self.retry_on = kinds;
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// `initial_delay × multiplier^(attempt-1)`, capped at `max_delay_ms`.
    pub fn calculate_delay(&self, attempt: u32, error: &ProviderError) -> Duration {
        if self.respect_retry_after {
            if let Some(retry_after) = error.retry_after() {
                return retry_after;
            }
        }

        let exponent = attempt.saturating_sub(1) as i32;
        let base_delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let delay_with_jitter = if self.jitter_factor > 0.0 {
            let mut rng = rand::thread_rng();
            let jitter_range = capped_delay * self.jitter_factor;
            let jitter = rng.gen_range(-jitter_range..=jitter_range);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_millis(delay_with_jitter as u64)
    }

    /// Check if another attempt should follow the given failed attempt (1-based)
    pub fn should_retry(&self, error: &ProviderError, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        match error.transient_kind() {
            Some(kind) => self.retry_on.contains(&kind),
            None => false,
        }
    }
}

/// One iteration of the retry loop; logged, then dropped
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt index
    pub attempt: u32,

    /// Backoff waited before this attempt
    pub backoff: Duration,

    /// Error this attempt produced, if it failed
    pub error: Option<ProviderError>,
}

/// Result of a retry loop
#[derive(Debug, Clone)]
pub struct RetryResult<T> {
    /// The successful value, or the error that ended the loop
    pub result: Result<T, ProviderError>,

    /// Number of attempts made
    pub attempts: u32,

    /// Total time spent in backoff
    pub total_delay: Duration,
}

/// Executor for retry operations
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create a new retry executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The policy this executor applies
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic.
    ///
    /// `label` only names the operation in logs.
    pub async fn execute<F, T, Fut>(
        &self,
        label: &str,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut total_delay = Duration::ZERO;
        let mut backoff = Duration::ZERO;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                outcome = operation() => outcome,
            };

            let record = AttemptRecord {
                attempt,
                backoff,
                error: outcome.as_ref().err().cloned(),
            };
            debug!(provider = label, ?record, "attempt finished");

            let error = match outcome {
                Ok(value) => {
                    return RetryResult {
                        result: Ok(value),
                        attempts: attempt,
                        total_delay,
                    };
                }
                Err(error) => error,
            };

            if error.is_cancelled() || !error.is_retryable() {
                return RetryResult {
                    result: Err(error),
                    attempts: attempt,
                    total_delay,
                };
            }

            if !self.policy.should_retry(&error, attempt) {
                warn!(
                    provider = label,
                    attempts = attempt,
                    "retry budget exhausted: {}",
                    error
                );
                return RetryResult {
                    result: Err(ProviderError::RetriesExhausted {
                        attempts: attempt,
                        last_error: error.to_string(),
                    }),
                    attempts: attempt,
                    total_delay,
                };
            }

            backoff = self.policy.calculate_delay(attempt, &error);
            warn!(
                provider = label,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = backoff.as_millis() as u64,
                "transient failure, retrying: {}",
                error
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return RetryResult {
                        result: Err(ProviderError::Cancelled),
                        attempts: attempt,
                        total_delay,
                    };
                }
                _ = tokio::time::sleep(backoff) => {}
            }
            total_delay += backoff;
        }
    }
}
