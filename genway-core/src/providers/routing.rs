//! Provider chain orchestration
//!
//! A `ProviderChain` tries its providers strictly in order. Each provider runs
//! under its own retry policy; the first normalized output wins and any
//! failure hands over to the next provider without delay. Only when every
//! provider has failed does the chain report `ChainError::Exhausted`.

use crate::protocol::types::{GeneratedOutput, GenerationRequest};
use crate::providers::adapter::TransportAdapter;
use crate::providers::error::ProviderError;
use crate::providers::normalize::normalize;
use crate::providers::retry::{RetryExecutor, RetryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of one chain invocation
pub type ChainResult = Result<RoutingResult, ChainError>;

/// One provider's failed turn in the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Provider name
    pub provider: String,

    /// Attempts made against this provider
    pub attempts: u32,

    /// Fatal error that ended its turn
    pub error: ProviderError,
}

/// Errors a chain invocation can end with
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// Every provider failed; one record per provider in chain order
    #[error("all {} providers failed{}", .failures.len(), failure_list(.failures))]
    Exhausted { failures: Vec<ProviderFailure> },

    /// The caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// The gateway-level deadline elapsed
    #[error("request deadline of {deadline:?} exceeded")]
    DeadlineExceeded { deadline: Duration },
}

fn failure_list(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = failures
        .iter()
        .map(|f| format!("{} after {} attempt(s): {}", f.provider, f.attempts, f.error))
        .collect();
    format!(": {}", parts.join("; "))
}

impl ChainError {
    /// Whether the chain stopped because the caller gave up
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }

    /// Per-provider failures (empty unless exhausted)
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::Exhausted { failures } => failures,
            _ => &[],
        }
    }

    /// Diagnostic summary suitable for a service-unavailable response
    pub fn summary(&self) -> String {
        match self {
            Self::Exhausted { failures } if failures.is_empty() => {
                "no generation provider is configured".to_string()
            }
            Self::Exhausted { .. } => {
                "all configured generation providers failed or returned unusable output".to_string()
            }
            Self::Cancelled => "request cancelled".to_string(),
            Self::DeadlineExceeded { .. } => "request timed out".to_string(),
        }
    }
}

/// Result of a successful chain invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    /// The normalized output
    pub output: GeneratedOutput,

    /// Which provider produced it
    pub provider_used: String,

    /// Whether a provider other than the first produced it
    pub used_fallback: bool,

    /// Attempts made across all providers
    pub attempts: u32,

    /// Failures of the providers tried before the winner
    pub provider_errors: Vec<ProviderFailure>,

    /// Additional routing metadata
    pub metadata: HashMap<String, Value>,
}

/// An adapter paired with the retry policy it runs under
#[derive(Clone)]
pub struct ChainLink {
    adapter: Arc<dyn TransportAdapter>,
    executor: RetryExecutor,
}

impl ChainLink {
    /// Pair an adapter with a retry policy
    pub fn new(adapter: Arc<dyn TransportAdapter>, policy: RetryPolicy) -> Self {
        Self {
            adapter,
            executor: RetryExecutor::new(policy),
        }
    }

    /// Provider name
    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    /// Retry policy for this provider
    pub fn policy(&self) -> &RetryPolicy {
        self.executor.policy()
    }
}

/// Ordered, immutable list of providers for one generation kind
#[derive(Clone, Default)]
pub struct ProviderChain {
    links: Vec<ChainLink>,
}

impl ProviderChain {
    /// Create a chain from links in priority order
    pub fn new(links: Vec<ChainLink>) -> Self {
        Self { links }
    }

    /// Start building a chain
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Provider names in priority order
    pub fn providers(&self) -> Vec<String> {
        self.links.iter().map(|link| link.name().to_string()).collect()
    }

    /// Number of providers
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Check if the chain has no providers
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Run the request through the chain.
    ///
    /// Each provider is attempted at most once per invocation. Cancellation
    /// stops the chain at once and never advances to the next provider.
    pub async fn run(&self, request: &GenerationRequest, cancel: &CancellationToken) -> ChainResult {
        let kind = request.kind();
        let mut failures: Vec<ProviderFailure> = Vec::new();
        let mut total_attempts = 0;
        let mut total_delay = Duration::ZERO;

        for (index, link) in self.links.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ChainError::Cancelled);
            }

            let provider = link.name();
            info!(provider, position = index, kind = %kind, "attempting provider");

            let adapter = &link.adapter;
            let outcome = link
                .executor
                .execute(provider, cancel, || async move {
                    let raw = adapter.attempt(request).await?;
                    normalize(kind, raw, adapter.name())
                })
                .await;

            total_attempts += outcome.attempts;
            total_delay += outcome.total_delay;

            match outcome.result {
                Ok(output) => {
                    info!(provider, attempts = outcome.attempts, "provider succeeded");

                    let mut metadata = HashMap::new();
                    metadata.insert("primary_provider".to_string(), json!(self.links[0].name()));
                    metadata.insert("provider_index".to_string(), json!(index));
                    metadata.insert("retry_delay_ms".to_string(), json!(total_delay.as_millis() as u64));

                    return Ok(RoutingResult {
                        output,
                        provider_used: provider.to_string(),
                        used_fallback: index > 0,
                        attempts: total_attempts,
                        provider_errors: failures,
                        metadata,
                    });
                }
                Err(ProviderError::Cancelled) => {
                    warn!(provider, "request cancelled; chain stopped");
                    return Err(ChainError::Cancelled);
                }
                Err(error) => {
                    warn!(
                        provider,
                        attempts = outcome.attempts,
                        "provider failed, moving to next: {}",
                        error
                    );
                    failures.push(ProviderFailure {
                        provider: provider.to_string(),
                        attempts: outcome.attempts,
                        error,
                    });
                }
            }
        }

        warn!(kind = %kind, failed = failures.len(), "every provider in the chain failed");
        Err(ChainError::Exhausted { failures })
    }
}

/// Builder for provider chains
pub struct ChainBuilder {
    links: Vec<ChainLink>,
}

impl ChainBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Append a provider at the lowest priority so far
    pub fn provider(mut self, adapter: Arc<dyn TransportAdapter>, policy: RetryPolicy) -> Self {
        self.links.push(ChainLink::new(adapter, policy));
        self
    }

    /// Build the chain
    pub fn build(self) -> ProviderChain {
        ProviderChain::new(self.links)
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
