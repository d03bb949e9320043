//! Provider error types and classification
//!
//! Every failure an adapter, the retry controller or the normalizer can produce
//! is a `ProviderError`. Errors are split into two classes:
//! - transient: worth retrying against the same provider (`is_retryable`)
//! - fatal: ends that provider's turn in the chain

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Transient error classes a retry policy can opt into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientKind {
    /// Connection, TLS or body-transfer failure
    Network,
    /// Request or gateway timeout
    Timeout,
    /// Provider asked us to slow down (HTTP 429)
    RateLimit,
    /// Provider reported itself busy or overloaded (502/503/504/529)
    Overloaded,
}

impl TransientKind {
    /// Every transient class
    pub fn all() -> Vec<TransientKind> {
        vec![
            TransientKind::Network,
            TransientKind::Timeout,
            TransientKind::RateLimit,
            TransientKind::Overloaded,
        ]
    }
}

/// Errors that can occur when talking to a generation provider
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ProviderError {
    /// Network, TLS or connection failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Rate limit exceeded
    #[error("Rate limit exceeded{}", retry_after_suffix(.retry_after))]
    RateLimit { retry_after: Option<Duration> },

    /// Provider is busy or overloaded
    #[error("Provider overloaded ({status_code}): {message}")]
    Overloaded { status_code: u16, message: String },

    /// Credentials were rejected
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Provider rejected the request as malformed
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Provider answered with an explicit failure status
    #[error("Provider error [{code}]: {message}")]
    ProviderStatus { code: String, message: String },

    /// Provider answered successfully but with nothing usable
    #[error("Empty response from {provider}")]
    EmptyResponse { provider: String },

    /// Output could not be parsed as JSON
    #[error("Failed to parse output as JSON: {message}")]
    Parse { message: String },

    /// Output did not match the requested generation kind
    #[error("Unsupported output: {message}")]
    UnsupportedKind { message: String },

    /// Every allowed attempt failed with a transient error
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(", retry after {:?}", delay),
        None => String::new(),
    }
}

impl ProviderError {
    /// Transient class of this error, or `None` when it is fatal
    pub fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            Self::Network { .. } => Some(TransientKind::Network),
            Self::Timeout => Some(TransientKind::Timeout),
            Self::RateLimit { .. } => Some(TransientKind::RateLimit),
            Self::Overloaded { .. } => Some(TransientKind::Overloaded),
            _ => None,
        }
    }

    /// Determine if this error may succeed when the same provider is retried
    pub fn is_retryable(&self) -> bool {
        self.transient_kind().is_some()
    }

    /// Whether this error is a cancellation rather than a provider failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Delay the provider asked for, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Shorthand for a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Shorthand for an empty-response error
    pub fn empty(provider: impl Into<String>) -> Self {
        Self::EmptyResponse {
            provider: provider.into(),
        }
    }

    /// Shorthand for a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            match err.status() {
                Some(status) => ErrorMapper::from_status_code(status.as_u16(), Some(&err.to_string())),
                None => ProviderError::network(err.to_string()),
            }
        } else if err.is_decode() {
            ProviderError::parse(err.to_string())
        } else {
            // Request/body failures, including TLS handshakes cut short.
            ProviderError::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::parse(err.to_string())
    }
}

/// Maps HTTP statuses and provider error payloads onto `ProviderError`
pub struct ErrorMapper;

impl ErrorMapper {
    /// Map an HTTP status code to a provider error
    pub fn from_status_code(status: u16, body: Option<&str>) -> ProviderError {
        let message = body.unwrap_or("").to_string();
        match status {
            401 | 403 => ProviderError::Authentication {
                message: if message.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    message
                },
            },
            429 => ProviderError::RateLimit { retry_after: None },
            408 | 504 => ProviderError::Timeout,
            502 | 503 | 529 => ProviderError::Overloaded {
                status_code: status,
                message,
            },
            400 | 404 | 413 | 422 => ProviderError::InvalidRequest {
                message: if message.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    message
                },
            },
            _ => ProviderError::ProviderStatus {
                code: format!("HTTP_{}", status),
                message,
            },
        }
    }

    /// Map a provider-reported error code/message (e.g. DashScope `code`) to an error.
    ///
    /// Used when the HTTP status alone does not classify the failure.
    pub fn from_provider_code(code: &str, message: &str) -> ProviderError {
        let lower_code = code.to_lowercase();
        let lower_msg = message.to_lowercase();

        if lower_code.contains("throttl")
            || lower_code.contains("rate_limit")
            || lower_msg.contains("rate limit")
            || lower_msg.contains("too many requests")
        {
            return ProviderError::RateLimit { retry_after: None };
        }

        if lower_msg.contains("overloaded") || lower_msg.contains("server is busy") {
            return ProviderError::Overloaded {
                status_code: 503,
                message: message.to_string(),
            };
        }

        if lower_code.contains("invalidapikey")
            || lower_code.contains("invalid_api_key")
            || lower_msg.contains("unauthorized")
            || lower_msg.contains("invalid api-key")
        {
            return ProviderError::Authentication {
                message: message.to_string(),
            };
        }

        ProviderError::ProviderStatus {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Timeout.is_retryable());
        assert!(ProviderError::network("tls handshake eof").is_retryable());
        assert!(ProviderError::RateLimit { retry_after: None }.is_retryable());
        assert!(!ProviderError::parse("expected value").is_retryable());
        assert!(!ProviderError::empty("deepseek").is_retryable());
        assert!(!ProviderError::Cancelled.is_retryable());
        assert!(!ProviderError::RetriesExhausted {
            attempts: 3,
            last_error: "x".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_rate_limit_display() {
        let plain = ProviderError::RateLimit { retry_after: None };
        assert_eq!(plain.to_string(), "Rate limit exceeded");

        let hinted = ProviderError::RateLimit {
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(hinted.to_string(), "Rate limit exceeded, retry after 5s");
    }

    #[test]
    fn test_provider_code_patterns() {
        assert!(matches!(
            ErrorMapper::from_provider_code("Throttling.RateQuota", "Requests rate limit exceeded"),
            ProviderError::RateLimit { .. }
        ));
        assert!(matches!(
            ErrorMapper::from_provider_code("InvalidApiKey", "Invalid API-key provided."),
            ProviderError::Authentication { .. }
        ));
        assert!(matches!(
            ErrorMapper::from_provider_code("DataInspectionFailed", "Input data may contain inappropriate content."),
            ProviderError::ProviderStatus { .. }
        ));
    }
}
