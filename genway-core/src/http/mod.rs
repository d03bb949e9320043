//! HTTP client module for making API requests to generation providers
//!
//! This module implements the HTTP layer shared by every transport adapter:
//! - Connection pooling and client management
//! - Error mapping into transient/fatal `ProviderError`s
//! - Request ID generation and correlation

pub mod client;
pub mod error;

use crate::providers::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Options for an HTTP request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Request timeout
    pub timeout: Duration,

    /// Extra headers (authentication, provider flags)
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout: Duration::from_secs(60),
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    /// Create new request options with a generated request ID
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add an `Authorization: Bearer` header
    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token))
    }
}

/// Trait for HTTP executors
///
/// Every call performs exactly one outbound request.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// POST a JSON body and decode a JSON response
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        options: RequestOptions,
    ) -> Result<Value, ProviderError>;

    /// GET a JSON response
    async fn get_json(&self, url: &str, options: RequestOptions) -> Result<Value, ProviderError>;
}
