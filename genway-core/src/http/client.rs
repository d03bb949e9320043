//! HTTP client implementation using reqwest

use crate::http::{HttpExecutor, RequestOptions};
use crate::providers::error::ProviderError;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Maximum response size (20MB; inline images are returned base64-encoded)
const MAX_RESPONSE_SIZE: usize = 20 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("genway/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, String> {
        Self::with_config(Duration::from_secs(10), Duration::from_secs(60), 10)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(
        connect_timeout: Duration,
        request_timeout: Duration,
        max_idle_per_host: usize,
    ) -> Result<Self, String> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client: Arc::new(client),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// Attach options shared by every request
    fn prepare(&self, builder: RequestBuilder, options: &RequestOptions) -> RequestBuilder {
        let mut builder = builder
            .timeout(options.timeout)
            .header("X-Request-ID", options.request_id.to_string());

        for (key, value) in &options.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder
    }

    /// Send a prepared request and decode its JSON body
    async fn send(&self, builder: RequestBuilder, url: &str, options: &RequestOptions) -> Result<Value, ProviderError> {
        let request_id = options.request_id;

        info!("Executing HTTP request to {} [request_id: {}]", url, request_id);

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Request timeout for {} [request_id: {}]", url, request_id);
                ProviderError::Timeout
            } else if e.is_connect() {
                error!("Connection error for {} [request_id: {}]: {}", url, request_id, e);
                ProviderError::network(format!("Connection failed: {} [request_id: {}]", e, request_id))
            } else {
                error!("Request error for {} [request_id: {}]: {}", url, request_id, e);
                ProviderError::network(format!("{} [request_id: {}]", e, request_id))
            }
        })?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.ok();

            warn!(
                "Request failed with status {} for {} [request_id: {}]",
                status, url, request_id
            );

            return Err(crate::http::error::map_http_error(status, Some(&headers), body, request_id));
        }

        self.check_content_length(response.content_length(), request_id)?;

        let response_text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::network(format!(
                    "Failed to read response body: {} [request_id: {}]",
                    e, request_id
                ))
            }
        })?;

        self.check_content_length(Some(response_text.len() as u64), request_id)?;

        if response_text.trim().is_empty() {
            return Err(ProviderError::empty(url));
        }

        let value: Value = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse response from {} [request_id: {}]: {}", url, request_id, e);
            ProviderError::parse(format!("Invalid response format: {} [request_id: {}]", e, request_id))
        })?;

        info!("Request completed successfully for {} [request_id: {}]", url, request_id);

        Ok(value)
    }

    /// Check response size to prevent OOM
    fn check_content_length(&self, length: Option<u64>, request_id: uuid::Uuid) -> Result<(), ProviderError> {
        if let Some(length) = length {
            if length as usize > self.max_response_size {
                return Err(ProviderError::ProviderStatus {
                    code: "RESPONSE_TOO_LARGE".to_string(),
                    message: format!(
                        "Response size {} exceeds maximum {} [request_id: {}]",
                        length, self.max_response_size, request_id
                    ),
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl HttpExecutor for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        options: RequestOptions,
    ) -> Result<Value, ProviderError> {
        let builder = self.prepare(self.client.post(url).json(body), &options);
        self.send(builder, url, &options).await
    }

    async fn get_json(&self, url: &str, options: RequestOptions) -> Result<Value, ProviderError> {
        let builder = self.prepare(self.client.get(url), &options);
        self.send(builder, url, &options).await
    }
}
