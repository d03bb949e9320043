//! Generation gateway
//!
//! The gateway owns one provider chain per generation kind and exposes the
//! three public operations. Chains are fixed at construction: a provider
//! without a credential never joins one.

use crate::config::{ConfigError, ConfigValidator, GatewayConfig, ProviderDescriptor};
use crate::http::client::HttpClient;
use crate::http::HttpExecutor;
use crate::protocol::types::{GenerationKind, GenerationRequest, ImageInput, Prompt};
use crate::providers::routing::{ChainError, ChainLink, ChainResult, ProviderChain};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Entry point for structured text, image and vision generation
#[derive(Clone)]
pub struct Gateway {
    text: ProviderChain,
    image: ProviderChain,
    vision: ProviderChain,
    deadline: Option<Duration>,
}

impl Gateway {
    /// Build the gateway with a pooled HTTP client
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        ConfigValidator::new().validate(config)?;

        let connection = &config.connection;
        let http = HttpClient::with_config(
            connection.connect_timeout(),
            connection.request_timeout(),
            connection.max_idle_per_host,
        )
        .map_err(|message| ConfigError::HttpClient { message })?;

        Ok(Self::with_http(config, Arc::new(http)))
    }

    /// Build the gateway on top of an existing HTTP executor
    pub fn with_http(config: &GatewayConfig, http: Arc<dyn HttpExecutor>) -> Self {
        let descriptors = config.descriptors();
        let timeout = config.connection.request_timeout();

        let mut text = Vec::new();
        let mut image = Vec::new();
        let mut vision = Vec::new();

        for descriptor in &descriptors {
            let Some(settings) = descriptor.adapter_settings(timeout) else {
                warn!(
                    provider = %descriptor.name,
                    env = ?descriptor.provider_type.credential_env_vars(),
                    "no credential found; provider disabled"
                );
                continue;
            };

            let adapter = descriptor.provider_type.create_adapter(settings, http.clone());
            for kind in &descriptor.kinds {
                let links = match kind {
                    GenerationKind::Json => &mut text,
                    GenerationKind::Image => &mut image,
                    GenerationKind::VisionExtract => &mut vision,
                };
                links.push(ChainLink::new(adapter.clone(), descriptor.retry_policy.clone()));
            }
            log_enabled(descriptor);
        }

        Self::from_chains(
            ProviderChain::new(text),
            ProviderChain::new(image),
            ProviderChain::new(vision),
            config.request_timeout(),
        )
    }

    /// Assemble a gateway from prebuilt chains
    pub fn from_chains(
        text: ProviderChain,
        image: ProviderChain,
        vision: ProviderChain,
        deadline: Option<Duration>,
    ) -> Self {
        info!(
            text = ?text.providers(),
            image = ?image.providers(),
            vision = ?vision.providers(),
            "gateway chains ready"
        );
        Self {
            text,
            image,
            vision,
            deadline,
        }
    }

    /// Chain serving a generation kind
    pub fn chain(&self, kind: GenerationKind) -> &ProviderChain {
        match kind {
            GenerationKind::Json => &self.text,
            GenerationKind::Image => &self.image,
            GenerationKind::VisionExtract => &self.vision,
        }
    }

    /// Generate JSON for a prompt, annotated with an output schema
    pub async fn generate_json(
        &self,
        prompt: impl Into<Prompt>,
        schema: Value,
        cancel: &CancellationToken,
    ) -> ChainResult {
        self.generate(&GenerationRequest::json(prompt, schema), cancel).await
    }

    /// Generate an image; the output is a data URI or a remote URL
    pub async fn generate_image(&self, prompt: impl Into<Prompt>, cancel: &CancellationToken) -> ChainResult {
        self.generate(&GenerationRequest::image(prompt), cancel).await
    }

    /// Extract structured data from an image
    pub async fn extract_from_image(
        &self,
        image: ImageInput,
        instruction: impl Into<Prompt>,
        schema: Option<Value>,
        cancel: &CancellationToken,
    ) -> ChainResult {
        self.generate(&GenerationRequest::vision(image, instruction, schema), cancel)
            .await
    }

    /// Run a prepared request through the chain for its kind
    pub async fn generate(&self, request: &GenerationRequest, cancel: &CancellationToken) -> ChainResult {
        let chain = self.chain(request.kind());

        let Some(deadline) = self.deadline else {
            return chain.run(request, cancel).await;
        };

        // The child token lets the deadline stop in-flight work without
        // cancelling the caller's token.
        let scoped = cancel.child_token();
        match tokio::time::timeout(deadline, chain.run(request, &scoped)).await {
            Ok(result) => result,
            Err(_) => {
                scoped.cancel();
                warn!(kind = %request.kind(), ?deadline, "request deadline exceeded");
                Err(ChainError::DeadlineExceeded { deadline })
            }
        }
    }
}

fn log_enabled(descriptor: &ProviderDescriptor) {
    if let Some(credential) = &descriptor.credential {
        info!(
            provider = %descriptor.name,
            model = %descriptor.model,
            key = %credential.partial_redact(),
            "provider enabled"
        );
    }
}
