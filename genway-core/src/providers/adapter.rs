//! Transport adapter trait and provider capabilities
//!
//! A transport adapter wraps one concrete provider's network call. Adapters
//! are built once at startup from a `ProviderDescriptor` and are shared
//! read-only by every request.

use crate::config::SecretString;
use crate::http::{HttpExecutor, RequestOptions};
use crate::protocol::types::{GenerationKind, GenerationRequest, RawOutput};
use crate::providers::error::{ProviderError, ProviderResult, TransientKind};
use crate::providers::retry::RetryPolicy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Core trait every transport adapter implements
///
/// `attempt` performs exactly one logical outbound call and never retries.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Provider name used in logs and failure records
    fn name(&self) -> &str;

    /// What this adapter can serve
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Perform one logical call for the request
    async fn attempt(&self, request: &GenerationRequest) -> ProviderResult<RawOutput>;
}

/// Generation kinds and request options an adapter supports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Kinds this adapter can serve
    pub kinds: Vec<GenerationKind>,

    /// Does the provider honour a JSON response format flag?
    pub supports_json_mode: bool,
}

impl ProviderCapabilities {
    /// Capabilities for the given kinds without JSON mode
    pub fn serving(kinds: Vec<GenerationKind>) -> Self {
        Self {
            kinds,
            supports_json_mode: false,
        }
    }

    /// Check whether a kind is served
    pub fn supports(&self, kind: GenerationKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Reject requests for kinds this adapter does not serve
    pub fn ensure_supported(&self, provider: &str, kind: GenerationKind) -> ProviderResult<()> {
        if self.supports(kind) {
            Ok(())
        } else {
            Err(ProviderError::UnsupportedKind {
                message: format!("{} cannot serve {} requests", provider, kind),
            })
        }
    }
}

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// DashScope Qwen text generation
    Qwen,
    /// DeepSeek chat completions (OpenAI-compatible)
    DeepSeek,
    /// Gemini image generation
    Gemini,
    /// DashScope Wanx asynchronous image synthesis
    Wanx,
    /// DashScope Qwen-VL multimodal extraction
    #[serde(rename = "qwen-vl")]
    QwenVl,
}

impl ProviderType {
    /// Every provider type, in default chain order
    pub fn all() -> [ProviderType; 5] {
        [
            ProviderType::Qwen,
            ProviderType::DeepSeek,
            ProviderType::Gemini,
            ProviderType::Wanx,
            ProviderType::QwenVl,
        ]
    }

    /// Default provider name
    pub fn default_name(&self) -> &'static str {
        match self {
            ProviderType::Qwen => "qwen",
            ProviderType::DeepSeek => "deepseek",
            ProviderType::Gemini => "gemini",
            ProviderType::Wanx => "wanx",
            ProviderType::QwenVl => "qwen-vl",
        }
    }

    /// Kinds this provider serves
    pub fn default_kinds(&self) -> Vec<GenerationKind> {
        match self {
            ProviderType::Qwen | ProviderType::DeepSeek => vec![GenerationKind::Json],
            ProviderType::Gemini | ProviderType::Wanx => vec![GenerationKind::Image],
            ProviderType::QwenVl => vec![GenerationKind::VisionExtract],
        }
    }

    /// Environment variables consulted for the credential, in order
    pub fn credential_env_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderType::Qwen | ProviderType::Wanx | ProviderType::QwenVl => {
                &["QWEN_API_KEY", "DASHSCOPE_API_KEY"]
            }
            ProviderType::DeepSeek => &["DEEPSEEK_API_KEY"],
            ProviderType::Gemini => &["GOOGLE_API_KEY"],
        }
    }

    /// Default API base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderType::Qwen | ProviderType::Wanx | ProviderType::QwenVl => {
                "https://dashscope.aliyuncs.com"
            }
            ProviderType::DeepSeek => "https://api.deepseek.com",
            ProviderType::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    /// Default model identifier
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Qwen => "qwen-plus",
            ProviderType::DeepSeek => "deepseek-chat",
            ProviderType::Gemini => "gemini-2.5-flash-image",
            ProviderType::Wanx => "wan2.5-t2i-preview",
            ProviderType::QwenVl => "qwen3-vl-plus",
        }
    }

    /// Retry policy used when the configuration does not set one
    pub fn default_retry_policy(&self) -> RetryPolicy {
        match self {
            ProviderType::Qwen => RetryPolicy::tls_resilient(),
            // Image synthesis and extraction only retry connection-level failures.
            ProviderType::Wanx | ProviderType::QwenVl => {
                RetryPolicy::tls_resilient().retrying_on(vec![TransientKind::Network])
            }
            ProviderType::DeepSeek | ProviderType::Gemini => RetryPolicy::no_retry(),
        }
    }

    /// Create an adapter instance for this type
    pub fn create_adapter(
        &self,
        settings: AdapterSettings,
        http: Arc<dyn HttpExecutor>,
    ) -> Arc<dyn TransportAdapter> {
        match self {
            ProviderType::Qwen => Arc::new(crate::providers::QwenTextAdapter::new(settings, http)),
            ProviderType::DeepSeek => Arc::new(crate::providers::DeepSeekAdapter::new(settings, http)),
            ProviderType::Gemini => Arc::new(crate::providers::GeminiImageAdapter::new(settings, http)),
            ProviderType::Wanx => Arc::new(crate::providers::WanxImageAdapter::new(settings, http)),
            ProviderType::QwenVl => Arc::new(crate::providers::QwenVlAdapter::new(settings, http)),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Task polling settings for asynchronous providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait between status checks
    pub interval: Duration,

    /// Maximum number of status checks
    pub max_polls: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_polls: 15,
        }
    }
}

/// Everything an adapter needs to reach its provider
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    /// Provider name
    pub name: String,

    /// Resolved credential
    pub api_key: SecretString,

    /// API base URL without trailing slash
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Task polling (asynchronous providers only)
    pub poll: PollSettings,
}

impl AdapterSettings {
    /// Settings with the provider type's defaults
    pub fn for_type(provider_type: ProviderType, api_key: impl Into<SecretString>) -> Self {
        Self {
            name: provider_type.default_name().to_string(),
            api_key: api_key.into(),
            base_url: provider_type.default_base_url().to_string(),
            model: provider_type.default_model().to_string(),
            timeout: Duration::from_secs(60),
            poll: PollSettings::default(),
        }
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override task polling
    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Join a path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Request options with the timeout and a bearer credential
    pub fn bearer_options(&self) -> RequestOptions {
        RequestOptions::new()
            .with_timeout(self.timeout)
            .with_bearer(self.api_key.expose_secret())
    }
}
