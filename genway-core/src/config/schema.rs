//! Configuration schema structures with serde support

use super::env::resolve_credential;
use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use crate::protocol::types::GenerationKind;
use crate::providers::adapter::{AdapterSettings, PollSettings, ProviderType};
use crate::providers::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Supported configuration schema version
pub const CONFIG_VERSION: &str = "0.1";

/// Root configuration structure for the gateway
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Providers in priority order; each chain keeps this order
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Shared HTTP client settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Overall deadline for one gateway call (milliseconds)
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

/// Generation provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Unique provider name
    pub name: String,

    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: ProviderType,

    /// API key; may be a `${VAR}` placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Variables consulted when `api_key` is unset (defaults per provider type)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_key_env: Vec<String>,

    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Retry policy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,

    /// Task polling override (asynchronous providers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollingConfig>,

    /// Whether this provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Task polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// Default value functions for serde
fn default_true() -> bool { true }
fn default_poll_interval() -> u64 { 2_000 }
fn default_max_polls() -> u32 { 15 }
fn default_connect_timeout() -> u64 { 10_000 }
fn default_request_timeout() -> u64 { 60_000 }
fn default_max_idle() -> usize { 10 }

/// A provider as the gateway sees it at startup; read-only thereafter
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub provider_type: ProviderType,

    /// Kinds this provider serves
    pub kinds: Vec<GenerationKind>,

    /// Resolved credential, if present
    pub credential: Option<SecretString>,

    pub retry_policy: RetryPolicy,
    pub base_url: String,
    pub model: String,
    pub poll: PollSettings,
}

impl ProviderDescriptor {
    /// Whether a credential was found for this provider
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Whether this provider serves the kind
    pub fn serves(&self, kind: GenerationKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Adapter settings, or `None` when the credential is absent
    pub fn adapter_settings(&self, timeout: Duration) -> Option<AdapterSettings> {
        let api_key = self.credential.clone()?;
        Some(AdapterSettings {
            name: self.name.clone(),
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            timeout,
            poll: self.poll,
        })
    }
}

impl ProviderConfig {
    /// Provider entry with the type's defaults
    pub fn for_type(provider_type: ProviderType) -> Self {
        Self {
            name: provider_type.default_name().to_string(),
            provider_type,
            api_key: None,
            api_key_env: Vec::new(),
            base_url: None,
            model: None,
            retry_policy: None,
            polling: None,
            enabled: true,
        }
    }

    /// Build the startup descriptor, resolving the credential
    pub fn descriptor(&self) -> ProviderDescriptor {
        let credential = if self.api_key_env.is_empty() {
            resolve_credential(self.api_key.as_ref(), self.provider_type.credential_env_vars())
        } else {
            resolve_credential(self.api_key.as_ref(), self.api_key_env.as_slice())
        };

        let poll = self
            .polling
            .as_ref()
            .map(|p| PollSettings {
                interval: Duration::from_millis(p.interval_ms),
                max_polls: p.max_polls,
            })
            .unwrap_or_default();

        ProviderDescriptor {
            name: self.name.clone(),
            provider_type: self.provider_type,
            kinds: self.provider_type.default_kinds(),
            credential,
            retry_policy: self
                .retry_policy
                .clone()
                .unwrap_or_else(|| self.provider_type.default_retry_policy()),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| self.provider_type.default_base_url().to_string()),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| self.provider_type.default_model().to_string()),
            poll,
        }
    }

    /// Validate provider configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.name", path)));
        }

        if let Some(base_url) = &self.base_url {
            let field = format!("{}.base_url", path);
            match url::Url::parse(base_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => {
                    return Err(ValidationError::bad_url(
                        field,
                        format!("scheme must be http or https, got {}", url.scheme()),
                    ));
                }
                Err(e) => return Err(ValidationError::bad_url(field, e.to_string())),
            }
        }

        if let Some(retry) = &self.retry_policy {
            validate_retry_policy(retry, &format!("{}.retry_policy", path))?;
        }

        if let Some(polling) = &self.polling {
            if polling.max_polls == 0 {
                return Err(ValidationError::out_of_range(
                    format!("{}.polling.max_polls", path),
                    "Must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

/// Validate retry policy bounds
pub fn validate_retry_policy(policy: &RetryPolicy, path: &str) -> Result<(), ValidationError> {
    if policy.max_attempts == 0 {
        return Err(ValidationError::out_of_range(
            format!("{}.max_attempts", path),
            "Must be at least 1",
        ));
    }

    if policy.backoff_multiplier < 1.0 {
        return Err(ValidationError::out_of_range(
            format!("{}.backoff_multiplier", path),
            "Must be at least 1.0",
        ));
    }

    if !(0.0..=1.0).contains(&policy.jitter_factor) {
        return Err(ValidationError::out_of_range(
            format!("{}.jitter_factor", path),
            "Must be between 0.0 and 1.0",
        ));
    }

    if policy.max_delay_ms < policy.initial_delay_ms {
        return Err(ValidationError::out_of_range(
            format!("{}.max_delay_ms", path),
            "Must be >= initial_delay_ms",
        ));
    }

    Ok(())
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            providers: Vec::new(),
            connection: ConnectionConfig::default(),
            request_timeout_ms: None,
        }
    }
}

impl GatewayConfig {
    /// Every provider with its default settings, credentials read from the
    /// environment: Qwen, DeepSeek, Gemini, Wanx, Qwen-VL.
    pub fn from_env() -> Self {
        Self {
            providers: ProviderType::all()
                .into_iter()
                .map(ProviderConfig::for_type)
                .collect(),
            ..Default::default()
        }
    }

    /// Overall deadline for one gateway call
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Startup descriptors for the enabled providers, in configured order
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.providers
            .iter()
            .filter(|p| p.enabled)
            .map(ProviderConfig::descriptor)
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::VersionMismatch {
                    expected: CONFIG_VERSION.to_string(),
                    found: self.version.clone(),
                },
            ));
        }

        let mut seen_names = HashSet::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if !seen_names.insert(provider.name.as_str()) {
                return Err(ValidationError::duplicate(
                    format!("providers[{}].name", i),
                    provider.name.as_str(),
                ));
            }

            provider.validate(&format!("providers[{}]", i))?;
        }

        if self.connection.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                "connection.request_timeout_ms",
                "Must be greater than 0",
            ));
        }

        if self.request_timeout_ms == Some(0) {
            return Err(ValidationError::out_of_range(
                "request_timeout_ms",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}
