//! Configuration validation utilities

use super::env::placeholder_pattern;
use super::error::ValidationError;
use super::schema::GatewayConfig;

/// Configuration validator with rules beyond the schema's own checks
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        config.validate()?;

        self.validate_credentials(config)?;
        self.validate_retry_classes(config)?;

        Ok(())
    }

    /// Credential sources must be well-formed variable references
    fn validate_credentials(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        for (i, provider) in config.providers.iter().enumerate() {
            if let Some(api_key) = &provider.api_key {
                let raw = api_key.expose_secret();
                let stripped = placeholder_pattern().replace_all(raw, "");
                if stripped.contains("${") {
                    // Don't echo the key itself.
                    return Err(ValidationError::malformed(
                        format!("providers[{}].api_key", i),
                        "malformed ${VAR} placeholder",
                    ));
                }
            }

            for (j, var) in provider.api_key_env.iter().enumerate() {
                if !is_env_var_name(var) {
                    return Err(ValidationError::malformed(
                        format!("providers[{}].api_key_env[{}]", i, j),
                        format!("'{}' is not a valid environment variable name", var),
                    ));
                }
            }
        }

        Ok(())
    }

    /// A policy that allows retries must retry at least one error class
    fn validate_retry_classes(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        for (i, provider) in config.providers.iter().enumerate() {
            if let Some(policy) = &provider.retry_policy {
                if policy.max_attempts > 1 && policy.retry_on.is_empty() {
                    return Err(ValidationError::required(format!(
                        "providers[{}].retry_policy.retry_on",
                        i
                    ))
                    .with_context("max_attempts > 1 but no transient class is retried"));
                }
            }
        }

        Ok(())
    }

    /// Extract environment variables referenced by `${VAR}` placeholders
    pub fn extract_env_vars(&self, text: &str) -> Vec<String> {
        placeholder_pattern()
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}

fn is_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_uppercase() => {
            chars.all(|c| c == '_' || c.is_ascii_uppercase() || c.is_ascii_digit())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, SecretString};
    use crate::providers::{ProviderType, RetryPolicy};

    #[test]
    fn test_env_var_extraction() {
        let validator = ConfigValidator::new();
        let vars = validator.extract_env_vars("key: ${QWEN_API_KEY}, url: ${API_BASE_URL}");
        assert_eq!(vars, vec!["QWEN_API_KEY".to_string(), "API_BASE_URL".to_string()]);
    }

    #[test]
    fn test_malformed_placeholder_rejected() {
        let mut provider = ProviderConfig::for_type(ProviderType::Qwen);
        provider.api_key = Some(SecretString::new("${qwen key}"));
        let config = GatewayConfig {
            providers: vec![provider],
            ..Default::default()
        };
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert_eq!(err.field_path, "providers[0].api_key");
    }

    #[test]
    fn test_bad_env_name_rejected() {
        let mut provider = ProviderConfig::for_type(ProviderType::DeepSeek);
        provider.api_key_env = vec!["deepseek-key".to_string()];
        let config = GatewayConfig {
            providers: vec![provider],
            ..Default::default()
        };
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert_eq!(err.field_path, "providers[0].api_key_env[0]");
    }

    #[test]
    fn test_retry_without_classes_rejected() {
        let mut provider = ProviderConfig::for_type(ProviderType::Qwen);
        provider.retry_policy = Some(RetryPolicy::new(3).retrying_on(vec![]));
        let config = GatewayConfig {
            providers: vec![provider],
            ..Default::default()
        };
        assert!(ConfigValidator::new().validate(&config).is_err());
    }
}
