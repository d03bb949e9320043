//! Configuration module for the gateway
//!
//! Configuration is an explicit value handed to `Gateway::from_config`. It can
//! be built in code, read from the environment (`GatewayConfig::from_env`), or
//! loaded from a YAML or JSON file.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{interpolate_env_vars, resolve_credential};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    validate_retry_policy, ConnectionConfig, GatewayConfig, PollingConfig, ProviderConfig,
    ProviderDescriptor, CONFIG_VERSION,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    let content = read(path)?;

    let mut config: GatewayConfig =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    finish(&mut config)?;
    Ok(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    let content = read(path)?;

    let mut config: GatewayConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    finish(&mut config)?;
    Ok(config)
}

fn read(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn finish(config: &mut GatewayConfig) -> ConfigResult<()> {
    env::interpolate_config_env_vars(config)?;
    ConfigValidator::new().validate(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderType;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
version: "0.1"
request_timeout_ms: 90000
providers:
  - name: qwen
    type: qwen
    api_key: ${QWEN_API_KEY}
  - name: deepseek
    type: deepseek
    base_url: https://api.deepseek.com
    retry_policy:
      max_attempts: 1
  - name: vl
    type: qwen-vl
    enabled: false
"#;
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.providers[2].provider_type, ProviderType::QwenVl);
        assert_eq!(config.descriptors().len(), 2);
        assert!(ConfigValidator::new().validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "version: \"0.1\"\nrouting: {}\n";
        assert!(serde_yaml::from_str::<GatewayConfig>(yaml).is_err());
    }
}
