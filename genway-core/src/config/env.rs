//! Environment variable interpolation and credential lookup

use super::error::ConfigError;
use super::schema::GatewayConfig;
use super::secrets::SecretString;
use regex::Regex;
use std::env;
use std::sync::OnceLock;

/// `${VAR}` placeholder pattern
pub(crate) fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid"))
}

/// Replace every `${VAR}` in `value`; a missing variable is an error
pub fn interpolate_env_vars(value: &str) -> Result<String, ConfigError> {
    let mut result = value.to_string();
    for cap in placeholder_pattern().captures_iter(value) {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(env_value) => result = result.replace(&cap[0], &env_value),
            Err(_) => {
                return Err(ConfigError::MissingEnvVar {
                    var: var_name.to_string(),
                })
            }
        }
    }
    Ok(result)
}

/// Interpolate the non-secret fields of a loaded configuration.
///
/// API keys are left untouched; they are resolved when descriptors are built
/// so that a missing key disables the provider instead of failing the load.
pub fn interpolate_config_env_vars(config: &mut GatewayConfig) -> Result<(), ConfigError> {
    for provider in &mut config.providers {
        if let Some(base_url) = &provider.base_url {
            provider.base_url = Some(interpolate_env_vars(base_url)?);
        }
        if let Some(model) = &provider.model {
            provider.model = Some(interpolate_env_vars(model)?);
        }
    }
    Ok(())
}

/// Resolve a provider credential.
///
/// An explicit `api_key` wins; placeholders in it are expanded and a missing
/// variable yields `None`. Without one, the first non-blank variable in
/// `env_vars` is used.
pub fn resolve_credential<S: AsRef<str>>(
    api_key: Option<&SecretString>,
    env_vars: &[S],
) -> Option<SecretString> {
    match api_key {
        Some(key) => key.expand(),
        None => env_vars
            .iter()
            .find_map(|var| env::var(var.as_ref()).ok().filter(|v| !v.trim().is_empty()))
            .map(SecretString::new),
    }
}
