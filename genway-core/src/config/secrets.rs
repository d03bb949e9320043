//! Provider credentials
//!
//! A `SecretString` never prints its value through `Debug` or `Display`;
//! startup logs identify a key with `partial_redact` only.

use super::env::interpolate_env_vars;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys shorter than this are fully masked in logs
const MIN_REVEALING_LEN: usize = 12;

/// An API key, possibly still holding `${VAR}` placeholders
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for request headers only
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Blank keys count as absent
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Expand `${VAR}` placeholders; `None` if a variable is unset or the
    /// result is blank
    pub fn expand(&self) -> Option<SecretString> {
        interpolate_env_vars(&self.0)
            .ok()
            .map(SecretString)
            .filter(|key| !key.is_empty())
    }

    /// Vendor prefix (up to the first `-`) and the last four characters,
    /// e.g. `sk-****cdef`
    pub fn partial_redact(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() < MIN_REVEALING_LEN {
            return "****".to_string();
        }

        let prefix = match self.0.find('-') {
            Some(dash) if dash <= 4 => &self.0[..=dash],
            _ => "",
        };
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", prefix, tail)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(****)")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
