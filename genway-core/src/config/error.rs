//! Errors raised while loading and validating gateway configuration

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Syntax or shape error; positions are 1-based when known
    #[error("{}:{}:{}: {message}", .path.display(), .line.unwrap_or(0), .column.unwrap_or(0))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// A `${VAR}` outside a credential field names an unset variable
    #[error("environment variable '{var}' is not set")]
    MissingEnvVar { var: String },

    #[error("cannot build HTTP client: {message}")]
    HttpClient { message: String },
}

/// A rejected value, located by its field path
/// (e.g. `providers[1].retry_policy.max_attempts`)
#[derive(Debug, Error)]
#[error("invalid configuration at '{field_path}': {kind}{}", context_suffix(.context))]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
    pub context: Option<String>,
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("value is required")]
    Missing,

    #[error("{message}")]
    OutOfRange { message: String },

    #[error("malformed value: {message}")]
    Malformed { message: String },

    #[error("'{value}' is used more than once")]
    Duplicate { value: String },

    #[error("bad URL: {message}")]
    BadUrl { message: String },

    #[error("unsupported version '{found}', expected '{expected}'")]
    VersionMismatch { expected: String, found: String },
}

fn context_suffix(context: &Option<String>) -> String {
    context
        .as_ref()
        .map(|c| format!(" ({})", c))
        .unwrap_or_default()
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::Missing)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }

    pub fn malformed(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::Malformed {
                message: message.into(),
            },
        )
    }

    pub fn duplicate(field_path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::Duplicate { value: value.into() })
    }

    pub fn bad_url(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::BadUrl {
                message: message.into(),
            },
        )
    }
}
