//! Error types for server config loading.

use thiserror::Error;

/// Errors returned while loading or validating a server config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config layer could not be read from disk.
    #[error("failed to read {label}: {source}")]
    ReadFailed {
        label: String,
        #[source]
        source: std::io::Error,
    },
    /// A config layer is not valid JSON5.
    #[error("failed to parse {label}: {source}")]
    ParseFailed {
        label: String,
        #[source]
        source: json5::Error,
    },
    /// The merged document does not fit `ServerConfig`.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A field has an unknown name or the wrong type.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// A limit or cross-field rule does not hold.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn read(label: impl Into<String>, source: std::io::Error) -> Self {
        ConfigError::ReadFailed {
            label: label.into(),
            source,
        }
    }

    pub(crate) fn parse(label: impl Into<String>, source: json5::Error) -> Self {
        ConfigError::ParseFailed {
            label: label.into(),
            source,
        }
    }
}
