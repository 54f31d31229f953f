//! Error types for the gnmi-rs core crate.

use thiserror::Error;

/// Errors returned while resolving and encoding a request.
///
/// Every variant carries a human-readable detail. The request handlers are
/// the only place these are turned into wire status codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GnmiError {
    /// A segment, key tuple or terminal leaf has no value.
    #[error("path not found: {0}")]
    PathNotFound(String),
    /// The address cannot be applied to the schema.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// A request field was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The requested encoding cannot be produced.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    /// A schema or state invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
    /// The caller canceled the call.
    #[error("call canceled")]
    Canceled,
    /// The call deadline expired before completion.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Errors raised while loading or validating a schema bundle.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Reading the schema bundle failed.
    #[error("failed to read schema: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing the schema bundle failed.
    #[error("failed to parse schema: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The schema bundle has the wrong shape.
    #[error("failed to decode schema: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A schema invariant does not hold.
    #[error("invalid schema at {path}: {message}")]
    Invalid { path: String, message: String },
}

impl SchemaError {
    pub(crate) fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::Invalid {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors raised when a configuration document does not conform to the schema.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Reading a document failed.
    #[error("failed to read document: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// The document is not valid JSON.
    #[error("failed to parse document: {0}")]
    ParseFailed(#[from] serde_json::Error),
    /// A member has no counterpart in the schema.
    #[error("unknown field at {path}")]
    UnknownField { path: String },
    /// Two members name the same child, for example with and without a module prefix.
    #[error("field at {path} appears more than once")]
    DuplicateField { path: String },
    /// A value has the wrong shape or type.
    #[error("invalid value at {path}: {message}")]
    InvalidValue { path: String, message: String },
    /// A list element lacks one of its declared keys.
    #[error("list element at {path} is missing key {key:?}")]
    MissingKey { path: String, key: String },
    /// Two list elements share the same key tuple.
    #[error("duplicate list key at {path}: {key}")]
    DuplicateKey { path: String, key: String },
    /// An enum value is not defined for its leaf.
    #[error("unknown enum value at {path}: {value}")]
    UnknownEnum { path: String, value: String },
}

impl TreeError {
    pub(crate) fn invalid(path: &str, message: impl Into<String>) -> Self {
        TreeError::InvalidValue {
            path: display_path(path),
            message: message.into(),
        }
    }
}

/// Errors raised while assembling a server at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// No schema bundle location was configured.
    #[error("no schema bundle configured")]
    MissingSchema,
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Render an empty schema path as the root marker.
pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
