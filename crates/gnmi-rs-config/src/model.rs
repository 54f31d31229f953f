//! Configuration schema for the gnmi-rs server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root config for a gnmi-rs server process.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    /// Path to the schema bundle (modules, enums and node tree).
    #[serde(default)]
    pub schema_path: Option<String>,
    /// Path to the initial configuration document.
    #[serde(default)]
    pub data_path: Option<String>,
    #[serde(default)]
    pub get: GetConfig,
}

impl ServerConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Schema bundle location, if configured.
    pub fn schema_path(&self) -> Option<PathBuf> {
        self.schema_path.as_ref().map(PathBuf::from)
    }

    /// Initial data document location, if configured.
    pub fn data_path(&self) -> Option<PathBuf> {
        self.data_path.as_ref().map(PathBuf::from)
    }
}

/// Builder for assembling a `ServerConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Set the schema bundle location.
    pub fn schema_path(mut self, path: impl Into<String>) -> Self {
        self.config.schema_path = Some(path.into());
        self
    }

    /// Set the initial data document location.
    pub fn data_path(mut self, path: impl Into<String>) -> Self {
        self.config.data_path = Some(path.into());
        self
    }

    /// Replace the get handler configuration.
    pub fn get(mut self, get: GetConfig) -> Self {
        self.config.get = get;
        self
    }

    /// Finalize and return the built `ServerConfig`.
    pub fn build(self) -> ServerConfig {
        self.config
    }
}

/// Limits applied by the get handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetConfig {
    /// Maximum number of paths accepted in one request.
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
    /// Deadline applied to calls that do not carry one.
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,
}

impl GetConfig {
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for GetConfig {
    fn default() -> Self {
        Self {
            max_paths: default_max_paths(),
            default_timeout_ms: None,
        }
    }
}

fn default_max_paths() -> usize {
    16
}
