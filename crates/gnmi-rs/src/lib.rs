//! Public SDK surface for gnmi-rs.
//!
//! This crate re-exports the core building blocks and provides small startup
//! helpers to keep server assembly consistent between the binary and
//! embedding applications.

/// Re-export for convenience.
pub use gnmi_rs_config as config;
pub use gnmi_rs_core as core;
/// Re-export for convenience.
pub use gnmi_rs_protocol as protocol;

use gnmi_rs_config::{ConfigError, LayeredConfigOptions, ServerConfig};
use log::debug;
use std::path::PathBuf;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Command-line overrides applied on top of the layered config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Extra config file applied as the highest-precedence layer.
    pub config: Option<PathBuf>,
    pub schema_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

/// Load the layered server config described by `options` and apply `overrides`.
pub fn load_server_config(
    mut options: LayeredConfigOptions,
    overrides: &ConfigOverrides,
) -> Result<ServerConfig, ConfigError> {
    if let Some(path) = &overrides.config {
        options = options.with_runtime_path(path);
    }
    let layered = ServerConfig::load_layered_with_options(options)?;
    debug!("layered config loaded (layers={})", layered.layers.len());

    let mut config = layered.config;
    if let Some(path) = &overrides.schema_path {
        config.schema_path = Some(path.to_string_lossy().into_owned());
    }
    if let Some(path) = &overrides.data_path {
        config.data_path = Some(path.to_string_lossy().into_owned());
    }
    config.validate()?;
    Ok(config)
}
