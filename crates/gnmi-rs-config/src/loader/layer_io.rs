//! Reading config layers from disk and locating the default layers.

use super::{
    ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LoadedLayer, schema,
};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read and parse a JSON5 file, labelling failures with `label`.
pub(super) fn read_json5(path: &Path, label: &str) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::read(label, err))?;
    json5::from_str(&contents).map_err(|err| ConfigError::parse(label, err))
}

/// Load a layer and check its keys against the config schema.
///
/// A missing file yields `None` unless the layer is `required`.
pub(super) fn load_layer(
    source: ConfigLayerSource,
    path: &Path,
    required: bool,
) -> Result<Option<LoadedLayer>, ConfigError> {
    let label = layer_label(source, path);
    if !required && !path.exists() {
        debug!("optional layer missing ({label})");
        return Ok(None);
    }

    debug!("loading config layer ({label})");
    let value = read_json5(path, &label)?;
    schema::validate_layer_schema(&value, &label)?;
    Ok(Some(LoadedLayer {
        meta: ConfigLayer {
            source,
            path: Some(path.to_path_buf()),
        },
        value,
    }))
}

fn layer_label(source: ConfigLayerSource, path: &Path) -> String {
    let name = match source {
        ConfigLayerSource::System => "system",
        ConfigLayerSource::User => "user",
        ConfigLayerSource::Cwd => "cwd",
        ConfigLayerSource::Runtime => "runtime",
    };
    format!("{name} layer {}", path.display())
}

/// Canonical form of `path` for de-duplicating layers; missing paths pass through.
pub(super) fn canonical(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(ConfigError::read(path.display().to_string(), err)),
    }
}

#[cfg(any(unix, windows))]
pub(super) fn default_system_config_path() -> Option<PathBuf> {
    Some(PathBuf::from(super::SYSTEM_CONFIG_PATH))
}

#[cfg(not(any(unix, windows)))]
pub(super) fn default_system_config_path() -> Option<PathBuf> {
    None
}

/// `~/.gnmi-rs/gnmi.json5`, when a home directory is known.
pub(super) fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}
