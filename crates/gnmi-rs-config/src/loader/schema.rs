//! Schema validation helpers for gnmi-rs JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Check a config layer (or the merged config) for unknown keys and wrong types.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    let allowed = ["$schema", "schema_path", "data_path", "get"];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    for key in ["$schema", "schema_path", "data_path"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, key)?;
        }
    }
    if let Some(value) = map.get("get") {
        validate_get(value, layer, "get")?;
    }
    Ok(())
}

/// Validate the "get" block.
fn validate_get(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["max_paths", "default_timeout_ms"], layer, path)?;

    if let Some(value) = map.get("max_paths") {
        expect_u64(value, layer, &join_path(path, "max_paths"))?;
    }
    if let Some(value) = map.get("default_timeout_ms") {
        if !value.is_null() {
            expect_u64(value, layer, &join_path(path, "default_timeout_ms"))?;
        }
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a non-negative JSON integer or return a typed error.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
