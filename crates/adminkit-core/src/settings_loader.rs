//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with [`AdminSettings::default`].
//! 2. Deep-merge a TOML file over the defaults.
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `ADMINKIT_DEBUG` | `debug` |
//! | `ADMINKIT_LOG_LEVEL` | `log_level` |
//! | `ADMINKIT_ADMIN_PATH` | `admin_path` |
//! | `ADMINKIT_DEFAULT_LOCALE` | `default_locale` |
//! | `ADMINKIT_REDIS_URL` | `redis_url` |
//! | `ADMINKIT_UPLOADS_DIR` | `uploads_dir` |
//! | `ADMINKIT_DATABASE_URL` | `database_url` |
//! | `ADMINKIT_MAX_UPLOAD_SIZE` | `max_upload_size` |
//!
//! ```rust,no_run
//! use adminkit_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("admin.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::AdminError;
use crate::settings::AdminSettings;

/// Loads settings from a TOML string. Missing keys keep their defaults.
pub fn from_toml_str(toml_str: &str) -> Result<AdminSettings, AdminError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| AdminError::Configuration(format!("Failed to parse TOML: {e}")))?;

    let json_value = toml_to_json(toml_value);
    let default_json = serde_json::to_value(AdminSettings::default()).map_err(|e| {
        AdminError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, json_value);
    serde_json::from_value(merged).map_err(|e| {
        AdminError::Configuration(format!("Failed to deserialize settings from TOML: {e}"))
    })
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<AdminSettings, AdminError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        AdminError::Configuration(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<AdminSettings, AdminError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Applies `ADMINKIT_*` environment variable overrides to the settings.
///
/// Unparseable numeric values are ignored.
pub fn apply_env_overrides(settings: &mut AdminSettings) {
    if let Ok(val) = std::env::var("ADMINKIT_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("ADMINKIT_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("ADMINKIT_ADMIN_PATH") {
        settings.admin_path = val;
    }

    if let Ok(val) = std::env::var("ADMINKIT_DEFAULT_LOCALE") {
        settings.default_locale = val;
    }

    if let Ok(val) = std::env::var("ADMINKIT_REDIS_URL") {
        settings.redis_url = Some(val).filter(|v| !v.is_empty());
    }

    if let Ok(val) = std::env::var("ADMINKIT_UPLOADS_DIR") {
        settings.uploads_dir = PathBuf::from(val);
    }

    if let Ok(val) = std::env::var("ADMINKIT_DATABASE_URL") {
        settings.database_url = val;
    }

    if let Ok(val) = std::env::var("ADMINKIT_MAX_UPLOAD_SIZE") {
        if let Ok(size) = val.parse::<u64>() {
            settings.max_upload_size = size;
        }
    }
}

// ============================================================
// Helpers
// ============================================================

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
