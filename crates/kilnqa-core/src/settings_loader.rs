//! Settings loading from configuration files.
//!
//! Loads [`Settings`] from TOML or JSON and applies environment variable
//! overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (deep-merged over the defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `KILNQA_DEBUG` | `debug` |
//! | `KILNQA_LOG_LEVEL` | `log_level` |
//! | `KILNQA_DRAFT_PREFIX` | `drafts.key_prefix` |
//! | `KILNQA_DRAFT_DELAY_MS` | `drafts.quiescence_ms` |
//! | `KILNQA_DRAFT_BACKEND` | `drafts.backend` (`memory`, `file`, `disabled`) |
//! | `KILNQA_DRAFT_DIR` | `drafts.location` |
//! | `KILNQA_DRAFT_CAPACITY` | `drafts.capacity_bytes` (`0` or `none` = unbounded) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use kilnqa_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/kilnqa.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::QaError;
use crate::settings::{Settings, StorageBackend};

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, QaError> {
    // Deserialize into a generic value first, then merge over the serialized
    // defaults so partial tables keep the remaining defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| QaError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, QaError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, QaError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, QaError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| QaError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, QaError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `KILNQA_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Applies overrides using an arbitrary variable lookup.
///
/// Values that fail to parse are ignored and leave the setting unchanged.
pub fn apply_overrides_from<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("KILNQA_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("KILNQA_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("KILNQA_DRAFT_PREFIX") {
        settings.drafts.key_prefix = val;
    }

    if let Some(val) = lookup("KILNQA_DRAFT_DELAY_MS") {
        if let Ok(ms) = val.trim().parse::<u64>() {
            settings.drafts.quiescence_ms = ms;
        }
    }

    if let Some(val) = lookup("KILNQA_DRAFT_BACKEND") {
        match val.trim().to_lowercase().as_str() {
            "memory" => settings.drafts.backend = StorageBackend::Memory,
            "file" => settings.drafts.backend = StorageBackend::File,
            "disabled" => settings.drafts.backend = StorageBackend::Disabled,
            _ => {}
        }
    }

    if let Some(val) = lookup("KILNQA_DRAFT_DIR") {
        if !val.trim().is_empty() {
            settings.drafts.location = Some(PathBuf::from(val));
        }
    }

    if let Some(val) = lookup("KILNQA_DRAFT_CAPACITY") {
        let val = val.trim();
        if val == "0" || val.eq_ignore_ascii_case("none") {
            settings.drafts.capacity_bytes = None;
        } else if let Ok(bytes) = val.parse::<usize>() {
            settings.drafts.capacity_bytes = Some(bytes);
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, format: &str) -> Result<String, QaError> {
    std::fs::read_to_string(path).map_err(|e| {
        QaError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, QaError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        QaError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        QaError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

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
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
