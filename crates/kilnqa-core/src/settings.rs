//! Settings for kilnqa.
//!
//! [`Settings`] holds logging configuration plus the two subsystem sections:
//! [`DraftSettings`] for draft persistence and [`ValidationSettings`] for the
//! domain rule bounds. Every field has a default, so a partial file only
//! needs to name what it changes (see [`crate::settings_loader`]).
//!
//! Settings are passed explicitly to the components that need them; there
//! is no global instance.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which durable store backs the drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on exit.
    Memory,
    /// One file per key under [`DraftSettings::location`].
    File,
    /// Storage switched off; every draft operation fails and is ignored.
    Disabled,
}

/// Draft persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSettings {
    /// Prefix prepended to a form's draft key to form the storage key.
    pub key_prefix: String,
    /// Quiescence delay in milliseconds before a flush fires.
    pub quiescence_ms: u64,
    /// The storage backend.
    pub backend: StorageBackend,
    /// Directory for the file backend.
    pub location: Option<PathBuf>,
    /// Capacity ceiling in bytes (keys plus values). `None` means unbounded.
    pub capacity_bytes: Option<usize>,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            key_prefix: "autosave_".to_string(),
            quiescence_ms: 1000,
            backend: StorageBackend::Memory,
            location: None,
            capacity_bytes: Some(5 * 1024 * 1024),
        }
    }
}

/// Bounds used by the standard field rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Lowest accepted quantity.
    pub quantity_min: f64,
    /// Lowest accepted kiln temperature in °C.
    pub kiln_min_celsius: f64,
    /// Highest accepted kiln temperature in °C.
    pub kiln_max_celsius: f64,
    /// Lowest accepted percentage or efficiency.
    pub percentage_min: f64,
    /// Highest accepted percentage or efficiency.
    pub percentage_max: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            quantity_min: 0.0,
            kiln_min_celsius: 800.0,
            kiln_max_celsius: 1400.0,
            percentage_min: 0.0,
            percentage_max: 100.0,
        }
    }
}

/// The complete set of kilnqa settings.
///
/// # Examples
///
/// ```
/// use kilnqa_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.drafts.quiescence_ms, 1000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level or filter directive (e.g. "info", "kilnqa_drafts=debug").
    pub log_level: String,

    // ── Subsystems ───────────────────────────────────────────────────

    /// Draft persistence.
    pub drafts: DraftSettings,
    /// Field rule bounds.
    pub validation: ValidationSettings,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            drafts: DraftSettings::default(),
            validation: ValidationSettings::default(),
            extra: HashMap::new(),
        }
    }
}
