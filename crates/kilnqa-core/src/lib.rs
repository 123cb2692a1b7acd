//! # kilnqa-core
//!
//! Core types for kilnqa: the error enum shared by every crate, settings and
//! their loaders, and tracing-based logging setup. This crate has no kilnqa
//! dependencies and sits at the bottom of the workspace.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Draft, validation and logging configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{QaError, QaResult, ValidationError};
pub use settings::{DraftSettings, Settings, StorageBackend, ValidationSettings};
