//! # kilnqa
//!
//! Form validation and draft persistence for a kiln-line quality management
//! application.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient
//! access, plus the [`runtime`] that wires them together for one page.

/// Error types, settings, and logging setup.
pub use kilnqa_core as core;

/// Edit and submit notifications with disposable subscriptions.
pub use kilnqa_signals as signals;

/// The field tree, domain field rules, and the validation engine.
pub use kilnqa_forms as forms;

/// Debounced local draft persistence.
pub use kilnqa_drafts as drafts;

// Third-party re-exports.
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;

pub mod runtime;

pub use runtime::{Page, QaRuntime};
