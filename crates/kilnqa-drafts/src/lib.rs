//! # kilnqa-drafts
//!
//! Local draft persistence for in-progress forms.
//!
//! A form that declares a draft key gets its saved values restored when the
//! page is ready, has its values written back after each burst of edits,
//! and loses its saved draft once a submission is accepted.
//!
//! ## Modules
//!
//! - [`storage`] - The [`DurableStore`](storage::DurableStore) trait and the
//!   memory, file and disabled backends
//! - [`codec`] - The [`DraftRecord`](codec::DraftRecord) mapping and its
//!   string encoding
//! - [`debounce`] - Cancel-and-reschedule timers on the tokio runtime
//! - [`store`] - The [`DraftStore`](store::DraftStore) and per-form
//!   registrations

pub mod codec;
pub mod debounce;
pub mod storage;
pub mod store;

pub use codec::DraftRecord;
pub use debounce::{debounce, Debounced};
pub use storage::{store_from_settings, DisabledStore, DurableStore, FileStore, MemoryStore};
pub use store::{DraftRegistration, DraftStore};
