//! # kilnqa-forms
//!
//! The field tree and the validation engine.
//!
//! - [`tree`] defines the [`FieldTree`](tree::FieldTree) capability the
//!   engine and the draft store are handed, plus the event payloads.
//! - [`form`] and [`document`] are the in-memory host: forms built from
//!   fields, user edits, the native validity gate and submission.
//! - [`rules`] holds the domain field rules (quantity, kiln temperature,
//!   percentage) and decimal coercion.
//! - [`engine`] attaches the rules to a tree and keeps each field's validity
//!   message current.
//! - [`catalog`] renders the application's standard data-entry forms.

pub mod catalog;
pub mod document;
pub mod engine;
pub mod field;
pub mod form;
pub mod input;
pub mod rules;
pub mod tree;

pub use document::Document;
pub use engine::{Attachment, ValidationEngine};
pub use field::Field;
pub use form::{FormBuilder, FormHandle, SubmitOutcome};
pub use input::InputType;
pub use rules::{FieldRule, NamePattern, RuleCategory, RuleSet, ValidityResult};
pub use tree::{
    FieldEdit, FieldSnapshot, FieldTree, FormSubmission, Handler, SharedTree, SubmitAttempt,
};
