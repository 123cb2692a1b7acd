//! The field tree capability and its event payloads.
//!
//! The validation engine and the draft store never reach for a page or a
//! document themselves. They are handed a [`FieldTree`], one form's worth of
//! named, typed controls, and interact with it only through this trait:
//! reading values, writing values and validity messages, and subscribing to
//! edit and submit notifications.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use url::form_urlencoded;

use kilnqa_core::QaResult;
use kilnqa_signals::Subscription;

use crate::input::InputType;

/// A boxed event handler accepted by [`FieldTree`] subscriptions.
pub type Handler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// A shared handle to a field tree.
pub type SharedTree = Arc<dyn FieldTree>;

/// Point-in-time view of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    /// The field name.
    pub name: String,
    /// The control type.
    pub input_type: InputType,
    /// The current value.
    pub value: String,
}

/// Fired after a user changes a field's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    /// The owning form.
    pub form_id: String,
    /// The edited field.
    pub name: String,
    /// The field's value after the edit.
    pub value: String,
}

/// Fired when the user asks to submit, before the host's validity gate.
///
/// Any listener may cancel the submission with
/// [`prevent_default`](Self::prevent_default).
#[derive(Debug)]
pub struct SubmitAttempt {
    /// The owning form.
    pub form_id: String,
    prevented: AtomicBool,
}

impl SubmitAttempt {
    /// Creates a new, not-yet-prevented attempt.
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            prevented: AtomicBool::new(false),
        }
    }

    /// Cancels the submission.
    pub fn prevent_default(&self) {
        self.prevented.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if a listener cancelled the submission.
    pub fn is_default_prevented(&self) -> bool {
        self.prevented.load(Ordering::SeqCst)
    }
}

/// A submission accepted by the host, ready for the server.
///
/// Carries every value-bearing field, secret ones included: this is what the
/// host sends, not what gets persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSubmission {
    /// The submitting form.
    pub form_id: String,
    /// The HTTP method, upper-cased.
    pub method: String,
    /// The target URL.
    pub action: String,
    /// Name/value pairs in tree order.
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    /// Returns the first value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Encodes the fields as an `application/x-www-form-urlencoded` body.
    pub fn encode_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }
}

/// One form's worth of controls, as seen by the validation and draft layers.
pub trait FieldTree: Send + Sync {
    /// A stable identifier for the form in its page.
    fn form_id(&self) -> &str;

    /// The draft key the form declares, if it opts into draft persistence.
    fn draft_key(&self) -> Option<&str>;

    /// Snapshots every field in tree order.
    fn fields(&self) -> Vec<FieldSnapshot>;

    /// Returns the current value of the named field.
    fn value(&self, name: &str) -> Option<String>;

    /// Sets a field's displayed value without firing an edit notification.
    fn set_value(&self, name: &str, value: &str) -> QaResult<()>;

    /// Sets (non-empty) or clears (empty) a field's custom validity message.
    fn set_custom_validity(&self, name: &str, message: &str) -> QaResult<()>;

    /// The host's aggregate validity check.
    fn check_validity(&self) -> bool;

    /// Adds a class to the form element.
    fn add_class(&self, class: &str);

    /// Subscribes to field edits.
    fn on_edit(&self, handler: Handler<FieldEdit>) -> Subscription;

    /// Subscribes to submit attempts (before the validity gate).
    fn on_submit_attempt(&self, handler: Handler<SubmitAttempt>) -> Subscription;

    /// Subscribes to accepted submissions (after the validity gate).
    fn on_submitted(&self, handler: Handler<FormSubmission>) -> Subscription;
}
