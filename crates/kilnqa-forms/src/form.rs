//! The in-memory form host.
//!
//! A [`FormHandle`] is a rendered form: its fields, its class list, and the
//! three notifications the core layers subscribe to. It plays the part of the
//! browser: [`FormHandle::input`] is a user typing into a field, and
//! [`FormHandle::submit`] runs the native submission sequence:
//!
//! 1. Fire the submit-attempt notification; listeners may cancel.
//! 2. Run the aggregate validity check over every field.
//! 3. If nothing cancelled and every field is valid, fire the submitted
//!    notification and hand back the [`FormSubmission`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use kilnqa_core::{QaError, QaResult, ValidationError};
use kilnqa_signals::{Signal, Subscription};

use crate::field::Field;
use crate::tree::{
    FieldEdit, FieldSnapshot, FieldTree, FormSubmission, Handler, SharedTree, SubmitAttempt,
};

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The host accepted the submission and would send it.
    Submitted(FormSubmission),
    /// The submission was cancelled; carries the invalid fields' messages.
    Blocked(ValidationError),
}

impl SubmitOutcome {
    /// Returns `true` for [`SubmitOutcome::Submitted`].
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

#[derive(Debug, Default)]
struct FormState {
    fields: Vec<Field>,
    classes: BTreeSet<String>,
}

impl FormState {
    fn field(&self, name: &str) -> QaResult<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| QaError::UnknownField(name.to_string()))
    }

    fn field_mut(&mut self, name: &str) -> QaResult<&mut Field> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| QaError::UnknownField(name.to_string()))
    }
}

#[derive(Debug)]
struct FormInner {
    id: String,
    method: String,
    action: String,
    draft_key: Option<String>,
    state: RwLock<FormState>,
    edited: Signal<FieldEdit>,
    submitting: Signal<SubmitAttempt>,
    submitted: Signal<FormSubmission>,
}

/// Builds a [`FormHandle`].
///
/// # Examples
///
/// ```
/// use kilnqa_forms::{Field, FormBuilder, InputType};
///
/// let form = FormBuilder::new("waste-form")
///     .action("/waste/add")
///     .draft_key("waste_add")
///     .field(Field::new("quantity_kg", InputType::Number).required(true))
///     .field(Field::new("notes", InputType::Textarea))
///     .build();
///
/// assert_eq!(form.draft_key(), Some("waste_add"));
/// ```
#[derive(Debug)]
pub struct FormBuilder {
    id: String,
    method: String,
    action: String,
    draft_key: Option<String>,
    fields: Vec<Field>,
}

impl FormBuilder {
    /// Starts a POST form with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: "POST".to_string(),
            action: String::new(),
            draft_key: None,
            fields: Vec::new(),
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    /// Sets the target URL.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Opts the form into draft persistence under `key`.
    #[must_use]
    pub fn draft_key(mut self, key: impl Into<String>) -> Self {
        self.draft_key = Some(key.into());
        self
    }

    /// Appends a field. Lookups by name use the first field with that name.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Finishes the form.
    pub fn build(self) -> FormHandle {
        FormHandle {
            inner: Arc::new(FormInner {
                id: self.id,
                method: self.method,
                action: self.action,
                draft_key: self.draft_key,
                state: RwLock::new(FormState {
                    fields: self.fields,
                    classes: BTreeSet::new(),
                }),
                edited: Signal::new(),
                submitting: Signal::new(),
                submitted: Signal::new(),
            }),
        }
    }
}

/// A shared handle to one rendered form.
///
/// Cloning is cheap; every clone refers to the same form.
#[derive(Debug, Clone)]
pub struct FormHandle {
    inner: Arc<FormInner>,
}

impl FormHandle {
    /// The form id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The HTTP method.
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// The target URL.
    pub fn action(&self) -> &str {
        &self.inner.action
    }

    /// The declared draft key.
    pub fn draft_key(&self) -> Option<&str> {
        self.inner.draft_key.as_deref()
    }

    /// Wraps this handle as a [`SharedTree`].
    pub fn as_tree(&self) -> SharedTree {
        Arc::new(self.clone())
    }

    /// Returns a copy of the named field.
    pub fn field(&self, name: &str) -> Option<Field> {
        self.state().field(name).ok().cloned()
    }

    /// Simulates the user changing a field: updates the value, then fires
    /// the edit notification.
    pub fn input(&self, name: &str, value: &str) -> QaResult<()> {
        {
            let mut state = self.state_mut();
            let field = state.field_mut(name)?;
            if !field.input_type.carries_value() {
                return Err(QaError::UnknownField(name.to_string()));
            }
            field.value = value.to_string();
        }

        self.inner.edited.send(&FieldEdit {
            form_id: self.inner.id.clone(),
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    /// Runs the native submission sequence.
    pub fn submit(&self) -> SubmitOutcome {
        let attempt = SubmitAttempt::new(self.inner.id.clone());
        self.inner.submitting.send(&attempt);

        let errors = self.validation_errors();
        if attempt.is_default_prevented() || errors.has_field_errors() {
            tracing::debug!(
                form = %self.inner.id,
                invalid = errors.field_errors.len(),
                "submission blocked"
            );
            return SubmitOutcome::Blocked(errors);
        }

        let submission = self.submission();
        self.inner.submitted.send(&submission);
        SubmitOutcome::Submitted(submission)
    }

    /// Returns every field to its template-rendered value and drops the
    /// `was-validated` style markers.
    pub fn reset(&self) {
        let mut state = self.state_mut();
        for field in &mut state.fields {
            field.reset();
        }
        state.classes.clear();
    }

    /// The message the host would show for the named field.
    pub fn validation_message(&self, name: &str) -> Option<String> {
        self.state()
            .field(name)
            .ok()
            .and_then(|f| f.validation_message().map(str::to_string))
    }

    /// Returns `true` if the form element carries `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.state().classes.contains(class)
    }

    /// Collects the messages of every invalid field.
    pub fn validation_errors(&self) -> ValidationError {
        let state = self.state();
        let mut field_errors: BTreeMap<String, Vec<ValidationError>> = BTreeMap::new();
        for field in &state.fields {
            let code = if !field.custom_validity.is_empty() {
                "custom"
            } else if field.value_missing() {
                "required"
            } else {
                "bad_input"
            };
            if let Some(message) = field.validation_message() {
                field_errors
                    .entry(field.name.clone())
                    .or_default()
                    .push(ValidationError::new(message, code));
            }
        }
        ValidationError::with_field_errors(field_errors)
    }

    /// Number of edit listeners currently connected.
    pub fn edit_listener_count(&self) -> usize {
        self.inner.edited.receiver_count()
    }

    /// Number of submit-attempt and submitted listeners currently connected.
    pub fn submit_listener_count(&self) -> usize {
        self.inner.submitting.receiver_count() + self.inner.submitted.receiver_count()
    }

    fn submission(&self) -> FormSubmission {
        let state = self.state();
        FormSubmission {
            form_id: self.inner.id.clone(),
            method: self.inner.method.clone(),
            action: self.inner.action.clone(),
            fields: state
                .fields
                .iter()
                .filter(|f| f.input_type.carries_value())
                .map(|f| (f.name.clone(), f.value.clone()))
                .collect(),
        }
    }

    fn state(&self) -> std::sync::RwLockReadGuard<'_, FormState> {
        self.inner.state.read().expect("form lock poisoned")
    }

    fn state_mut(&self) -> std::sync::RwLockWriteGuard<'_, FormState> {
        self.inner.state.write().expect("form lock poisoned")
    }
}

impl FieldTree for FormHandle {
    fn form_id(&self) -> &str {
        self.id()
    }

    fn draft_key(&self) -> Option<&str> {
        Self::draft_key(self)
    }

    fn fields(&self) -> Vec<FieldSnapshot> {
        self.state()
            .fields
            .iter()
            .map(|f| FieldSnapshot {
                name: f.name.clone(),
                input_type: f.input_type,
                value: f.value.clone(),
            })
            .collect()
    }

    fn value(&self, name: &str) -> Option<String> {
        self.state().field(name).ok().map(|f| f.value.clone())
    }

    fn set_value(&self, name: &str, value: &str) -> QaResult<()> {
        let mut state = self.state_mut();
        state.field_mut(name)?.value = value.to_string();
        Ok(())
    }

    fn set_custom_validity(&self, name: &str, message: &str) -> QaResult<()> {
        let mut state = self.state_mut();
        state.field_mut(name)?.custom_validity = message.to_string();
        Ok(())
    }

    fn check_validity(&self) -> bool {
        self.state().fields.iter().all(Field::is_valid)
    }

    fn add_class(&self, class: &str) {
        self.state_mut().classes.insert(class.to_string());
    }

    fn on_edit(&self, handler: Handler<FieldEdit>) -> Subscription {
        self.inner.edited.connect(handler)
    }

    fn on_submit_attempt(&self, handler: Handler<SubmitAttempt>) -> Subscription {
        self.inner.submitting.connect(handler)
    }

    fn on_submitted(&self, handler: Handler<FormSubmission>) -> Subscription {
        self.inner.submitted.connect(handler)
    }
}
