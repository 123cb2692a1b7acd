//! Form fields and their native validity state.
//!
//! A [`Field`] is one leaf control of a form: its name, type, the value the
//! template rendered, the current value, and the validity state the host
//! browser would track for it. The custom validity message is what the
//! validation engine writes; the `required` and number-format checks are the
//! host's own constraints.

use crate::input::InputType;

/// Message the host shows for an empty required field.
pub const VALUE_MISSING_MESSAGE: &str = "Please fill out this field.";

/// Message the host shows for text in a number input that is not a number.
pub const BAD_INPUT_MESSAGE: &str = "Please enter a number.";

/// One named, typed control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The HTML `name` attribute.
    pub name: String,
    /// The control type.
    pub input_type: InputType,
    /// The value the template rendered.
    pub default_value: String,
    /// The current value.
    pub value: String,
    /// Whether the control carries the `required` attribute.
    pub required: bool,
    /// The custom validity message; empty means no custom error.
    pub custom_validity: String,
}

impl Field {
    /// Creates an empty, optional field.
    pub fn new(name: impl Into<String>, input_type: InputType) -> Self {
        Self {
            name: name.into(),
            input_type,
            default_value: String::new(),
            value: String::new(),
            required: false,
            custom_validity: String::new(),
        }
    }

    /// Sets the template-rendered value (and the current value with it).
    #[must_use]
    pub fn initial(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.default_value.clone_from(&value);
        self.value = value;
        self
    }

    /// Sets the `required` attribute.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Returns `true` when the required constraint fails.
    pub fn value_missing(&self) -> bool {
        self.required && self.input_type.carries_value() && self.value.trim().is_empty()
    }

    /// Returns `true` when a number input holds text that is not a number.
    pub fn bad_input(&self) -> bool {
        let value = self.value.trim();
        self.input_type == InputType::Number
            && !value.is_empty()
            && !value.parse::<f64>().is_ok_and(f64::is_finite)
    }

    /// Returns `true` if every constraint on this field is satisfied.
    pub fn is_valid(&self) -> bool {
        self.custom_validity.is_empty() && !self.value_missing() && !self.bad_input()
    }

    /// The message the host would display, if any.
    ///
    /// The custom message takes precedence over the built-in ones.
    pub fn validation_message(&self) -> Option<&str> {
        if !self.custom_validity.is_empty() {
            Some(self.custom_validity.as_str())
        } else if self.value_missing() {
            Some(VALUE_MISSING_MESSAGE)
        } else if self.bad_input() {
            Some(BAD_INPUT_MESSAGE)
        } else {
            None
        }
    }

    /// Returns the field to its template-rendered state.
    pub fn reset(&mut self) {
        self.value.clone_from(&self.default_value);
        self.custom_validity.clear();
    }
}
