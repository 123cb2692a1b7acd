//! Input element types.
//!
//! [`InputType`] mirrors the HTML `type` attribute of a form control (plus
//! the `<select>` and `<textarea>` elements). Two properties matter to the
//! rest of the crate: whether the value is secret, and whether the control
//! carries a value at all.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use kilnqa_core::QaError;

/// The type of a form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    /// `<input type="text">`.
    Text,
    /// `<input type="number">`.
    Number,
    /// `<input type="email">`.
    Email,
    /// `<input type="password">`.
    Password,
    /// `<input type="date">`.
    Date,
    /// `<input type="datetime-local">`.
    DatetimeLocal,
    /// `<input type="hidden">`.
    Hidden,
    /// `<select>`.
    Select,
    /// `<textarea>`.
    Textarea,
    /// `<input type="checkbox">`.
    Checkbox,
    /// `<input type="submit">` or `<button type="submit">`.
    Submit,
}

impl InputType {
    /// Returns `true` for controls whose value must never be persisted.
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::Password)
    }

    /// Returns `false` for controls that hold no user data (buttons).
    pub const fn carries_value(self) -> bool {
        !matches!(self, Self::Submit)
    }

    /// Returns the HTML attribute spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Email => "email",
            Self::Password => "password",
            Self::Date => "date",
            Self::DatetimeLocal => "datetime-local",
            Self::Hidden => "hidden",
            Self::Select => "select",
            Self::Textarea => "textarea",
            Self::Checkbox => "checkbox",
            Self::Submit => "submit",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = QaError;

    /// Parses an HTML `type` attribute, case-insensitively.
    ///
    /// An empty string is a text input, as in HTML.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "email" => Ok(Self::Email),
            "password" => Ok(Self::Password),
            "date" => Ok(Self::Date),
            "datetime-local" => Ok(Self::DatetimeLocal),
            "hidden" => Ok(Self::Hidden),
            "select" | "select-one" => Ok(Self::Select),
            "textarea" => Ok(Self::Textarea),
            "checkbox" => Ok(Self::Checkbox),
            "submit" => Ok(Self::Submit),
            other => Err(QaError::ConfigurationError(format!(
                "Unsupported input type '{other}'"
            ))),
        }
    }
}
