//! Core error types for kilnqa.
//!
//! [`QaError`] covers every failure the validation and draft layers can
//! produce. Most of them are recoverable: storage and decode
//! failures only cost the draft feature, never the form itself. See
//! [`QaError::is_recoverable`].

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with optional field-level errors.
///
/// Validation errors can be either simple (a single message) or compound
/// (containing per-field error lists). The host form reports a compound
/// error when it blocks a submission.
///
/// # Examples
///
/// ```
/// use kilnqa_core::error::ValidationError;
///
/// // Simple validation error
/// let err = ValidationError::new("quantity cannot be negative", "range");
///
/// // Field-level validation errors
/// let mut field_errors = std::collections::BTreeMap::new();
/// field_errors.insert(
///     "kiln_temperature".to_string(),
///     vec![ValidationError::new("temperature must be between 800°C and 1400°C", "range")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.has_field_errors());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "range", "required", "bad_input").
    pub code: String,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: BTreeMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: BTreeMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            field_errors,
        }
    }

    /// Returns `true` if any per-field errors are recorded.
    pub fn has_field_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    /// Returns the messages recorded for one field.
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.field_errors
            .get(field)
            .map(|errors| errors.iter().map(|e| e.message.as_str()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut first = true;
            for (field, errors) in &self.field_errors {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for kilnqa.
#[derive(Error, Debug)]
pub enum QaError {
    // ── Storage ──────────────────────────────────────────────────────

    /// The durable store refused a write because it would exceed its capacity.
    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, capacity {capacity}")]
    QuotaExceeded {
        /// The key being written.
        key: String,
        /// Total bytes the store would hold after the write.
        needed: usize,
        /// The configured ceiling.
        capacity: usize,
    },

    /// The durable store is disabled or otherwise not usable.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// An I/O error occurred in a file-backed store.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ── Drafts ───────────────────────────────────────────────────────

    /// Stored draft data is not a well-formed field mapping.
    #[error("Malformed draft data: {0}")]
    DraftDecode(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── Field tree ───────────────────────────────────────────────────

    /// A field name does not exist in the form.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A form id does not exist in the document.
    #[error("Unknown form: {0}")]
    UnknownForm(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl QaError {
    /// Returns `true` for failures the draft layer absorbs without
    /// affecting the form: storage, I/O and decode errors.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::QuotaExceeded { .. }
                | Self::StorageUnavailable(_)
                | Self::IoError(_)
                | Self::DraftDecode(_)
                | Self::SerializationError(_)
        )
    }
}

impl From<ValidationError> for QaError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, QaError>`.
pub type QaResult<T> = Result<T, QaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_simple() {
        let err = ValidationError::new("quantity cannot be negative", "range");
        assert_eq!(err.to_string(), "quantity cannot be negative");
    }

    #[test]
    fn test_validation_error_display_field_errors() {
        let mut field_errors = BTreeMap::new();
        field_errors.insert(
            "actual_quantity".to_string(),
            vec![ValidationError::new("quantity cannot be negative", "range")],
        );
        field_errors.insert(
            "efficiency_rating".to_string(),
            vec![ValidationError::new("percentage must be between 0 and 100", "range")],
        );
        let err = ValidationError::with_field_errors(field_errors);
        assert_eq!(
            err.to_string(),
            "actual_quantity: quantity cannot be negative; \
             efficiency_rating: percentage must be between 0 and 100"
        );
    }

    #[test]
    fn test_messages_for() {
        let mut field_errors = BTreeMap::new();
        field_errors.insert(
            "lot_number".to_string(),
            vec![ValidationError::new("Please fill out this field.", "required")],
        );
        let err = ValidationError::with_field_errors(field_errors);
        assert_eq!(err.messages_for("lot_number"), vec!["Please fill out this field."]);
        assert!(err.messages_for("notes").is_empty());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(QaError::StorageUnavailable("off".into()).is_recoverable());
        assert!(QaError::DraftDecode("not an object".into()).is_recoverable());
        assert!(QaError::QuotaExceeded {
            key: "k".into(),
            needed: 10,
            capacity: 5
        }
        .is_recoverable());
        assert!(!QaError::UnknownField("x".into()).is_recoverable());
        assert!(!QaError::ConfigurationError("x".into()).is_recoverable());
    }

    #[test]
    fn test_quota_display() {
        let err = QaError::QuotaExceeded {
            key: "autosave_batch".into(),
            needed: 12,
            capacity: 8,
        };
        assert_eq!(
            err.to_string(),
            "Storage quota exceeded writing 'autosave_batch': 12 bytes needed, capacity 8"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: QaError = io_err.into();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("read-only"));
    }
}
