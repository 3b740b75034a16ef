//! Core error types for docforms.
//!
//! [`DocFormsError`] covers configuration mistakes made while declaring
//! forms, validation failures collected while binding a submission,
//! persistence outcomes reported by document and blob stores, and the
//! contract violation of saving a form that never validated.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A validation error with optional per-field errors.
///
/// Simple errors carry a single message and code. Compound errors carry
/// per-field lists keyed by field name; the non-field bucket uses
/// [`NON_FIELD_ERRORS`].
///
/// # Examples
///
/// ```
/// use docforms_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required.", "required");
/// assert_eq!(err.to_string(), "This field is required.");
///
/// let mut field_errors = std::collections::BTreeMap::new();
/// field_errors.insert(
///     "email".to_string(),
///     vec![ValidationError::new("Enter a valid email address.", "invalid")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.to_string().contains("email: Enter a valid email address."));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "unique").
    pub code: String,
    /// Values substituted into the message.
    pub params: BTreeMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: BTreeMap<String, Vec<Self>>,
}

/// Key under which errors that belong to no single field are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: BTreeMap::new(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: BTreeMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: BTreeMap::new(),
            field_errors,
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Flattens this error into `field -> messages`.
    ///
    /// A simple error lands in the non-field bucket.
    pub fn message_dict(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if !self.message.is_empty() {
            out.entry(NON_FIELD_ERRORS.to_string())
                .or_default()
                .push(self.message.clone());
        }
        for (field, errors) in &self.field_errors {
            let bucket = out.entry(field.clone()).or_default();
            bucket.extend(errors.iter().map(ToString::to_string));
        }
        out
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
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

/// The primary error type for docforms.
///
/// Store implementations report [`DocFormsError::NotFound`],
/// [`DocFormsError::Conflict`] or [`DocFormsError::StoreFailure`] so callers
/// can tell the three outcomes apart. Sub-document writes wrap those in
/// [`DocFormsError::Operation`].
#[derive(Error, Debug)]
pub enum DocFormsError {
    // ── Declaration ──────────────────────────────────────────────────

    /// A form was declared against fields the document does not have.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    /// A form with outstanding errors (or never validated) was saved.
    #[error("{0}")]
    IllegalSave(String),

    // ── Persistence ──────────────────────────────────────────────────

    /// The requested document or blob does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store refused the write because it conflicts with stored state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store could not complete the request.
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// A positional write into an embedded collection failed.
    #[error("{message}")]
    Operation {
        /// Human-readable description of the failed write.
        message: String,
        /// The store outcome that caused it.
        #[source]
        source: Box<DocFormsError>,
    },

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocFormsError {
    /// Wraps a store outcome as a failed sub-document operation.
    pub fn operation(message: impl Into<String>, source: Self) -> Self {
        Self::Operation {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Returns the HTTP status code a web layer should answer with.
    ///
    /// - `Validation` -> 400
    /// - `NotFound` -> 404
    /// - `Conflict` -> 409
    /// - `Operation` -> the status of its cause
    /// - Everything else -> 500
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Operation { source, .. } => source.status_code(),
            Self::Configuration(_)
            | Self::IllegalSave(_)
            | Self::StoreFailure(_)
            | Self::Serialization(_)
            | Self::Io(_) => 500,
        }
    }

    /// Returns `true` for the not-found outcome, looking through `Operation`.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Operation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<ValidationError> for DocFormsError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<serde_json::Error> for DocFormsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A convenience type alias for `Result<T, DocFormsError>`.
pub type DocFormsResult<T> = Result<T, DocFormsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_simple() {
        let err = ValidationError::new("This field is required.", "required");
        assert_eq!(err.to_string(), "This field is required.");
    }

    #[test]
    fn test_validation_error_display_field_errors() {
        let mut field_errors = BTreeMap::new();
        field_errors.insert(
            "email".to_string(),
            vec![ValidationError::new("Invalid email.", "invalid")],
        );
        let err = ValidationError::with_field_errors(field_errors);
        assert!(err.to_string().contains("email: Invalid email."));
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("Too short.", "min_length").with_param("min", "8");
        assert_eq!(err.params.get("min").unwrap(), "8");
    }

    #[test]
    fn test_message_dict_buckets() {
        let mut field_errors = BTreeMap::new();
        field_errors.insert(
            "text".to_string(),
            vec![ValidationError::new("Too long.", "max_length")],
        );
        let mut err = ValidationError::with_field_errors(field_errors);
        err.message = "Broken.".into();
        let dict = err.message_dict();
        assert_eq!(dict["text"], vec!["Too long.".to_string()]);
        assert_eq!(dict[NON_FIELD_ERRORS], vec!["Broken.".to_string()]);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DocFormsError::NotFound("x".into()).status_code(), 404);
        assert_eq!(DocFormsError::Conflict("x".into()).status_code(), 409);
        assert_eq!(DocFormsError::StoreFailure("x".into()).status_code(), 500);
        assert_eq!(DocFormsError::IllegalSave("x".into()).status_code(), 500);
        assert_eq!(DocFormsError::Configuration("x".into()).status_code(), 500);
        assert_eq!(
            DocFormsError::Validation(ValidationError::new("x", "y")).status_code(),
            400
        );
    }

    #[test]
    fn test_operation_keeps_cause() {
        let err = DocFormsError::operation(
            "The Address could not be appended.",
            DocFormsError::NotFound("item 42".into()),
        );
        assert_eq!(err.to_string(), "The Address could not be appended.");
        assert_eq!(err.status_code(), 404);
        assert!(err.is_not_found());
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Not found: item 42");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: DocFormsError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }
}
