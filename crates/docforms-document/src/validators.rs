//! Field validators.
//!
//! Validators run during document-level validation, after a value has been
//! assigned to the document. Each checks one constraint.

use std::fmt;
use std::sync::LazyLock;

use docforms_core::ValidationError;
use regex::Regex;

use crate::value::Value;

/// A trait for validating field values.
///
/// # Examples
///
/// ```
/// use docforms_document::validators::{MaxLengthValidator, Validator};
/// use docforms_document::value::Value;
///
/// let v = MaxLengthValidator::new(5);
/// assert!(v.validate(&Value::from("hi")).is_ok());
/// assert!(v.validate(&Value::from("toolong")).is_err());
/// ```
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the given value.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;
}

/// Validates that a string does not exceed a maximum length in characters.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
    /// The maximum allowed length.
    pub max_length: usize,
}

impl MaxLengthValidator {
    /// Creates a new `MaxLengthValidator`.
    pub const fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Validator for MaxLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Value::String(s) = value {
            let len = s.chars().count();
            if len > self.max_length {
                return Err(ValidationError::new(
                    format!(
                        "Ensure this value has at most {} characters (it has {len}).",
                        self.max_length
                    ),
                    "max_length",
                )
                .with_param("limit_value", self.max_length.to_string()));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MaxLengthValidator"
    }
}

/// Validates that a string meets a minimum length in characters.
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
    /// The minimum required length.
    pub min_length: usize,
}

impl MinLengthValidator {
    /// Creates a new `MinLengthValidator`.
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Validator for MinLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Value::String(s) = value {
            let len = s.chars().count();
            if len < self.min_length {
                return Err(ValidationError::new(
                    format!(
                        "Ensure this value has at least {} characters (it has {len}).",
                        self.min_length
                    ),
                    "min_length",
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MinLengthValidator"
    }
}

/// Validates numeric bounds.
#[derive(Debug, Clone)]
pub struct RangeValidator {
    /// Inclusive lower bound.
    pub min_value: Option<f64>,
    /// Inclusive upper bound.
    pub max_value: Option<f64>,
}

impl Validator for RangeValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let Some(n) = value.as_f64() else {
            return Ok(());
        };
        if let Some(min) = self.min_value {
            if n < min {
                return Err(ValidationError::new(
                    format!("Ensure this value is greater than or equal to {min}."),
                    "min_value",
                ));
            }
        }
        if let Some(max) = self.max_value {
            if n > max {
                return Err(ValidationError::new(
                    format!("Ensure this value is less than or equal to {max}."),
                    "max_value",
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "RangeValidator"
    }
}

/// Validates a string against a regular expression.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: Regex,
    message: String,
    code: &'static str,
}

impl RegexValidator {
    /// Creates a validator for `pattern`.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message: "Enter a valid value.".to_string(),
            code: "invalid",
        })
    }

    fn from_regex(regex: Regex, message: &str) -> Self {
        Self {
            regex,
            message: message.to_string(),
            code: "invalid",
        }
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::String(s) if !self.regex.is_match(s) => {
                Err(ValidationError::new(self.message.clone(), self.code))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "RegexValidator"
    }
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid url regex"));

/// Returns `true` if `s` looks like an e-mail address.
pub fn is_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Returns `true` if `s` looks like an http(s) URL.
pub fn is_url(s: &str) -> bool {
    URL_RE.is_match(s)
}

/// E-mail address validator.
pub fn email_validator() -> RegexValidator {
    RegexValidator::from_regex(EMAIL_RE.clone(), "Enter a valid email address.")
}

/// URL validator.
pub fn url_validator() -> RegexValidator {
    RegexValidator::from_regex(URL_RE.clone(), "Enter a valid URL.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_length_counts_chars() {
        let v = MaxLengthValidator::new(3);
        assert!(v.validate(&Value::from("åäö")).is_ok());
        let err = v.validate(&Value::from("toolong")).unwrap_err();
        assert_eq!(
            err.message,
            "Ensure this value has at most 3 characters (it has 7)."
        );
        assert_eq!(err.code, "max_length");
    }

    #[test]
    fn test_max_length_ignores_non_strings() {
        assert!(MaxLengthValidator::new(1).validate(&Value::Int(12345)).is_ok());
    }

    #[test]
    fn test_min_length() {
        let v = MinLengthValidator::new(5);
        assert!(v.validate(&Value::from("hello")).is_ok());
        assert!(v.validate(&Value::from("hi")).is_err());
    }

    #[test]
    fn test_range() {
        let v = RangeValidator {
            min_value: Some(0.0),
            max_value: Some(10.0),
        };
        assert!(v.validate(&Value::Int(5)).is_ok());
        assert_eq!(v.validate(&Value::Int(-1)).unwrap_err().code, "min_value");
        assert_eq!(v.validate(&Value::Float(10.5)).unwrap_err().code, "max_value");
        assert!(v.validate(&Value::from("x")).is_ok());
    }

    #[test]
    fn test_regex() {
        let v = RegexValidator::new(r"^[a-z]+$").unwrap();
        assert!(v.validate(&Value::from("abc")).is_ok());
        assert!(v.validate(&Value::from("ABC")).is_err());
        assert!(RegexValidator::new("(").is_err());
    }

    #[test]
    fn test_email_and_url() {
        assert!(is_email("user@example.com"));
        assert!(!is_email("not-an-email"));
        assert!(is_url("https://example.com/a"));
        assert!(!is_url("ftp://example.com"));
        assert_eq!(
            email_validator().validate(&Value::from("nope")).unwrap_err().message,
            "Enter a valid email address."
        );
        assert!(url_validator().validate(&Value::from("http://x.io")).is_ok());
    }
}
