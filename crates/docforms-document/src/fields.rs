//! Document field definitions.
//!
//! A [`DocFieldDef`] declares one field of a [`DocumentSchema`]: its
//! [`DocFieldType`], whether it is required, uniqueness constraints, default
//! value and value-level constraints. Definitions are built with chained
//! `#[must_use]` setters and never change after the schema is shared.

use std::fmt;
use std::sync::Arc;

use docforms_core::ValidationError;

use crate::schema::DocumentSchema;
use crate::validators::{
    email_validator, url_validator, MaxLengthValidator, MinLengthValidator, RangeValidator,
    RegexValidator, Validator,
};
use crate::value::Value;

/// The type of a document field.
#[derive(Debug, Clone)]
pub enum DocFieldType {
    /// A UTF-8 string.
    String,
    /// An e-mail address.
    Email,
    /// An http(s) URL.
    Url,
    /// A 64-bit integer.
    Int,
    /// A 64-bit float.
    Float,
    /// A decimal number with a fixed number of places.
    Decimal {
        /// Digits after the decimal point.
        precision: u32,
    },
    /// A boolean.
    Bool,
    /// A date without time.
    Date,
    /// A date and time.
    DateTime,
    /// A UUID.
    Uuid,
    /// A raw object identity that is not a reference to a known document.
    ObjectId,
    /// A reference to a top-level document of another collection.
    Reference {
        /// Name of the referenced document type.
        document: String,
    },
    /// An ordered list of one element type.
    List(Box<DocFieldType>),
    /// A string-keyed map of one element type.
    Map(Box<DocFieldType>),
    /// A stored file.
    File,
    /// A stored image file.
    Image,
    /// An embedded sub-document.
    Embedded(Arc<DocumentSchema>),
}

impl DocFieldType {
    /// Returns `true` for file and image fields.
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File | Self::Image)
    }

    /// Returns `true` for fields whose value carries file handles: a file
    /// field, or a list or map of them.
    pub fn is_file_bearing(&self) -> bool {
        match self {
            Self::File | Self::Image => true,
            Self::List(inner) | Self::Map(inner) => inner.is_file(),
            _ => false,
        }
    }

    /// Returns `true` for a list whose elements are document references.
    pub fn is_reference_list(&self) -> bool {
        matches!(self, Self::List(inner) if matches!(**inner, Self::Reference { .. }))
    }

    /// The embedded schema behind `Embedded` or `List(Embedded)`.
    pub fn embedded_schema(&self) -> Option<&Arc<DocumentSchema>> {
        match self {
            Self::Embedded(schema) => Some(schema),
            Self::List(inner) => match inner.as_ref() {
                Self::Embedded(schema) => Some(schema),
                _ => None,
            },
            _ => None,
        }
    }

    /// Checks that `value` has the shape this type stores.
    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        let ok = match (self, value) {
            (Self::String | Self::Email | Self::Url, Value::String(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float | Self::Decimal { .. }, Value::Float(_) | Value::Int(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::Date, Value::Date(_))
            | (Self::DateTime, Value::DateTime(_))
            | (Self::Uuid, Value::Uuid(_))
            | (Self::ObjectId | Self::Reference { .. }, Value::Id(_))
            | (Self::File | Self::Image, Value::File(_))
            | (Self::Embedded(_), Value::Embedded(_)) => true,
            (Self::List(inner), Value::List(items)) => {
                for item in items {
                    inner.check_type(item)?;
                }
                true
            }
            (Self::Map(inner), Value::Map(entries)) => {
                for item in entries.values() {
                    inner.check_type(item)?;
                }
                true
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::new(
                format!("Invalid value for {}: {value}", self.label()),
                "invalid",
            ))
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Email => "email",
            Self::Url => "url",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Decimal { .. } => "decimal",
            Self::Bool => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::ObjectId => "object id",
            Self::Reference { .. } => "reference",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::File => "file",
            Self::Image => "image",
            Self::Embedded(_) => "embedded document",
        }
    }
}

/// How a field's default value is produced for new documents.
#[derive(Clone)]
pub enum FieldDefault {
    /// A fixed value.
    Value(Value),
    /// A value computed when the document is created.
    Computed(fn() -> Value),
}

impl FieldDefault {
    /// Produces the default value.
    pub fn produce(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Returns the current local time as a `DateTime` value.
pub fn now() -> Value {
    Value::DateTime(chrono::Local::now().naive_local())
}

/// Complete definition of a document field.
#[derive(Debug, Clone)]
pub struct DocFieldDef {
    /// The field name.
    pub name: String,
    /// The field type.
    pub field_type: DocFieldType,
    /// Whether a value must be present for the document to validate.
    pub required: bool,
    /// Whether the value must be unique across the collection.
    pub unique: bool,
    /// Peer fields forming a composite uniqueness constraint with this one.
    pub unique_with: Vec<String>,
    /// Default for new documents.
    pub default: Option<FieldDefault>,
    /// Allowed values as `(value, label)` pairs.
    pub choices: Option<Vec<(Value, String)>>,
    /// Maximum string length.
    pub max_length: Option<usize>,
    /// Minimum string length.
    pub min_length: Option<usize>,
    /// Inclusive numeric lower bound.
    pub min_value: Option<f64>,
    /// Inclusive numeric upper bound.
    pub max_value: Option<f64>,
    /// Pattern string values must match.
    pub regex: Option<String>,
    /// Human-readable name; derived from `name` when unset.
    pub verbose_name: Option<String>,
    /// Help text shown next to the form input.
    pub help_text: String,
    /// Blob namespace for file fields.
    pub blob_namespace: Option<String>,
    /// Additional validators.
    pub validators: Vec<Arc<dyn Validator>>,
}

impl DocFieldDef {
    /// Creates a new optional, non-unique field.
    pub fn new(name: impl Into<String>, field_type: DocFieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            unique: false,
            unique_with: Vec::new(),
            default: None,
            choices: None,
            max_length: None,
            min_length: None,
            min_value: None,
            max_value: None,
            regex: None,
            verbose_name: None,
            help_text: String::new(),
            blob_namespace: None,
            validators: Vec::new(),
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Adds peers to a composite uniqueness constraint.
    #[must_use]
    pub fn unique_with<I, S>(mut self, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_with.extend(peers.into_iter().map(Into::into));
        self
    }

    /// Sets a fixed default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Sets a computed default value.
    #[must_use]
    pub fn default_with(mut self, f: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Computed(f));
        self
    }

    /// Restricts values to a set of choices.
    #[must_use]
    pub fn choices<I, V, L>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<Value>,
        L: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
        );
        self
    }

    /// Sets the maximum string length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets the minimum string length.
    #[must_use]
    pub const fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    /// Sets the inclusive numeric lower bound.
    #[must_use]
    pub const fn min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    /// Sets the inclusive numeric upper bound.
    #[must_use]
    pub const fn max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    /// Sets a pattern that string values must match.
    #[must_use]
    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    /// Sets the verbose (human-readable) name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = Some(name.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the blob namespace used for uploads to this field.
    #[must_use]
    pub fn blob_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.blob_namespace = Some(namespace.into());
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// The human-readable name: `verbose_name` or the name with underscores
    /// turned into spaces.
    pub fn verbose(&self) -> String {
        self.verbose_name
            .clone()
            .unwrap_or_else(|| self.name.replace('_', " "))
    }

    /// Validates a value assigned to this field on a document.
    ///
    /// Empty values only fail when the field is required. The first failing
    /// check is reported.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if value.is_empty() {
            if self.required {
                return Err(ValidationError::new("This field is required.", "required"));
            }
            return Ok(());
        }

        self.field_type.check_type(value)?;

        if let Some(choices) = &self.choices {
            let candidates: Vec<&Value> = match value {
                Value::List(items) => items.iter().collect(),
                other => vec![other],
            };
            for candidate in candidates {
                if !choices.iter().any(|(v, _)| v == candidate) {
                    return Err(ValidationError::new(
                        format!("Value {candidate} is not a valid choice."),
                        "invalid_choice",
                    ));
                }
            }
        }

        if let Some(max) = self.max_length {
            MaxLengthValidator::new(max).validate(value)?;
        }
        if let Some(min) = self.min_length {
            MinLengthValidator::new(min).validate(value)?;
        }
        if self.min_value.is_some() || self.max_value.is_some() {
            RangeValidator {
                min_value: self.min_value,
                max_value: self.max_value,
            }
            .validate(value)?;
        }
        if let Some(pattern) = &self.regex {
            let validator = RegexValidator::new(pattern).map_err(|e| {
                ValidationError::new(format!("Invalid pattern for {}: {e}", self.name), "invalid")
            })?;
            validator.validate(value)?;
        }
        match self.field_type {
            DocFieldType::Email => email_validator().validate(value)?,
            DocFieldType::Url => url_validator().validate(value)?,
            _ => {}
        }

        for validator in &self.validators {
            validator.validate(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let f = DocFieldDef::new("title", DocFieldType::String)
            .required()
            .unique()
            .unique_with(["owner"])
            .max_length(20)
            .verbose_name("headline");
        assert!(f.required);
        assert!(f.unique);
        assert_eq!(f.unique_with, vec!["owner".to_string()]);
        assert_eq!(f.verbose(), "headline");
    }

    #[test]
    fn test_verbose_defaults_to_name() {
        let f = DocFieldDef::new("first_name", DocFieldType::String);
        assert_eq!(f.verbose(), "first name");
    }

    #[test]
    fn test_required_empty() {
        let f = DocFieldDef::new("text", DocFieldType::String).required();
        assert_eq!(f.validate(&Value::Null).unwrap_err().code, "required");
        assert_eq!(f.validate(&Value::from("")).unwrap_err().code, "required");
        let optional = DocFieldDef::new("text", DocFieldType::String);
        assert!(optional.validate(&Value::Null).is_ok());
    }

    #[test]
    fn test_type_mismatch() {
        let f = DocFieldDef::new("count", DocFieldType::Int);
        assert_eq!(f.validate(&Value::from("3")).unwrap_err().code, "invalid");
        assert!(f.validate(&Value::Int(3)).is_ok());
    }

    #[test]
    fn test_list_element_types() {
        let f = DocFieldDef::new("tags", DocFieldType::List(Box::new(DocFieldType::String)));
        assert!(f.validate(&Value::List(vec![Value::from("a")])).is_ok());
        assert!(f.validate(&Value::List(vec![Value::Int(1)])).is_err());
    }

    #[test]
    fn test_choices() {
        let f = DocFieldDef::new("size", DocFieldType::String)
            .choices([("S", "Small"), ("L", "Large")]);
        assert!(f.validate(&Value::from("S")).is_ok());
        assert_eq!(
            f.validate(&Value::from("M")).unwrap_err().message,
            "Value M is not a valid choice."
        );
    }

    #[test]
    fn test_length_and_range() {
        let text = DocFieldDef::new("text", DocFieldType::String).max_length(3);
        assert_eq!(text.validate(&Value::from("abcd")).unwrap_err().code, "max_length");
        let n = DocFieldDef::new("n", DocFieldType::Int).min_value(1.0).max_value(5.0);
        assert!(n.validate(&Value::Int(0)).is_err());
        assert!(n.validate(&Value::Int(5)).is_ok());
    }

    #[test]
    fn test_email_and_regex() {
        let email = DocFieldDef::new("email", DocFieldType::Email);
        assert!(email.validate(&Value::from("a@b.io")).is_ok());
        assert!(email.validate(&Value::from("nope")).is_err());
        let code = DocFieldDef::new("code", DocFieldType::String).regex("^[A-Z]{3}$");
        assert!(code.validate(&Value::from("ABC")).is_ok());
        assert!(code.validate(&Value::from("abc")).is_err());
    }

    #[test]
    fn test_file_bearing() {
        assert!(DocFieldType::File.is_file_bearing());
        assert!(DocFieldType::List(Box::new(DocFieldType::Image)).is_file_bearing());
        assert!(DocFieldType::Map(Box::new(DocFieldType::File)).is_file_bearing());
        assert!(!DocFieldType::List(Box::new(DocFieldType::String)).is_file_bearing());
    }

    #[test]
    fn test_reference_list() {
        let t = DocFieldType::List(Box::new(DocFieldType::Reference {
            document: "Tag".into(),
        }));
        assert!(t.is_reference_list());
        assert!(!DocFieldType::List(Box::new(DocFieldType::Int)).is_reference_list());
    }

    #[test]
    fn test_computed_default() {
        let f = DocFieldDef::new("created", DocFieldType::DateTime).default_with(now);
        let produced = f.default.as_ref().unwrap().produce();
        assert!(matches!(produced, Value::DateTime(_)));
    }
}
