//! Form field definitions and type-level validation.
//!
//! Each [`FormFieldDef`] describes a single form field: its type, widget,
//! label and validators. [`clean_field_value`] and [`clean_multi_value`]
//! turn raw submitted strings into typed [`Value`]s, collecting every
//! problem as a message. File-bearing types are not cleaned here; the
//! binder turns their uploads into pending uploads.

use std::collections::HashMap;
use std::sync::Arc;

use docforms_document::validators::{is_email, is_url, Validator};
use docforms_document::{DocumentId, Value};

use crate::widgets::WidgetType;

/// The type of a form field, with its type-specific parameters.
#[derive(Debug, Clone)]
pub enum FormFieldType {
    /// A character (string) field.
    Char {
        /// Minimum length (characters).
        min_length: Option<usize>,
        /// Maximum length (characters).
        max_length: Option<usize>,
        /// Whether to strip leading/trailing whitespace.
        strip: bool,
    },
    /// An integer field.
    Integer {
        /// Minimum allowed value.
        min_value: Option<i64>,
        /// Maximum allowed value.
        max_value: Option<i64>,
    },
    /// A floating-point field.
    Float {
        /// Minimum allowed value.
        min_value: Option<f64>,
        /// Maximum allowed value.
        max_value: Option<f64>,
    },
    /// A fixed-precision decimal field.
    Decimal {
        /// Maximum total number of digits, if limited.
        max_digits: Option<u32>,
        /// Number of digits after the decimal point.
        decimal_places: u32,
    },
    /// A boolean field. Absent means `false`.
    Boolean,
    /// A date field (YYYY-MM-DD).
    Date,
    /// A date-time field (YYYY-MM-DDTHH:MM:SS).
    DateTime,
    /// An email address field.
    Email,
    /// A URL field.
    Url,
    /// A UUID field.
    Uuid,
    /// A single-choice field.
    Choice {
        /// Available choices as `(value, display_label)` pairs.
        choices: Vec<(String, String)>,
    },
    /// A multiple-choice field.
    MultipleChoice {
        /// Available choices as `(value, display_label)` pairs.
        choices: Vec<(String, String)>,
    },
    /// A field validated against a regular expression.
    Regex {
        /// The regex pattern string.
        regex: String,
    },
    /// A reference to another document, submitted as its identity.
    Reference {
        /// Name of the referenced document type.
        document: String,
    },
    /// A list of references to other documents.
    MultipleReference {
        /// Name of the referenced document type.
        document: String,
    },
    /// A list of scalar values of one element type.
    List(Box<FormFieldType>),
    /// A single file upload.
    File,
    /// A single image upload.
    Image,
    /// An ordered list of uploads, addressed by index.
    FileList,
    /// A keyed collection of uploads.
    FileMap,
}

impl FormFieldType {
    /// Returns `true` for types whose data arrives as uploads.
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File | Self::Image | Self::FileList | Self::FileMap)
    }

    /// Returns `true` for types that take several submitted values.
    pub const fn is_multi(&self) -> bool {
        matches!(
            self,
            Self::MultipleChoice { .. } | Self::MultipleReference { .. } | Self::List(_)
        )
    }

    /// The `(value, label)` pairs for choice types.
    pub fn choices(&self) -> &[(String, String)] {
        match self {
            Self::Choice { choices } | Self::MultipleChoice { choices } => choices,
            _ => &[],
        }
    }
}

/// Complete definition of a form field.
#[derive(Debug, Clone)]
pub struct FormFieldDef {
    /// The field name.
    pub name: String,
    /// The field type, controlling parsing and coercion.
    pub field_type: FormFieldType,
    /// Whether a value must be submitted.
    pub required: bool,
    /// Initial value shown on an unbound form.
    pub initial: Option<Value>,
    /// Help text displayed alongside the field.
    pub help_text: String,
    /// Human-readable label.
    pub label: String,
    /// The widget used for rendering.
    pub widget: WidgetType,
    /// Additional validators applied after type coercion.
    pub validators: Vec<Arc<dyn Validator>>,
    /// Custom error messages keyed by error code (`required`, `invalid`).
    pub error_messages: HashMap<String, String>,
    /// Whether the field is rendered but not editable.
    pub disabled: bool,
}

impl FormFieldDef {
    /// Creates a required field using the default widget for its type.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        let widget = default_widget_for_field_type(&field_type);
        let label = docforms_core::utils::text::pretty_name(&name);
        Self {
            name,
            field_type,
            required: true,
            initial: None,
            help_text: String::new(),
            label,
            widget,
            validators: Vec::new(),
            error_messages: HashMap::new(),
            disabled: false,
        }
    }

    /// Sets whether this field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the widget type.
    #[must_use]
    pub fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Sets a custom error message for a given code.
    #[must_use]
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    /// Sets whether this field is disabled.
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub(crate) fn message(&self, code: &str, default: &str) -> String {
        self.error_messages
            .get(code)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn required_message(&self) -> String {
        self.message("required", "This field is required.")
    }
}

/// Returns the default widget type for a form field type.
pub const fn default_widget_for_field_type(field_type: &FormFieldType) -> WidgetType {
    match field_type {
        FormFieldType::Char { .. }
        | FormFieldType::Uuid
        | FormFieldType::Regex { .. }
        | FormFieldType::Reference { .. }
        | FormFieldType::List(_) => WidgetType::TextInput,
        FormFieldType::Integer { .. }
        | FormFieldType::Float { .. }
        | FormFieldType::Decimal { .. } => WidgetType::NumberInput,
        FormFieldType::Boolean => WidgetType::CheckboxInput,
        FormFieldType::Date => WidgetType::DateInput,
        FormFieldType::DateTime => WidgetType::DateTimeInput,
        FormFieldType::Email => WidgetType::EmailInput,
        FormFieldType::Url => WidgetType::UrlInput,
        FormFieldType::Choice { .. } => WidgetType::Select,
        FormFieldType::MultipleChoice { .. } | FormFieldType::MultipleReference { .. } => {
            WidgetType::SelectMultiple
        }
        FormFieldType::File
        | FormFieldType::Image
        | FormFieldType::FileList
        | FormFieldType::FileMap => WidgetType::ClearableFileInput,
    }
}

const INVALID_REFERENCE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Extensions accepted by image fields.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];

pub(crate) fn truthy(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// Converts one non-empty raw string into a value of `field_type`,
/// appending messages for anything that does not fit.
#[allow(clippy::too_many_lines)]
fn coerce(field_type: &FormFieldType, raw: &str, errors: &mut Vec<String>) -> Value {
    match field_type {
        FormFieldType::Char {
            min_length,
            max_length,
            strip,
        } => {
            let s = if *strip { raw.trim() } else { raw };
            let len = s.chars().count();
            if let Some(min) = min_length {
                if len < *min {
                    errors.push(format!(
                        "Ensure this value has at least {min} characters (it has {len})."
                    ));
                }
            }
            if let Some(max) = max_length {
                if len > *max {
                    errors.push(format!(
                        "Ensure this value has at most {max} characters (it has {len})."
                    ));
                }
            }
            Value::String(s.to_string())
        }

        FormFieldType::Integer {
            min_value,
            max_value,
        } => match raw.trim().parse::<i64>() {
            Ok(n) => {
                if let Some(min) = min_value.filter(|min| n < *min) {
                    errors.push(format!("Ensure this value is greater than or equal to {min}."));
                }
                if let Some(max) = max_value.filter(|max| n > *max) {
                    errors.push(format!("Ensure this value is less than or equal to {max}."));
                }
                Value::Int(n)
            }
            Err(_) => {
                errors.push("Enter a whole number.".to_string());
                Value::Null
            }
        },

        FormFieldType::Float {
            min_value,
            max_value,
        } => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => {
                if let Some(min) = min_value.filter(|min| n < *min) {
                    errors.push(format!("Ensure this value is greater than or equal to {min}."));
                }
                if let Some(max) = max_value.filter(|max| n > *max) {
                    errors.push(format!("Ensure this value is less than or equal to {max}."));
                }
                Value::Float(n)
            }
            _ => {
                errors.push("Enter a number.".to_string());
                Value::Null
            }
        },

        FormFieldType::Decimal {
            max_digits,
            decimal_places,
        } => {
            let raw = raw.trim();
            match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => {
                    let unsigned = raw.trim_start_matches(['-', '+']);
                    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
                    let total = int_part.trim_start_matches('0').len() + frac_part.len();
                    if let Some(max) = max_digits.filter(|max| total > *max as usize) {
                        errors.push(format!(
                            "Ensure that there are no more than {max} digits in total."
                        ));
                    }
                    if frac_part.len() > *decimal_places as usize {
                        errors.push(format!(
                            "Ensure that there are no more than {decimal_places} decimal places."
                        ));
                    }
                    Value::Float(n)
                }
                _ => {
                    errors.push("Enter a number.".to_string());
                    Value::Null
                }
            }
        }

        FormFieldType::Boolean => Value::Bool(truthy(raw)),

        FormFieldType::Date => {
            match chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(d) => Value::Date(d),
                Err(_) => {
                    errors.push("Enter a valid date (YYYY-MM-DD).".to_string());
                    Value::Null
                }
            }
        }

        FormFieldType::DateTime => {
            let raw = raw.trim();
            let parsed = [
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%dT%H:%M",
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%d %H:%M",
            ]
            .iter()
            .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok());
            if let Some(dt) = parsed {
                Value::DateTime(dt)
            } else {
                errors.push("Enter a valid date/time.".to_string());
                Value::Null
            }
        }

        FormFieldType::Email => {
            let raw = raw.trim();
            if !is_email(raw) {
                errors.push("Enter a valid email address.".to_string());
            }
            Value::String(raw.to_string())
        }

        FormFieldType::Url => {
            let raw = raw.trim();
            if !is_url(raw) {
                errors.push("Enter a valid URL.".to_string());
            }
            Value::String(raw.to_string())
        }

        FormFieldType::Uuid => match uuid::Uuid::parse_str(raw.trim()) {
            Ok(u) => Value::Uuid(u),
            Err(_) => {
                errors.push("Enter a valid UUID.".to_string());
                Value::Null
            }
        },

        FormFieldType::Choice { choices } | FormFieldType::MultipleChoice { choices } => {
            if !choices.iter().any(|(v, _)| v == raw) {
                errors.push(format!(
                    "Select a valid choice. {raw} is not one of the available choices."
                ));
            }
            Value::String(raw.to_string())
        }

        FormFieldType::Regex { regex } => match regex::Regex::new(regex) {
            Ok(re) if re.is_match(raw) => Value::String(raw.to_string()),
            Ok(_) => {
                errors.push("Enter a valid value.".to_string());
                Value::String(raw.to_string())
            }
            Err(e) => {
                errors.push(format!("Invalid regex: {e}"));
                Value::Null
            }
        },

        FormFieldType::Reference { .. } | FormFieldType::MultipleReference { .. } => {
            match raw.parse::<DocumentId>() {
                Ok(id) => Value::Id(id),
                Err(_) => {
                    errors.push(INVALID_REFERENCE.to_string());
                    Value::Null
                }
            }
        }

        FormFieldType::List(inner) => coerce(inner, raw, errors),

        FormFieldType::File
        | FormFieldType::Image
        | FormFieldType::FileList
        | FormFieldType::FileMap => Value::String(raw.to_string()),
    }
}

fn run_validators(field: &FormFieldDef, value: &Value, errors: &mut Vec<String>) {
    if errors.is_empty() {
        for validator in &field.validators {
            if let Err(e) = validator.validate(value) {
                errors.push(e.message);
            }
        }
    }
}

/// Cleans one raw submitted string into a typed value.
///
/// 1. Required check (a missing or empty value)
/// 2. Type coercion
/// 3. Type-specific constraints (length, range, pattern, choices)
/// 4. Custom validators
///
/// An empty optional field cleans to `Null`; an absent boolean cleans to
/// `false`.
pub fn clean_field_value(field: &FormFieldDef, raw: Option<&str>) -> Result<Value, Vec<String>> {
    let raw_str = raw.unwrap_or("");

    if matches!(field.field_type, FormFieldType::Boolean) {
        let value = truthy(raw_str);
        if field.required && !value {
            return Err(vec![field.required_message()]);
        }
        return Ok(Value::Bool(value));
    }

    let is_empty = match &field.field_type {
        FormFieldType::Char { strip: true, .. } => raw_str.trim().is_empty(),
        _ => raw_str.is_empty(),
    };
    if is_empty {
        if field.required {
            return Err(vec![field.required_message()]);
        }
        return Ok(Value::Null);
    }

    let mut errors = Vec::new();
    let value = coerce(&field.field_type, raw_str, &mut errors);
    if !errors.is_empty() {
        if let Some(custom) = field.error_messages.get("invalid") {
            errors = vec![custom.clone()];
        }
    }
    run_validators(field, &value, &mut errors);

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

/// Cleans the values of a multi-valued field into a list.
///
/// A single submitted value is split on commas, so text inputs and
/// `<select multiple>` both work. An empty optional field cleans to an
/// empty list.
pub fn clean_multi_value(field: &FormFieldDef, raw: &[String]) -> Result<Value, Vec<String>> {
    let parts: Vec<&str> = match raw {
        [single] => single.split(',').map(str::trim).collect(),
        many => many.iter().map(|s| s.trim()).collect(),
    };
    let parts: Vec<&str> = parts.into_iter().filter(|s| !s.is_empty()).collect();

    if parts.is_empty() {
        if field.required {
            return Err(vec![field.required_message()]);
        }
        return Ok(Value::List(Vec::new()));
    }

    let mut errors = Vec::new();
    let items: Vec<Value> = parts
        .iter()
        .map(|part| coerce(&field.field_type, part, &mut errors))
        .collect();
    let value = Value::List(items);
    run_validators(field, &value, &mut errors);

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

/// Checks an upload's name against an image field's allowed extensions.
pub fn check_image_name(name: &str) -> Result<(), String> {
    let (_, ext) = crate::files::split_extension(name);
    let ext = ext.trim_start_matches('.').to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err("Upload a valid image. The file must have an image extension.".to_string())
    }
}

/// Returns `true` when the submitted strings differ from the field's
/// initial value.
pub fn field_has_changed(field: &FormFieldDef, initial: Option<&Value>, raw: &[String]) -> bool {
    if field.disabled {
        return false;
    }
    if matches!(field.field_type, FormFieldType::Boolean) {
        let before = initial.and_then(Value::as_bool).unwrap_or(false);
        let after = raw.last().is_some_and(|r| truthy(r));
        return before != after;
    }
    let before = initial.map(Value::to_form_string).unwrap_or_default();
    let after = raw.join(",");
    before.trim() != after.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docforms_document::validators::MaxLengthValidator;

    fn char_field(min: Option<usize>, max: Option<usize>) -> FormFieldDef {
        FormFieldDef::new(
            "name",
            FormFieldType::Char {
                min_length: min,
                max_length: max,
                strip: true,
            },
        )
    }

    #[test]
    fn test_char_field_clean() {
        let field = char_field(Some(2), Some(50));
        assert_eq!(
            clean_field_value(&field, Some("  Alice  ")).unwrap(),
            Value::String("Alice".to_string())
        );
    }

    #[test]
    fn test_char_field_length_limits() {
        let err = clean_field_value(&char_field(Some(5), None), Some("Hi")).unwrap_err();
        assert_eq!(err, vec!["Ensure this value has at least 5 characters (it has 2)."]);
        let err = clean_field_value(&char_field(None, Some(3)), Some("Hello")).unwrap_err();
        assert!(err[0].contains("at most 3"));
    }

    #[test]
    fn test_required_and_optional_empty() {
        let field = char_field(None, None);
        assert_eq!(
            clean_field_value(&field, None).unwrap_err(),
            vec!["This field is required."]
        );
        assert_eq!(
            clean_field_value(&field, Some("   ")).unwrap_err(),
            vec!["This field is required."]
        );
        let optional = char_field(None, None).required(false);
        assert_eq!(clean_field_value(&optional, Some("")).unwrap(), Value::Null);
    }

    #[test]
    fn test_optional_empty_does_not_fall_back_to_initial() {
        let field = char_field(None, None).required(false).initial("old");
        assert_eq!(clean_field_value(&field, Some("")).unwrap(), Value::Null);
    }

    #[test]
    fn test_custom_messages() {
        let field = FormFieldDef::new(
            "n",
            FormFieldType::Integer {
                min_value: None,
                max_value: None,
            },
        )
        .error_message("required", "Give me a number")
        .error_message("invalid", "Digits only");
        assert_eq!(clean_field_value(&field, None).unwrap_err(), vec!["Give me a number"]);
        assert_eq!(clean_field_value(&field, Some("x")).unwrap_err(), vec!["Digits only"]);
    }

    #[test]
    fn test_integer_field() {
        let field = FormFieldDef::new(
            "age",
            FormFieldType::Integer {
                min_value: Some(0),
                max_value: Some(150),
            },
        );
        assert_eq!(clean_field_value(&field, Some("42")).unwrap(), Value::Int(42));
        assert!(clean_field_value(&field, Some("-1")).unwrap_err()[0].contains("greater than"));
        assert_eq!(
            clean_field_value(&field, Some("abc")).unwrap_err(),
            vec!["Enter a whole number."]
        );
    }

    #[test]
    fn test_decimal_field() {
        let field = FormFieldDef::new(
            "price",
            FormFieldType::Decimal {
                max_digits: Some(5),
                decimal_places: 2,
            },
        );
        assert_eq!(clean_field_value(&field, Some("123.45")).unwrap(), Value::Float(123.45));
        let errors = clean_field_value(&field, Some("1.234")).unwrap_err();
        assert!(errors[0].contains("2 decimal places"));
        assert!(clean_field_value(&field, Some("1234.56")).unwrap_err()[0].contains("5 digits"));
        assert!(clean_field_value(&field, Some("NaN")).is_err());
    }

    #[test]
    fn test_boolean_field() {
        let field = FormFieldDef::new("done", FormFieldType::Boolean).required(false);
        assert_eq!(clean_field_value(&field, Some("on")).unwrap(), Value::Bool(true));
        assert_eq!(clean_field_value(&field, None).unwrap(), Value::Bool(false));
        let must = FormFieldDef::new("agree", FormFieldType::Boolean);
        assert!(clean_field_value(&must, None).is_err());
    }

    #[test]
    fn test_date_and_datetime() {
        let d = FormFieldDef::new("d", FormFieldType::Date);
        assert!(matches!(clean_field_value(&d, Some("2024-01-15")).unwrap(), Value::Date(_)));
        assert_eq!(
            clean_field_value(&d, Some("15/01/2024")).unwrap_err(),
            vec!["Enter a valid date (YYYY-MM-DD)."]
        );
        let dt = FormFieldDef::new("dt", FormFieldType::DateTime);
        assert!(clean_field_value(&dt, Some("2024-01-15T10:30")).is_ok());
        assert!(clean_field_value(&dt, Some("2024-01-15 10:30:00")).is_ok());
        assert!(clean_field_value(&dt, Some("yesterday")).is_err());
    }

    #[test]
    fn test_email_url_uuid() {
        let email = FormFieldDef::new("email", FormFieldType::Email);
        assert!(clean_field_value(&email, Some("user@example.com")).is_ok());
        assert!(clean_field_value(&email, Some("nope")).is_err());
        let url = FormFieldDef::new("site", FormFieldType::Url);
        assert!(clean_field_value(&url, Some("https://example.com/a")).is_ok());
        assert!(clean_field_value(&url, Some("ftp:/x")).is_err());
        let u = FormFieldDef::new("u", FormFieldType::Uuid);
        assert!(clean_field_value(&u, Some("550e8400-e29b-41d4-a716-446655440000")).is_ok());
        assert!(clean_field_value(&u, Some("xyz")).is_err());
    }

    #[test]
    fn test_choice_field() {
        let field = FormFieldDef::new(
            "size",
            FormFieldType::Choice {
                choices: vec![("S".into(), "Small".into()), ("L".into(), "Large".into())],
            },
        );
        assert_eq!(clean_field_value(&field, Some("S")).unwrap(), Value::from("S"));
        assert_eq!(
            clean_field_value(&field, Some("M")).unwrap_err(),
            vec!["Select a valid choice. M is not one of the available choices."]
        );
    }

    #[test]
    fn test_regex_field() {
        let field = FormFieldDef::new(
            "code",
            FormFieldType::Regex {
                regex: "^[A-Z]{3}$".into(),
            },
        );
        assert!(clean_field_value(&field, Some("ABC")).is_ok());
        assert_eq!(
            clean_field_value(&field, Some("abc")).unwrap_err(),
            vec!["Enter a valid value."]
        );
    }

    #[test]
    fn test_reference_field() {
        let field = FormFieldDef::new(
            "owner",
            FormFieldType::Reference {
                document: "User".into(),
            },
        );
        let id = DocumentId::new();
        assert_eq!(
            clean_field_value(&field, Some(&id.to_string())).unwrap(),
            Value::Id(id)
        );
        assert_eq!(
            clean_field_value(&field, Some("42")).unwrap_err(),
            vec![INVALID_REFERENCE]
        );
    }

    #[test]
    fn test_multi_values() {
        let tags = FormFieldDef::new(
            "tags",
            FormFieldType::MultipleChoice {
                choices: vec![("a".into(), "A".into()), ("b".into(), "B".into())],
            },
        );
        assert_eq!(
            clean_multi_value(&tags, &["a, b".to_string()]).unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(
            clean_multi_value(&tags, &["a".to_string(), "b".to_string()]).unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert!(clean_multi_value(&tags, &["c".to_string()]).is_err());
        assert!(clean_multi_value(&tags, &[]).is_err());
        let optional = tags.clone().required(false);
        assert_eq!(clean_multi_value(&optional, &[]).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn test_list_of_integers() {
        let field = FormFieldDef::new(
            "scores",
            FormFieldType::List(Box::new(FormFieldType::Integer {
                min_value: None,
                max_value: None,
            })),
        );
        assert_eq!(
            clean_multi_value(&field, &["1,2,3".to_string()]).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(
            clean_multi_value(&field, &["1,x".to_string()]).unwrap_err(),
            vec!["Enter a whole number."]
        );
    }

    #[test]
    fn test_validators_run_after_coercion() {
        let field = char_field(None, None).validator(MaxLengthValidator::new(3));
        assert!(clean_field_value(&field, Some("abc")).is_ok());
        assert!(clean_field_value(&field, Some("abcd")).is_err());
    }

    #[test]
    fn test_image_names() {
        assert!(check_image_name("photo.JPG").is_ok());
        assert!(check_image_name("notes.txt").is_err());
        assert!(check_image_name("README").is_err());
    }

    #[test]
    fn test_field_has_changed() {
        let field = char_field(None, None);
        let initial = Value::from("milk");
        assert!(!field_has_changed(&field, Some(&initial), &["milk".to_string()]));
        assert!(field_has_changed(&field, Some(&initial), &["eggs".to_string()]));
        assert!(!field_has_changed(&field, None, &[]));

        let flag = FormFieldDef::new("done", FormFieldType::Boolean);
        assert!(!field_has_changed(&flag, None, &[]));
        assert!(field_has_changed(&flag, None, &["on".to_string()]));
    }

    #[test]
    fn test_default_widgets() {
        assert_eq!(
            default_widget_for_field_type(&FormFieldType::Boolean),
            WidgetType::CheckboxInput
        );
        assert_eq!(
            default_widget_for_field_type(&FormFieldType::File),
            WidgetType::ClearableFileInput
        );
        assert_eq!(
            default_widget_for_field_type(&FormFieldType::MultipleReference {
                document: "Tag".into()
            }),
            WidgetType::SelectMultiple
        );
    }
}
