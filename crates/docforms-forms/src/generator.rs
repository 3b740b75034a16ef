//! Mapping document fields to form fields.
//!
//! [`DefaultFieldGenerator`] is a closed match over [`DocFieldType`]. It
//! runs once per field when a form descriptor is built, never per request.
//! Field types with no sensible form input (raw object ids, embedded
//! documents, maps of non-file values) produce `None` and are dropped.

use docforms_core::utils::text::{capfirst, pretty_name};
use docforms_document::{DocFieldDef, DocFieldType};

use crate::fields::{default_widget_for_field_type, FormFieldDef, FormFieldType};
use crate::widgets::WidgetType;

/// Label of the empty choice offered by optional select fields.
pub const BLANK_CHOICE_LABEL: &str = "---------";

/// Produces a form field for a document field.
pub trait FieldGenerator: Send + Sync {
    /// Returns the form field for `field`, or `None` when the field cannot
    /// be edited through a form. `widget` overrides the default widget.
    fn generate(&self, field: &DocFieldDef, widget: Option<&WidgetType>) -> Option<FormFieldDef>;
}

/// The built-in mapping from document field types to form field types.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFieldGenerator;

impl DefaultFieldGenerator {
    fn string_choices(field: &DocFieldDef) -> Option<Vec<(String, String)>> {
        field.choices.as_ref().map(|choices| {
            choices
                .iter()
                .map(|(value, label)| (value.to_form_string(), label.clone()))
                .collect()
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn form_type(field: &DocFieldDef, field_type: &DocFieldType) -> Option<FormFieldType> {
        let form_type = match field_type {
            DocFieldType::String => {
                if let Some(mut choices) = Self::string_choices(field) {
                    if !field.required {
                        choices.insert(0, (String::new(), BLANK_CHOICE_LABEL.to_string()));
                    }
                    FormFieldType::Choice { choices }
                } else if let Some(regex) = &field.regex {
                    FormFieldType::Regex {
                        regex: regex.clone(),
                    }
                } else {
                    FormFieldType::Char {
                        min_length: field.min_length,
                        max_length: field.max_length,
                        strip: true,
                    }
                }
            }
            DocFieldType::Email => FormFieldType::Email,
            DocFieldType::Url => FormFieldType::Url,
            DocFieldType::Int => FormFieldType::Integer {
                min_value: field.min_value.map(|v| v as i64),
                max_value: field.max_value.map(|v| v as i64),
            },
            DocFieldType::Float => FormFieldType::Float {
                min_value: field.min_value,
                max_value: field.max_value,
            },
            DocFieldType::Decimal { precision } => FormFieldType::Decimal {
                max_digits: None,
                decimal_places: *precision,
            },
            DocFieldType::Bool => FormFieldType::Boolean,
            DocFieldType::Date => FormFieldType::Date,
            DocFieldType::DateTime => FormFieldType::DateTime,
            DocFieldType::Uuid => FormFieldType::Uuid,
            DocFieldType::Reference { document } => FormFieldType::Reference {
                document: document.clone(),
            },
            DocFieldType::File => FormFieldType::File,
            DocFieldType::Image => FormFieldType::Image,
            DocFieldType::List(inner) => match inner.as_ref() {
                DocFieldType::Reference { document } => FormFieldType::MultipleReference {
                    document: document.clone(),
                },
                DocFieldType::File | DocFieldType::Image => FormFieldType::FileList,
                DocFieldType::String if field.choices.is_some() => FormFieldType::MultipleChoice {
                    choices: Self::string_choices(field).unwrap_or_default(),
                },
                DocFieldType::List(_)
                | DocFieldType::Map(_)
                | DocFieldType::Embedded(_)
                | DocFieldType::ObjectId => return None,
                scalar => FormFieldType::List(Box::new(Self::element_type(scalar)?)),
            },
            DocFieldType::Map(inner) if inner.is_file() => FormFieldType::FileMap,
            DocFieldType::Map(_) | DocFieldType::Embedded(_) | DocFieldType::ObjectId => {
                return None
            }
        };
        Some(form_type)
    }

    /// The form type of one list element. Constraints on the list field
    /// itself are checked by the document.
    fn element_type(field_type: &DocFieldType) -> Option<FormFieldType> {
        Self::form_type(&DocFieldDef::new("", field_type.clone()), field_type)
    }
}

impl FieldGenerator for DefaultFieldGenerator {
    fn generate(&self, field: &DocFieldDef, widget: Option<&WidgetType>) -> Option<FormFieldDef> {
        let form_type = Self::form_type(field, &field.field_type)?;
        let required = field.required && !matches!(form_type, FormFieldType::Boolean);
        let label = field
            .verbose_name
            .as_deref()
            .map_or_else(|| pretty_name(&field.name), capfirst);
        let widget = widget
            .cloned()
            .unwrap_or_else(|| default_widget_for_field_type(&form_type));

        let mut form_field = FormFieldDef::new(field.name.clone(), form_type)
            .required(required)
            .label(label)
            .help_text(field.help_text.clone())
            .widget(widget);
        if let Some(default) = &field.default {
            form_field = form_field.initial(default.produce());
        }
        Some(form_field)
    }
}
