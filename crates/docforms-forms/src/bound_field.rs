//! Bound fields: form fields paired with their current value and errors.
//!
//! A [`BoundField`] is what a page iterates over when rendering a form. It
//! owns a snapshot of the field's metadata, the value to show (the
//! submission when bound, the initial value otherwise) and the widget.

use std::collections::HashMap;
use std::fmt::Write as _;

use docforms_core::utils::text::escape;

use crate::fields::{FormFieldDef, FormFieldType};
use crate::widgets::{self, Widget};

/// A form field bound to data and validation state.
pub struct BoundField {
    /// The field's HTML name attribute.
    pub name: String,
    /// Snapshot of the field definition.
    pub field: BoundFieldDef,
    /// The value rendered into the widget.
    pub data: Option<String>,
    /// Validation error messages for this field.
    pub errors: Vec<String>,
    /// The widget instance used for rendering.
    pub widget: Box<dyn Widget>,
}

/// Field metadata owned by a [`BoundField`].
#[derive(Debug, Clone)]
pub struct BoundFieldDef {
    /// The field name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Help text.
    pub help_text: String,
    /// Whether the field is required.
    pub required: bool,
    /// Whether the field is disabled.
    pub disabled: bool,
    /// Maximum length for character fields.
    pub max_length: Option<usize>,
}

/// The HTML name of a field, with the form prefix applied.
pub fn html_name(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}-{name}"),
        _ => name.to_string(),
    }
}

impl BoundField {
    /// Creates a bound field from a definition and current state.
    pub fn new(
        field_def: &FormFieldDef,
        data: Option<String>,
        errors: Vec<String>,
        prefix: Option<&str>,
    ) -> Self {
        let widget = widgets::create_widget_with_choices(
            &field_def.widget,
            field_def.field_type.choices(),
        );
        let max_length = match field_def.field_type {
            FormFieldType::Char { max_length, .. } => max_length,
            _ => None,
        };

        Self {
            name: html_name(prefix, &field_def.name),
            field: BoundFieldDef {
                name: field_def.name.clone(),
                label: field_def.label.clone(),
                help_text: field_def.help_text.clone(),
                required: field_def.required,
                disabled: field_def.disabled,
                max_length,
            },
            data,
            errors,
            widget,
        }
    }

    /// Renders the widget HTML.
    pub fn render(&self, extra_attrs: &HashMap<String, String>) -> String {
        let mut attrs = extra_attrs.clone();
        attrs.entry("id".to_string()).or_insert_with(|| self.auto_id());
        if self.field.disabled {
            attrs.insert("disabled".to_string(), "disabled".to_string());
        }
        if let Some(max) = self.field.max_length {
            attrs.entry("maxlength".to_string()).or_insert_with(|| max.to_string());
        }
        self.widget.render(&self.name, self.data.as_deref(), &attrs)
    }

    /// Renders a `<label>` element for this field.
    pub fn label_tag(&self) -> String {
        let label_id = self.widget.id_for_label(&self.auto_id());
        let label = escape(&self.field.label);
        if label_id.is_empty() {
            format!("<label>{label}</label>")
        } else {
            format!(r#"<label for="{label_id}">{label}</label>"#)
        }
    }

    /// The generated HTML `id`.
    pub fn auto_id(&self) -> String {
        format!("id_{}", self.name)
    }

    /// Returns `true` if this field has any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders the error list as an HTML `<ul>` element.
    pub fn errors_as_ul(&self) -> String {
        errors_as_ul(&self.errors)
    }

    /// Renders the field as a paragraph: errors, label, widget, help text.
    pub fn as_p(&self) -> String {
        let mut html = self.errors_as_ul();
        let _ = write!(html, "<p>{} {}", self.label_tag(), self.render(&HashMap::new()));
        if !self.field.help_text.is_empty() {
            let _ = write!(
                html,
                r#" <span class="helptext">{}</span>"#,
                escape(&self.field.help_text)
            );
        }
        html.push_str("</p>");
        html
    }
}

/// Renders messages as `<ul class="errorlist">`; empty input renders nothing.
pub fn errors_as_ul(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(e)))
        .collect();
    format!(r#"<ul class="errorlist">{items}</ul>"#)
}
