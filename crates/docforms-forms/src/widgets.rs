//! Widgets render form fields as HTML and read their values back.
//!
//! Each widget knows how to render itself for a field name and current
//! value, extract the raw value from submitted [`FormData`], and produce
//! the `id` its `<label>` should point at. Values are HTML-escaped on
//! output.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

use docforms_core::utils::text::escape;

use crate::data::FormData;

/// Enumerates the built-in widget types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<input type="url">`.
    UrlInput,
    /// `<input type="password">`.
    PasswordInput,
    /// `<input type="hidden">`.
    HiddenInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
    /// `<input type="date">`.
    DateInput,
    /// `<input type="datetime-local">`.
    DateTimeInput,
    /// `<input type="file">`.
    FileInput,
    /// `<input type="file">` with a clear checkbox.
    ClearableFileInput,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::EmailInput => "EmailInput",
            Self::UrlInput => "UrlInput",
            Self::PasswordInput => "PasswordInput",
            Self::HiddenInput => "HiddenInput",
            Self::Textarea => "Textarea",
            Self::CheckboxInput => "CheckboxInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::DateInput => "DateInput",
            Self::DateTimeInput => "DateTimeInput",
            Self::FileInput => "FileInput",
            Self::ClearableFileInput => "ClearableFileInput",
        };
        write!(f, "{name}")
    }
}

/// An HTML form widget.
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget type enum variant.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget as an HTML string.
    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String;

    /// Extracts the raw value from submitted data. `None` when nothing was
    /// submitted under `name`.
    fn value_from_data(&self, data: &FormData, name: &str) -> Option<String> {
        data.get(name).map(String::from)
    }

    /// Returns the `id` a label targeting this widget should use.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Formats attributes as ` key="value"` pairs in sorted order.
fn render_attrs(attrs: &HashMap<String, String>) -> String {
    let mut parts: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape(v)))
        .collect();
    parts.sort();
    parts.concat()
}

/// A single `<input>` element of a fixed type.
#[derive(Debug, Clone)]
pub struct Input {
    input_type: &'static str,
    widget_type: WidgetType,
    render_value: bool,
}

impl Input {
    const fn new(input_type: &'static str, widget_type: WidgetType) -> Self {
        Self {
            input_type,
            widget_type,
            render_value: true,
        }
    }

    /// `<input type="text">`.
    pub const fn text() -> Self {
        Self::new("text", WidgetType::TextInput)
    }

    /// `<input type="number">`.
    pub const fn number() -> Self {
        Self::new("number", WidgetType::NumberInput)
    }

    /// `<input type="email">`.
    pub const fn email() -> Self {
        Self::new("email", WidgetType::EmailInput)
    }

    /// `<input type="url">`.
    pub const fn url() -> Self {
        Self::new("url", WidgetType::UrlInput)
    }

    /// `<input type="hidden">`.
    pub const fn hidden() -> Self {
        Self::new("hidden", WidgetType::HiddenInput)
    }

    /// `<input type="date">`.
    pub const fn date() -> Self {
        Self::new("date", WidgetType::DateInput)
    }

    /// `<input type="datetime-local">`.
    pub const fn datetime() -> Self {
        Self::new("datetime-local", WidgetType::DateTimeInput)
    }

    /// `<input type="password">`. The current value is never rendered.
    pub const fn password() -> Self {
        Self {
            input_type: "password",
            widget_type: WidgetType::PasswordInput,
            render_value: false,
        }
    }

    /// `<input type="file">`. File inputs never carry a value.
    pub const fn file() -> Self {
        Self {
            input_type: "file",
            widget_type: WidgetType::FileInput,
            render_value: false,
        }
    }
}

impl Widget for Input {
    fn widget_type(&self) -> WidgetType {
        self.widget_type.clone()
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        let value_attr = if self.render_value {
            format!(r#" value="{}""#, escape(value.unwrap_or("")))
        } else {
            String::new()
        };
        format!(
            r#"<input type="{}" name="{name}"{value_attr}{} />"#,
            self.input_type,
            render_attrs(attrs)
        )
    }
}

/// A `<textarea>` widget.
#[derive(Debug, Clone)]
pub struct Textarea;

impl Widget for Textarea {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Textarea
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        format!(
            r#"<textarea name="{name}"{}>{}</textarea>"#,
            render_attrs(attrs),
            escape(value.unwrap_or(""))
        )
    }
}

/// An `<input type="checkbox">` widget.
#[derive(Debug, Clone)]
pub struct CheckboxInput;

impl Widget for CheckboxInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxInput
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        let checked = value.is_some_and(|v| matches!(v, "true" | "on" | "1"));
        let checked_attr = if checked { " checked" } else { "" };
        format!(
            r#"<input type="checkbox" name="{name}"{checked_attr}{} />"#,
            render_attrs(attrs)
        )
    }
}

fn render_options(choices: &[(String, String)], selected: &[&str]) -> String {
    let mut options = String::new();
    for (val, label) in choices {
        let flag = if selected.contains(&val.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            r#"<option value="{}"{flag}>{}</option>"#,
            escape(val),
            escape(label)
        );
    }
    options
}

/// A `<select>` widget.
#[derive(Debug, Clone)]
pub struct Select {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl Select {
    /// Creates a `Select` with the given choices.
    pub const fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        let selected: Vec<&str> = value.into_iter().collect();
        format!(
            r#"<select name="{name}"{}>{}</select>"#,
            render_attrs(attrs),
            render_options(&self.choices, &selected)
        )
    }
}

/// A `<select multiple>` widget. Values travel as a comma-joined string.
#[derive(Debug, Clone)]
pub struct SelectMultiple {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl SelectMultiple {
    /// Creates a `SelectMultiple` with the given choices.
    pub const fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for SelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::SelectMultiple
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        let selected: Vec<&str> = value.map_or_else(Vec::new, |v| v.split(',').collect());
        format!(
            r#"<select name="{name}" multiple{}>{}</select>"#,
            render_attrs(attrs),
            render_options(&self.choices, &selected)
        )
    }

    fn value_from_data(&self, data: &FormData, name: &str) -> Option<String> {
        let values = data.get_list(name);
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }
}

/// A file input with a "clear" checkbox for optional file fields.
///
/// Ticking the checkbox submits `{name}-clear`, which the binder turns into
/// an explicit clear signal.
#[derive(Debug, Clone)]
pub struct ClearableFileInput;

impl ClearableFileInput {
    /// The name of the clear checkbox for a file input called `name`.
    pub fn clear_checkbox_name(name: &str) -> String {
        format!("{name}-clear")
    }
}

impl Widget for ClearableFileInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::ClearableFileInput
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        let mut html = String::new();
        if let Some(val) = value.filter(|v| !v.is_empty()) {
            let _ = write!(
                html,
                r#"<span>Currently: {}</span> <input type="checkbox" name="{}" /> Clear<br />"#,
                escape(val),
                Self::clear_checkbox_name(name)
            );
        }
        let _ = write!(
            html,
            r#"<input type="file" name="{name}"{} />"#,
            render_attrs(attrs)
        );
        html
    }

    fn value_from_data(&self, data: &FormData, name: &str) -> Option<String> {
        if data.get(&Self::clear_checkbox_name(name)).is_some() {
            return Some(String::new());
        }
        data.file(name).map(|f| f.name.clone())
    }
}

/// Creates a boxed widget for a widget type, with no choices.
pub fn create_widget(widget_type: &WidgetType) -> Box<dyn Widget> {
    create_widget_with_choices(widget_type, &[])
}

/// Creates a boxed widget, populating choices for select widgets.
pub fn create_widget_with_choices(
    widget_type: &WidgetType,
    choices: &[(String, String)],
) -> Box<dyn Widget> {
    match widget_type {
        WidgetType::TextInput => Box::new(Input::text()),
        WidgetType::NumberInput => Box::new(Input::number()),
        WidgetType::EmailInput => Box::new(Input::email()),
        WidgetType::UrlInput => Box::new(Input::url()),
        WidgetType::PasswordInput => Box::new(Input::password()),
        WidgetType::HiddenInput => Box::new(Input::hidden()),
        WidgetType::DateInput => Box::new(Input::date()),
        WidgetType::DateTimeInput => Box::new(Input::datetime()),
        WidgetType::FileInput => Box::new(Input::file()),
        WidgetType::Textarea => Box::new(Textarea),
        WidgetType::CheckboxInput => Box::new(CheckboxInput),
        WidgetType::Select => Box::new(Select::new(choices.to_vec())),
        WidgetType::SelectMultiple => Box::new(SelectMultiple::new(choices.to_vec())),
        WidgetType::ClearableFileInput => Box::new(ClearableFileInput),
    }
}
