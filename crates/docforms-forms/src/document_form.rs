//! Form descriptors built from document schemas.
//!
//! A [`FormDescriptor`] is the declarative half of a document form: the
//! ordered form fields derived from a schema, the include/exclude lists that
//! restrict them, and the hooks that run during validation. It is built once
//! per form type by [`build_form_descriptor`] (usually through
//! [`descriptor_cache::get_or_build`](crate::descriptor_cache::get_or_build))
//! and shared by every bound form of that type.
//!
//! Naming a field the schema does not have is a configuration error raised
//! here, when the descriptor is built, and never later at request time.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use docforms_core::{DocFormsError, DocFormsResult, ValidationError};
use docforms_document::{Document, DocumentSchema, Value, ID_FIELD};

use crate::fields::FormFieldDef;
use crate::generator::{DefaultFieldGenerator, FieldGenerator};
use crate::widgets::WidgetType;

/// Field errors keyed by field name, plus the `__all__` bucket.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Cleaned values keyed by field name.
pub type CleanedData = BTreeMap<String, Value>;

/// A form-level validation hook. It sees every cleaned value and the field
/// errors collected so far.
pub type FormClean =
    Arc<dyn Fn(&CleanedData, &ErrorMap) -> Result<(), ValidationError> + Send + Sync>;

/// Declaration of a document form type.
///
/// # Examples
///
/// ```
/// use docforms_document::{DocFieldDef, DocFieldType, DocumentSchema};
/// use docforms_forms::document_form::{build_form_descriptor, DocumentFormConfig};
///
/// let schema = DocumentSchema::new("Item")
///     .field(DocFieldDef::new("user", DocFieldType::Reference { document: "User".into() }))
///     .field(DocFieldDef::new("text", DocFieldType::String).required().max_length(200))
///     .build();
/// let descriptor = build_form_descriptor(
///     DocumentFormConfig::new("ItemForm", schema).exclude(["user"]),
/// )
/// .unwrap();
/// assert_eq!(descriptor.field_names(), vec!["text"]);
/// ```
pub struct DocumentFormConfig {
    name: String,
    schema: Arc<DocumentSchema>,
    fields: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    widgets: HashMap<String, WidgetType>,
    labels: HashMap<String, String>,
    help_texts: HashMap<String, String>,
    declared: Vec<FormFieldDef>,
    embedded_field: Option<String>,
    clean: Option<FormClean>,
    validate_unique: bool,
    generator: Arc<dyn FieldGenerator>,
}

impl DocumentFormConfig {
    /// Starts declaring a form called `name` over `schema`.
    pub fn new(name: impl Into<String>, schema: Arc<DocumentSchema>) -> Self {
        Self {
            name: name.into(),
            schema,
            fields: None,
            exclude: None,
            widgets: HashMap::new(),
            labels: HashMap::new(),
            help_texts: HashMap::new(),
            declared: Vec::new(),
            embedded_field: None,
            clean: None,
            validate_unique: true,
            generator: Arc::new(DefaultFieldGenerator),
        }
    }

    /// Restricts the form to these schema fields.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Leaves these schema fields off the form.
    #[must_use]
    pub fn exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(exclude.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the widget of a generated field.
    #[must_use]
    pub fn widget(mut self, field: impl Into<String>, widget: WidgetType) -> Self {
        self.widgets.insert(field.into(), widget);
        self
    }

    /// Overrides the label of a generated field.
    #[must_use]
    pub fn label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field.into(), label.into());
        self
    }

    /// Overrides the help text of a generated field.
    #[must_use]
    pub fn help_text(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.help_texts.insert(field.into(), text.into());
        self
    }

    /// Declares a form field explicitly. It replaces the generated field of
    /// the same name, or is appended after the schema fields.
    #[must_use]
    pub fn declare(mut self, field: FormFieldDef) -> Self {
        self.declared.push(field);
        self
    }

    /// Names the parent field an embedded document form writes into.
    #[must_use]
    pub fn embedded_field(mut self, field: impl Into<String>) -> Self {
        self.embedded_field = Some(field.into());
        self
    }

    /// Installs a form-level validation hook.
    #[must_use]
    pub fn clean<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CleanedData, &ErrorMap) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.clean = Some(Arc::new(hook));
        self
    }

    /// Turns the uniqueness check on or off. On by default.
    #[must_use]
    pub const fn validate_unique(mut self, enabled: bool) -> Self {
        self.validate_unique = enabled;
        self
    }

    /// Replaces the field generator.
    #[must_use]
    pub fn generator(mut self, generator: impl FieldGenerator + 'static) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    fn includes(&self, name: &str) -> bool {
        field_selected(self.fields.as_deref(), self.exclude.as_deref(), name)
    }
}

/// Returns `true` if `name` passes an allow list and a deny list. A missing
/// list lets every name through.
pub fn field_selected(fields: Option<&[String]>, exclude: Option<&[String]>, name: &str) -> bool {
    fields.map_or(true, |fields| fields.iter().any(|f| f == name))
        && exclude.map_or(true, |exclude| !exclude.iter().any(|f| f == name))
}

/// The built, immutable description of a document form type.
pub struct FormDescriptor {
    name: String,
    schema: Arc<DocumentSchema>,
    fields: Vec<FormFieldDef>,
    restrict: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    embedded_field: Option<String>,
    clean: Option<FormClean>,
    validate_unique: bool,
}

impl FormDescriptor {
    /// The form type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema the form edits.
    pub const fn schema(&self) -> &Arc<DocumentSchema> {
        &self.schema
    }

    /// Form fields in schema declaration order, declared extras last.
    pub fn fields(&self) -> &[FormFieldDef] {
        &self.fields
    }

    /// Form field names in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Looks up a form field by name.
    pub fn field(&self, name: &str) -> Option<&FormFieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The configured allow-list, if any.
    pub fn restrict(&self) -> Option<&[String]> {
        self.restrict.as_deref()
    }

    /// The configured deny-list, if any.
    pub fn exclude(&self) -> Option<&[String]> {
        self.exclude.as_deref()
    }

    /// Returns `true` if a schema field is inside the form's restriction.
    pub fn includes(&self, name: &str) -> bool {
        field_selected(self.restrict.as_deref(), self.exclude.as_deref(), name)
    }

    /// The parent field an embedded form writes into.
    pub fn embedded_field(&self) -> Option<&str> {
        self.embedded_field.as_deref()
    }

    /// Runs the form-level hook, if any.
    pub fn run_clean(
        &self,
        cleaned: &CleanedData,
        errors: &ErrorMap,
    ) -> Result<(), ValidationError> {
        self.clean
            .as_ref()
            .map_or(Ok(()), |hook| hook(cleaned, errors))
    }

    /// Whether validation checks uniqueness constraints.
    pub const fn validates_unique(&self) -> bool {
        self.validate_unique
    }
}

impl fmt::Debug for FormDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormDescriptor")
            .field("name", &self.name)
            .field("schema", &self.schema.name())
            .field("fields", &self.field_names())
            .field("restrict", &self.restrict)
            .field("exclude", &self.exclude)
            .field("embedded_field", &self.embedded_field)
            .field("clean", &self.clean.is_some())
            .field("validate_unique", &self.validate_unique)
            .finish()
    }
}

/// Builds a form descriptor from its declaration.
///
/// # Errors
///
/// Returns [`DocFormsError::Configuration`] naming every field in `fields`
/// that is neither a form-editable schema field nor explicitly declared.
pub fn build_form_descriptor(config: DocumentFormConfig) -> DocFormsResult<FormDescriptor> {
    let schema = Arc::clone(&config.schema);
    let mut fields = Vec::new();
    let mut unknown = Vec::new();

    for doc_field in schema.fields() {
        let name = doc_field.name.as_str();
        if name == ID_FIELD || !config.includes(name) {
            continue;
        }
        if let Some(declared) = config.declared.iter().find(|f| f.name == name) {
            fields.push(declared.clone());
            continue;
        }
        match config.generator.generate(doc_field, config.widgets.get(name)) {
            Some(mut form_field) => {
                if let Some(label) = config.labels.get(name) {
                    form_field.label.clone_from(label);
                }
                if let Some(help) = config.help_texts.get(name) {
                    form_field.help_text.clone_from(help);
                }
                fields.push(form_field);
            }
            None => {
                if config.fields.is_some() {
                    unknown.push(name.to_string());
                }
            }
        }
    }

    if let Some(restrict) = &config.fields {
        for name in restrict {
            let known = name == ID_FIELD
                || schema.get_field(name).is_some()
                || config.declared.iter().any(|f| &f.name == name);
            if !known {
                unknown.push(name.clone());
            }
        }
    }
    if !unknown.is_empty() {
        return Err(DocFormsError::Configuration(format!(
            "Unknown field(s) ({}) specified for {}",
            unknown.join(", "),
            schema.name()
        )));
    }

    for declared in &config.declared {
        if schema.get_field(&declared.name).is_none() {
            fields.push(declared.clone());
        }
    }

    tracing::debug!(
        form = %config.name,
        document = schema.name(),
        fields = fields.len(),
        "form descriptor built"
    );
    Ok(FormDescriptor {
        name: config.name,
        schema,
        fields,
        restrict: config.fields,
        exclude: config.exclude,
        embedded_field: config.embedded_field,
        clean: config.clean,
        validate_unique: config.validate_unique,
    })
}

/// Describes `schema` with default settings: the form is named after the
/// schema, with optional allow/deny lists and widget overrides.
pub fn describe(
    schema: &Arc<DocumentSchema>,
    fields: Option<&[&str]>,
    exclude: Option<&[&str]>,
    widgets: Option<&HashMap<String, WidgetType>>,
) -> DocFormsResult<FormDescriptor> {
    let mut config = DocumentFormConfig::new(format!("{}Form", schema.name()), Arc::clone(schema));
    if let Some(fields) = fields {
        config = config.fields(fields.iter().copied());
    }
    if let Some(exclude) = exclude {
        config = config.exclude(exclude.iter().copied());
    }
    if let Some(widgets) = widgets {
        config.widgets.clone_from(widgets);
    }
    build_form_descriptor(config)
}

/// Extracts a document's values as initial form data, honoring the
/// allow/deny lists. The identity is never included.
pub fn document_to_dict(
    document: &Document,
    fields: Option<&[String]>,
    exclude: Option<&[String]>,
) -> CleanedData {
    document
        .schema()
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .filter(|name| *name != ID_FIELD)
        .filter(|name| field_selected(fields, exclude, name))
        .filter(|name| document.has(name))
        .map(|name| (name.to_string(), document.get(name).clone()))
        .collect()
}
