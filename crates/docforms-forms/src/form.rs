//! The [`Form`] trait, plain forms and document-backed forms.
//!
//! [`BaseForm`] binds submitted data to a list of field definitions and
//! cleans it. [`DocumentForm`] layers a document on top: its fields come
//! from a shared [`FormDescriptor`], validation also runs the document's own
//! checks and uniqueness constraints, and a valid form can be saved through
//! the document store.
//!
//! A document form moves through [`FormState`]:
//!
//! ```text
//! Unbound -> Bound -> Cleaning -> Validated -> Constructed -> Saved
//!                                          \-> Rejected
//! ```
//!
//! Only a Constructed (or already Saved) form can be saved.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn, Instrument};

use docforms_core::logging::form_span;
use docforms_core::settings::SETTINGS;
use docforms_core::{DocFormsError, DocFormsResult, ValidationError, NON_FIELD_ERRORS};
use docforms_document::{
    BlobStore, Document, DocumentStore, MemoryBlobStore, MemoryDocumentStore, Value, ID_FIELD,
};

use crate::bound_field::{errors_as_ul, html_name, BoundField};
use crate::data::FormData;
use crate::document_form::{document_to_dict, CleanedData, ErrorMap, FormClean, FormDescriptor};
use crate::fields::{field_has_changed, FormFieldDef};
use crate::files::{resolve_pending, PendingUpload};
use crate::unique::{validate_unique, FieldError};
use crate::validation::{self, compute_exclusions, merge_validation_error, validate_document};
use crate::widgets::ClearableFileInput;

/// The core form trait.
///
/// `is_valid` is async because document forms consult the store for
/// uniqueness. A store failure is an `Err`, not an invalid form.
#[async_trait]
pub trait Form: Send + Sync {
    /// The form's field definitions.
    fn fields(&self) -> &[FormFieldDef];

    /// The initial values shown by an unbound form.
    fn initial(&self) -> &CleanedData;

    /// The form prefix, if any.
    fn prefix(&self) -> Option<&str>;

    /// Binds submitted data, clearing earlier results.
    fn bind(&mut self, data: &FormData);

    /// Returns `true` once data has been bound.
    fn is_bound(&self) -> bool;

    /// Validates the bound data.
    async fn is_valid(&mut self) -> DocFormsResult<bool>;

    /// Errors keyed by field name; form-level errors are under `__all__`.
    fn errors(&self) -> &ErrorMap;

    /// The cleaned values of the fields that passed cleaning.
    fn cleaned_data(&self) -> &CleanedData;

    /// Bound fields for rendering, in field order.
    fn bound_fields(&self) -> Vec<BoundField>;

    /// Form-level errors.
    fn non_field_errors(&self) -> &[String] {
        self.errors()
            .get(NON_FIELD_ERRORS)
            .map_or(&[], Vec::as_slice)
    }

    /// Renders the whole form as paragraphs, non-field errors first.
    fn as_p(&self) -> String {
        let mut html = errors_as_ul(self.non_field_errors());
        for field in self.bound_fields() {
            html.push_str(&field.as_p());
        }
        html
    }
}

/// A form over an explicit list of fields.
pub struct BaseForm {
    field_defs: Vec<FormFieldDef>,
    initial_data: CleanedData,
    prefix: Option<String>,
    data: Option<FormData>,
    errors: ErrorMap,
    cleaned_data: CleanedData,
    uploads: BTreeMap<String, PendingUpload>,
    clean_hook: Option<FormClean>,
}

impl BaseForm {
    /// Creates an unbound form over `fields`.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            field_defs: fields,
            initial_data: CleanedData::new(),
            prefix: None,
            data: None,
            errors: ErrorMap::new(),
            cleaned_data: CleanedData::new(),
            uploads: BTreeMap::new(),
            clean_hook: None,
        }
    }

    /// Sets initial values, replacing any set before.
    #[must_use]
    pub fn with_initial(mut self, initial: CleanedData) -> Self {
        self.initial_data = initial;
        self
    }

    /// Sets the form prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Installs a form-level validation hook run after field cleaning.
    #[must_use]
    pub fn with_clean<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CleanedData, &ErrorMap) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.clean_hook = Some(Arc::new(hook));
        self
    }

    /// Appends a field.
    pub fn add_field(&mut self, field: FormFieldDef) {
        self.field_defs.push(field);
    }

    pub(crate) fn set_initial(&mut self, initial: CleanedData) {
        self.initial_data = initial;
    }

    pub(crate) fn set_prefix(&mut self, prefix: Option<String>) {
        self.prefix = prefix;
    }

    /// The bound data, if any.
    pub const fn data(&self) -> Option<&FormData> {
        self.data.as_ref()
    }

    /// Uploads collected by the last cleaning pass, by field name.
    pub const fn uploads(&self) -> &BTreeMap<String, PendingUpload> {
        &self.uploads
    }

    pub(crate) fn take_upload(&mut self, field: &str) -> Option<PendingUpload> {
        self.uploads.remove(field)
    }

    /// The HTML name of a field under this form's prefix.
    pub fn html_name(&self, field: &str) -> String {
        html_name(self.prefix.as_deref(), field)
    }

    /// Adds an error to `field`, or to the form when `field` is `None`, and
    /// drops the field's cleaned value.
    pub fn add_error(&mut self, field: Option<&str>, message: impl Into<String>) {
        let key = field.unwrap_or(NON_FIELD_ERRORS);
        self.errors.entry(key.to_string()).or_default().push(message.into());
        if let Some(field) = field {
            self.cleaned_data.remove(field);
        }
    }

    /// Folds a [`ValidationError`] into the form's errors.
    pub fn add_validation_error(&mut self, error: &ValidationError) {
        merge_validation_error(&mut self.errors, error);
        for field in error.field_errors.keys() {
            self.cleaned_data.remove(field);
        }
    }

    pub(crate) fn merge_errors(&mut self, errors: ErrorMap) {
        for (field, messages) in errors {
            if field != NON_FIELD_ERRORS {
                self.cleaned_data.remove(&field);
            }
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// Runs field-level cleaning over the bound data.
    pub fn clean_fields(&mut self) {
        self.errors.clear();
        self.cleaned_data.clear();
        self.uploads.clear();
        let Some(data) = &self.data else { return };
        validation::clean_fields(
            &self.field_defs,
            data,
            self.prefix.as_deref(),
            &self.initial_data,
            &mut self.cleaned_data,
            &mut self.errors,
            &mut self.uploads,
        );
    }

    /// Runs the form-level hook, if any, recording its errors.
    pub fn run_clean_hook(&mut self) {
        let Some(hook) = &self.clean_hook else { return };
        if let Err(e) = hook(&self.cleaned_data, &self.errors) {
            self.add_validation_error(&e);
        }
    }

    fn initial_for<'a>(&'a self, field: &'a FormFieldDef) -> Option<&'a Value> {
        self.initial_data.get(&field.name).or(field.initial.as_ref())
    }

    /// Names of the fields whose submission differs from the initial value.
    pub fn changed_data(&self) -> Vec<String> {
        let Some(data) = &self.data else {
            return Vec::new();
        };
        self.field_defs
            .iter()
            .filter(|field| {
                let name = self.html_name(&field.name);
                if field.field_type.is_file() {
                    return data.file(&name).is_some()
                        || data.files_with_prefix(&name).next().is_some()
                        || data.contains(&ClearableFileInput::clear_checkbox_name(&name));
                }
                field_has_changed(field, self.initial_for(field), data.get_list(&name))
            })
            .map(|field| field.name.clone())
            .collect()
    }

    /// Returns `true` if any field changed.
    pub fn has_changed(&self) -> bool {
        !self.changed_data().is_empty()
    }

    fn display_value(&self, field: &FormFieldDef) -> Option<String> {
        let initial = || {
            self.initial_for(field)
                .filter(|v| !v.is_empty())
                .map(Value::to_form_string)
        };
        match &self.data {
            Some(_) if field.field_type.is_file() => initial(),
            Some(data) => {
                let values = data.get_list(&self.html_name(&field.name));
                (!values.is_empty()).then(|| values.join(","))
            }
            None => initial(),
        }
    }
}

#[async_trait]
impl Form for BaseForm {
    fn fields(&self) -> &[FormFieldDef] {
        &self.field_defs
    }

    fn initial(&self) -> &CleanedData {
        &self.initial_data
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn bind(&mut self, data: &FormData) {
        self.data = Some(data.clone());
        self.errors.clear();
        self.cleaned_data.clear();
        self.uploads.clear();
    }

    fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    async fn is_valid(&mut self) -> DocFormsResult<bool> {
        if self.data.is_none() {
            return Ok(false);
        }
        self.clean_fields();
        self.run_clean_hook();
        Ok(self.errors.is_empty())
    }

    fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    fn cleaned_data(&self) -> &CleanedData {
        &self.cleaned_data
    }

    fn bound_fields(&self) -> Vec<BoundField> {
        self.field_defs
            .iter()
            .map(|field| {
                let errors = self.errors.get(&field.name).cloned().unwrap_or_default();
                BoundField::new(field, self.display_value(field), errors, self.prefix.as_deref())
            })
            .collect()
    }
}

/// The stores a document form reads from and writes to.
#[derive(Clone)]
pub struct Stores {
    /// Document persistence.
    pub documents: Arc<dyn DocumentStore>,
    /// Blob persistence for file fields.
    pub blobs: Arc<dyn BlobStore>,
}

impl Stores {
    /// Bundles a document store and a blob store.
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { documents, blobs }
    }

    /// Fresh in-memory stores.
    pub fn memory() -> Self {
        Self::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryBlobStore::new()),
        )
    }
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

/// Where a document form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// No data bound.
    Unbound,
    /// Data bound, not yet validated.
    Bound,
    /// Field cleaning in progress.
    Cleaning,
    /// Fields cleaned and the form-level hook run.
    Validated,
    /// Validation passed; the instance holds the submitted values.
    Constructed,
    /// The instance was persisted.
    Saved,
    /// Validation failed.
    Rejected,
}

/// A form that edits one document.
pub struct DocumentForm {
    descriptor: Arc<FormDescriptor>,
    stores: Stores,
    base: BaseForm,
    instance: Document,
    initial_overrides: CleanedData,
    state: FormState,
    deferred: Vec<String>,
    drop_before_save: Vec<String>,
    unique_errors: Vec<FieldError>,
}

impl DocumentForm {
    /// An unbound form over a new instance of the descriptor's schema.
    pub fn new(descriptor: Arc<FormDescriptor>, stores: Stores) -> Self {
        let instance = Document::new(Arc::clone(descriptor.schema()));
        let base = BaseForm::new(descriptor.fields().to_vec());
        let mut form = Self {
            descriptor,
            stores,
            base,
            instance,
            initial_overrides: CleanedData::new(),
            state: FormState::Unbound,
            deferred: Vec::new(),
            drop_before_save: Vec::new(),
            unique_errors: Vec::new(),
        };
        form.refresh_initial();
        form
    }

    /// Edits `instance` instead of a new document.
    #[must_use]
    pub fn with_instance(mut self, instance: Document) -> Self {
        self.instance = instance;
        self.refresh_initial();
        self
    }

    /// Overrides initial values taken from the instance.
    #[must_use]
    pub fn with_initial(mut self, initial: CleanedData) -> Self {
        self.initial_overrides.extend(initial);
        self.refresh_initial();
        self
    }

    /// Namespaces the form's HTML names.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.base.set_prefix(Some(prefix.into()));
        self
    }

    /// Appends a field that is not part of the document, such as a
    /// formset's `DELETE` checkbox.
    pub fn add_field(&mut self, field: FormFieldDef) {
        self.base.add_field(field);
    }

    fn refresh_initial(&mut self) {
        let mut initial = document_to_dict(
            &self.instance,
            self.descriptor.restrict(),
            self.descriptor.exclude(),
        );
        initial.extend(self.initial_overrides.clone());
        self.base.set_initial(initial);
    }

    /// The shared descriptor.
    pub const fn descriptor(&self) -> &Arc<FormDescriptor> {
        &self.descriptor
    }

    /// The stores this form writes to.
    pub const fn stores(&self) -> &Stores {
        &self.stores
    }

    /// The edited instance. After a successful `is_valid` it holds the
    /// submitted values.
    pub const fn instance(&self) -> &Document {
        &self.instance
    }

    /// Consumes the form, returning its instance.
    pub fn into_instance(self) -> Document {
        self.instance
    }

    /// The lifecycle state.
    pub const fn state(&self) -> FormState {
        self.state
    }

    /// File-bearing fields whose uploads have not been written yet.
    pub fn deferred_fields(&self) -> &[String] {
        &self.deferred
    }

    /// Uniqueness failures found by the last validation.
    pub fn unique_errors(&self) -> &[FieldError] {
        &self.unique_errors
    }

    /// The underlying plain form.
    pub const fn base(&self) -> &BaseForm {
        &self.base
    }

    /// Adds an error, as [`BaseForm::add_error`].
    pub fn add_error(&mut self, field: Option<&str>, message: impl Into<String>) {
        self.base.add_error(field, message);
    }

    /// Returns `true` if any field's submission differs from its initial
    /// value.
    pub fn has_changed(&self) -> bool {
        self.base.has_changed()
    }

    pub(crate) fn mark_saved(&mut self) {
        self.state = FormState::Saved;
    }

    async fn full_clean(&mut self) -> DocFormsResult<bool> {
        let schema = Arc::clone(self.descriptor.schema());
        self.state = FormState::Cleaning;
        self.unique_errors.clear();
        self.base.clean_fields();

        if let Err(e) = self.descriptor.run_clean(self.base.cleaned_data(), self.base.errors()) {
            self.base.add_validation_error(&e);
        }
        self.base.run_clean_hook();
        self.state = FormState::Validated;

        let mut candidate = self.instance.clone();
        let mut deferred = Vec::new();
        for field in self.descriptor.fields() {
            let name = field.name.as_str();
            if name == ID_FIELD || !self.descriptor.includes(name) {
                continue;
            }
            let Some(doc_field) = schema.get_field(name) else { continue };
            if doc_field.field_type.is_file_bearing() {
                if self.base.uploads().contains_key(name) {
                    deferred.push(name.to_string());
                }
                continue;
            }
            let Some(value) = self.base.cleaned_data().get(name) else { continue };
            if candidate.get(name) != value || !candidate.has(name) {
                candidate.set(name, value.clone());
            }
        }

        let exclusions =
            compute_exclusions(&self.descriptor, self.base.cleaned_data(), self.base.errors());
        let deferred_set: BTreeSet<String> = deferred.iter().cloned().collect();
        let (document_errors, drop_before_save) =
            validate_document(&candidate, &exclusions, &deferred_set);
        self.base.merge_errors(document_errors);

        if self.descriptor.validates_unique() && !schema.is_embedded() {
            let exclusions =
                compute_exclusions(&self.descriptor, self.base.cleaned_data(), self.base.errors());
            let found =
                validate_unique(self.stores.documents.as_ref(), &candidate, &exclusions).await?;
            for error in &found {
                self.base.add_error(Some(&error.field), error.message.clone());
            }
            self.unique_errors = found;
        }

        if self.base.errors().is_empty() {
            self.instance = candidate;
            self.deferred = deferred;
            self.drop_before_save = drop_before_save;
            self.state = FormState::Constructed;
            debug!(deferred = self.deferred.len(), "form constructed");
            Ok(true)
        } else {
            self.state = FormState::Rejected;
            debug!(errors = self.base.errors().len(), "form rejected");
            Ok(false)
        }
    }

    /// Writes the pending uploads of deferred fields to the blob store and
    /// assigns the resulting values to the instance. A field is written at
    /// most once.
    pub async fn resolve_files(&mut self) -> DocFormsResult<()> {
        while let Some(name) = self.deferred.first().cloned() {
            if let Some(pending) = self.base.uploads().get(&name) {
                let namespace = self
                    .descriptor
                    .schema()
                    .get_field(&name)
                    .and_then(|f| f.blob_namespace.clone())
                    .unwrap_or_else(|| SETTINGS.get_or_default().blob_namespace.clone());
                let value = resolve_pending(
                    self.stores.blobs.as_ref(),
                    &namespace,
                    pending,
                    self.instance.get(&name),
                )
                .await?;
                self.instance.set(name.clone(), value);
            }
            self.base.take_upload(&name);
            self.deferred.remove(0);
        }
        Ok(())
    }

    /// Removes the excluded fields the last validation left empty.
    pub(crate) fn drop_excluded(&mut self) {
        for name in std::mem::take(&mut self.drop_before_save) {
            self.instance.remove(&name);
        }
    }

    /// Saves the validated instance.
    ///
    /// Without `commit` the constructed instance is returned and deferred
    /// uploads stay pending. With `commit`, uploads are written, empty
    /// excluded values are dropped and the document is persisted. An
    /// embedded schema is never persisted on its own.
    pub async fn save(&mut self, commit: bool) -> DocFormsResult<Document> {
        let schema = Arc::clone(self.descriptor.schema());
        if !matches!(self.state, FormState::Constructed | FormState::Saved) {
            let verb = if self.instance.is_saved() { "changed" } else { "created" };
            let message = format!(
                "The {} could not be {verb} because the data didn't validate.",
                schema.name()
            );
            warn!(document = schema.name(), state = ?self.state, "save refused");
            return Err(DocFormsError::IllegalSave(message));
        }
        if !commit {
            return Ok(self.instance.clone());
        }

        self.resolve_files().await?;
        self.drop_excluded();
        if !schema.is_embedded() {
            self.stores.documents.save(&mut self.instance).await?;
            info!(
                document = schema.name(),
                id = ?self.instance.id(),
                "document saved"
            );
        }
        self.state = FormState::Saved;
        Ok(self.instance.clone())
    }
}

impl fmt::Debug for DocumentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentForm")
            .field("form", &self.descriptor.name())
            .field("state", &self.state)
            .field("instance", &self.instance.id())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Form for DocumentForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.base.fields()
    }

    fn initial(&self) -> &CleanedData {
        self.base.initial()
    }

    fn prefix(&self) -> Option<&str> {
        self.base.prefix()
    }

    fn bind(&mut self, data: &FormData) {
        self.base.bind(data);
        self.deferred.clear();
        self.drop_before_save.clear();
        self.unique_errors.clear();
        self.state = FormState::Bound;
    }

    fn is_bound(&self) -> bool {
        self.base.is_bound()
    }

    async fn is_valid(&mut self) -> DocFormsResult<bool> {
        match self.state {
            FormState::Unbound => return Ok(false),
            FormState::Constructed | FormState::Saved => return Ok(true),
            FormState::Rejected => return Ok(false),
            FormState::Bound | FormState::Cleaning | FormState::Validated => {}
        }
        let span = form_span(self.descriptor.name(), self.descriptor.schema().name());
        self.full_clean().instrument(span).await
    }

    fn errors(&self) -> &ErrorMap {
        self.base.errors()
    }

    fn cleaned_data(&self) -> &CleanedData {
        self.base.cleaned_data()
    }

    fn bound_fields(&self) -> Vec<BoundField> {
        self.base.bound_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UploadedFile;
    use crate::document_form::{build_form_descriptor, describe, DocumentFormConfig};
    use crate::fields::FormFieldType;
    use docforms_document::{DocFieldDef, DocFieldType, DocumentSchema, Query};

    fn make_test_form() -> BaseForm {
        BaseForm::new(vec![
            FormFieldDef::new(
                "username",
                FormFieldType::Char {
                    min_length: Some(3),
                    max_length: Some(20),
                    strip: true,
                },
            ),
            FormFieldDef::new("email", FormFieldType::Email),
            FormFieldDef::new(
                "age",
                FormFieldType::Integer {
                    min_value: Some(0),
                    max_value: Some(150),
                },
            )
            .required(false),
        ])
    }

    fn item_schema() -> Arc<DocumentSchema> {
        DocumentSchema::new("Item")
            .field(DocFieldDef::new(
                "user",
                DocFieldType::Reference {
                    document: "User".into(),
                },
            ))
            .field(DocFieldDef::new("text", DocFieldType::String).required().max_length(200))
            .field(DocFieldDef::new("note", DocFieldType::String))
            .field(DocFieldDef::new("picture", DocFieldType::Image))
            .build()
    }

    fn item_form(stores: &Stores) -> DocumentForm {
        let descriptor = describe(&item_schema(), None, Some(&["user"]), None).unwrap();
        DocumentForm::new(Arc::new(descriptor), stores.clone())
    }

    #[tokio::test]
    async fn test_base_form_unbound() {
        let mut form = make_test_form();
        assert!(!form.is_bound());
        assert!(!form.is_valid().await.unwrap());
    }

    #[tokio::test]
    async fn test_base_form_bind_and_validate() {
        let mut form = make_test_form();
        form.bind(&FormData::parse("username=alice&email=alice@example.com&age=30"));
        assert!(form.is_valid().await.unwrap());
        assert_eq!(form.cleaned_data()["username"], Value::from("alice"));
        assert_eq!(form.cleaned_data()["age"], Value::Int(30));
    }

    #[tokio::test]
    async fn test_base_form_errors_and_rebind() {
        let mut form = make_test_form();
        form.bind(&FormData::parse("username=ab&email=not-email"));
        assert!(!form.is_valid().await.unwrap());
        assert!(form.errors().contains_key("username"));
        assert!(form.errors().contains_key("email"));

        form.bind(&FormData::parse("username=alice&email=alice@example.com"));
        assert!(form.is_valid().await.unwrap());
        assert!(form.errors().is_empty());
        assert_eq!(form.cleaned_data()["age"], Value::Null);
    }

    #[tokio::test]
    async fn test_base_form_clean_hook() {
        let mut form = BaseForm::new(vec![
            FormFieldDef::new(
                "password1",
                FormFieldType::Char {
                    min_length: None,
                    max_length: Some(100),
                    strip: false,
                },
            ),
            FormFieldDef::new(
                "password2",
                FormFieldType::Char {
                    min_length: None,
                    max_length: Some(100),
                    strip: false,
                },
            ),
        ])
        .with_clean(|cleaned, _| {
            if cleaned.get("password1") == cleaned.get("password2") {
                Ok(())
            } else {
                Err(ValidationError::new("Passwords must match", "mismatch"))
            }
        });
        form.bind(&FormData::parse("password1=a&password2=b"));
        assert!(!form.is_valid().await.unwrap());
        assert_eq!(form.non_field_errors(), ["Passwords must match".to_string()]);
        assert!(form.as_p().starts_with(r#"<ul class="errorlist">"#));
    }

    #[tokio::test]
    async fn test_base_form_prefix_and_bound_fields() {
        let mut form = make_test_form().with_prefix("myform");
        form.bind(&FormData::parse("myform-username=alice&myform-email=a@example.com"));
        assert!(form.is_valid().await.unwrap());
        let bfs = form.bound_fields();
        assert_eq!(bfs.len(), 3);
        assert_eq!(bfs[0].name, "myform-username");
        assert_eq!(bfs[0].data.as_deref(), Some("alice"));
    }

    #[test]
    fn test_changed_data() {
        let mut initial = CleanedData::new();
        initial.insert("username".into(), Value::from("alice"));
        let mut form = make_test_form().with_initial(initial);
        assert!(!form.has_changed());
        form.bind(&FormData::parse("username=alice"));
        assert!(!form.has_changed());
        form.bind(&FormData::parse("username=bob"));
        assert_eq!(form.changed_data(), vec!["username".to_string()]);
    }

    #[tokio::test]
    async fn test_document_form_save_creates_document() {
        let stores = Stores::memory();
        let mut form = item_form(&stores);
        assert_eq!(form.state(), FormState::Unbound);
        form.bind(&FormData::parse("text=milk"));
        assert_eq!(form.state(), FormState::Bound);
        assert!(form.is_valid().await.unwrap());
        assert_eq!(form.state(), FormState::Constructed);

        let saved = form.save(true).await.unwrap();
        assert!(saved.is_saved());
        assert_eq!(form.state(), FormState::Saved);
        assert!(!saved.has("note"));
        let stored = stores
            .documents
            .get(item_schema().collection(), saved.id().unwrap())
            .await
            .unwrap();
        assert_eq!(stored.get("text"), &Value::from("milk"));
    }

    #[tokio::test]
    async fn test_document_form_save_without_validation_is_illegal() {
        let stores = Stores::memory();
        let mut form = item_form(&stores);
        form.bind(&FormData::new());
        let err = form.save(true).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "The Item could not be created because the data didn't validate."
        );
        let count = stores.documents.count(&Query::new(item_schema().collection())).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_rejected_form_leaves_instance_untouched() {
        let stores = Stores::memory();
        let mut instance = Document::new(item_schema());
        instance.set("text", "milk");
        stores.documents.save(&mut instance).await.unwrap();

        let mut form = item_form(&stores).with_instance(instance.clone());
        form.bind(&FormData::parse(&format!("text={}&note=x", "a".repeat(201))));
        assert!(!form.is_valid().await.unwrap());
        assert_eq!(form.state(), FormState::Rejected);
        assert_eq!(form.instance().get("text"), &Value::from("milk"));
        assert!(!form.instance().has("note"));
        let err = form.save(true).await.unwrap_err();
        assert!(err.to_string().contains("could not be changed"));
    }

    #[tokio::test]
    async fn test_edit_without_upload_keeps_file() {
        let stores = Stores::memory();
        let mut form = item_form(&stores);
        let data = FormData::parse("text=milk").with_file(
            "picture",
            UploadedFile::new("photo.jpg", "image/jpeg", b"jpeg".to_vec()),
        );
        form.bind(&data);
        assert!(form.is_valid().await.unwrap());
        assert_eq!(form.deferred_fields(), ["picture".to_string()]);
        let saved = form.save(true).await.unwrap();
        let handle = saved.get("picture").as_file().unwrap().clone();
        assert_eq!(handle.name, "photo.jpg");

        let mut edit = item_form(&stores).with_instance(saved.clone());
        edit.bind(&FormData::parse("text=eggs"));
        assert!(edit.is_valid().await.unwrap());
        assert!(edit.deferred_fields().is_empty());
        let edited = edit.save(true).await.unwrap();
        assert_eq!(edited.get("picture").as_file(), Some(&handle));
        assert!(stores.blobs.get(&handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_uniqueness_error_then_success_after_delete() {
        let schema = DocumentSchema::new("Account")
            .field(DocFieldDef::new("username", DocFieldType::String).required().unique())
            .build();
        let descriptor = Arc::new(describe(&schema, None, None, None).unwrap());
        let stores = Stores::memory();

        let mut first = DocumentForm::new(Arc::clone(&descriptor), stores.clone());
        first.bind(&FormData::parse("username=ann"));
        assert!(first.is_valid().await.unwrap());
        let saved = first.save(true).await.unwrap();

        let mut second = DocumentForm::new(Arc::clone(&descriptor), stores.clone());
        second.bind(&FormData::parse("username=ann"));
        assert!(!second.is_valid().await.unwrap());
        assert_eq!(
            second.errors()["username"],
            vec!["Account with this Username already exists.".to_string()]
        );
        assert_eq!(second.unique_errors().len(), 1);

        stores.documents.delete(&saved).await.unwrap();
        let mut third = DocumentForm::new(descriptor, stores.clone());
        third.bind(&FormData::parse("username=ann"));
        assert!(third.is_valid().await.unwrap());
    }

    #[tokio::test]
    async fn test_descriptor_clean_hook_and_disabled_uniqueness() {
        let schema = DocumentSchema::new("Slot")
            .field(DocFieldDef::new("code", DocFieldType::String).unique())
            .build();
        let descriptor = build_form_descriptor(
            DocumentFormConfig::new("SlotForm", Arc::clone(&schema))
                .validate_unique(false)
                .clean(|cleaned, _| {
                    if cleaned.get("code") == Some(&Value::from("bad")) {
                        Err(ValidationError::new("No bad codes", "bad"))
                    } else {
                        Ok(())
                    }
                }),
        )
        .unwrap();
        let descriptor = Arc::new(descriptor);
        let stores = Stores::memory();
        let mut doc = Document::new(schema);
        doc.set("code", "x");
        stores.documents.save(&mut doc).await.unwrap();

        let mut form = DocumentForm::new(Arc::clone(&descriptor), stores.clone());
        form.bind(&FormData::parse("code=x"));
        assert!(form.is_valid().await.unwrap());

        let mut form = DocumentForm::new(descriptor, stores);
        form.bind(&FormData::parse("code=bad"));
        assert!(!form.is_valid().await.unwrap());
        assert_eq!(form.non_field_errors(), ["No bad codes".to_string()]);
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let schema = DocumentSchema::new("Account")
            .field(DocFieldDef::new("username", DocFieldType::String).unique())
            .build();
        let documents = Arc::new(MemoryDocumentStore::new());
        documents.set_unavailable(true);
        let stores = Stores::new(documents, Arc::new(MemoryBlobStore::new()));
        let mut form =
            DocumentForm::new(Arc::new(describe(&schema, None, None, None).unwrap()), stores);
        form.bind(&FormData::parse("username=ann"));
        assert!(form.is_valid().await.is_err());
    }

    #[tokio::test]
    async fn test_commit_false_keeps_uploads_pending() {
        let stores = Stores::memory();
        let mut form = item_form(&stores);
        form.bind(&FormData::parse("text=milk").with_file(
            "picture",
            UploadedFile::new("photo.jpg", "image/jpeg", b"jpeg".to_vec()),
        ));
        assert!(form.is_valid().await.unwrap());
        let unsaved = form.save(false).await.unwrap();
        assert!(!unsaved.is_saved());
        assert!(!unsaved.has("picture"));
        assert_eq!(form.deferred_fields().len(), 1);
    }

    #[test]
    fn test_initial_from_instance_and_overrides() {
        let stores = Stores::memory();
        let mut instance = Document::new(item_schema());
        instance.set("text", "milk");
        instance.set("note", "cold");
        let mut overrides = CleanedData::new();
        overrides.insert("note".into(), Value::from("warm"));
        let form = item_form(&stores).with_instance(instance).with_initial(overrides);
        assert_eq!(form.initial()["text"], Value::from("milk"));
        assert_eq!(form.initial()["note"], Value::from("warm"));
        assert!(!form.initial().contains_key("user"));
    }
}
