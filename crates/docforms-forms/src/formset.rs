//! Formsets: many document forms on one page.
//!
//! A formset tracks how many forms were rendered through hidden management
//! inputs (`<prefix>-TOTAL_FORMS`, `-INITIAL_FORMS`, `-MIN_NUM_FORMS`,
//! `-MAX_NUM_FORMS`). Form `i` below the initial count edits the `i`-th
//! existing document; the rest create new ones and are skipped when left
//! untouched.
//!
//! [`DocumentFormSet`] edits a list of top-level documents.
//! [`EmbeddedDocumentFormSet`] edits the embedded documents of one list
//! field and writes them back by replacing the whole list, so concurrent
//! edits of the same parent are lost.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use docforms_core::settings::SETTINGS;
use docforms_core::{DocFormsError, DocFormsResult};
use docforms_document::{DocFieldType, Document, Value};

use crate::bound_field::html_name;
use crate::data::FormData;
use crate::document_form::FormDescriptor;
use crate::fields::{truthy, FormFieldDef, FormFieldType};
use crate::form::{DocumentForm, Form, Stores};
use crate::widgets::{Input, Widget, WidgetType};

/// Management input holding the number of rendered forms.
pub const TOTAL_FORM_COUNT: &str = "TOTAL_FORMS";
/// Management input holding the number of forms over existing documents.
pub const INITIAL_FORM_COUNT: &str = "INITIAL_FORMS";
/// Management input echoing `min_num`.
pub const MIN_NUM_FORM_COUNT: &str = "MIN_NUM_FORMS";
/// Management input echoing `max_num`.
pub const MAX_NUM_FORM_COUNT: &str = "MAX_NUM_FORMS";
/// Name of the per-form deletion checkbox.
pub const DELETION_FIELD_NAME: &str = "DELETE";
/// Name of the per-form ordering input.
pub const ORDERING_FIELD_NAME: &str = "ORDER";
/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "form";

const MANAGEMENT_ERROR: &str = "ManagementForm data is missing or has been tampered with";
const DUPLICATE_ERROR: &str = "Please correct the duplicate values below.";

/// Formset configuration.
#[derive(Debug, Clone)]
pub struct FormSetOptions {
    /// Blank forms rendered after the existing ones.
    pub extra: usize,
    /// Fewest forms a valid submission may hold.
    pub min_num: usize,
    /// Most forms a valid submission may hold.
    pub max_num: usize,
    /// Hard cap on the submitted form count.
    pub absolute_max: usize,
    /// Adds a `DELETE` checkbox to every form.
    pub can_delete: bool,
    /// Adds an `ORDER` input to every form.
    pub can_order: bool,
    /// Prefix of the management inputs and forms.
    pub prefix: String,
}

impl Default for FormSetOptions {
    fn default() -> Self {
        let formsets = &SETTINGS.get_or_default().formsets;
        Self {
            extra: formsets.extra,
            min_num: 0,
            max_num: formsets.max_num,
            absolute_max: formsets.absolute_max,
            can_delete: false,
            can_order: false,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl FormSetOptions {
    /// Sets the number of blank forms.
    #[must_use]
    pub const fn extra(mut self, extra: usize) -> Self {
        self.extra = extra;
        self
    }

    /// Sets the minimum number of forms.
    #[must_use]
    pub const fn min_num(mut self, min_num: usize) -> Self {
        self.min_num = min_num;
        self
    }

    /// Sets the maximum number of forms.
    #[must_use]
    pub const fn max_num(mut self, max_num: usize) -> Self {
        self.max_num = max_num;
        self
    }

    /// Enables deletion checkboxes.
    #[must_use]
    pub const fn can_delete(mut self, can_delete: bool) -> Self {
        self.can_delete = can_delete;
        self
    }

    /// Enables ordering inputs.
    #[must_use]
    pub const fn can_order(mut self, can_order: bool) -> Self {
        self.can_order = can_order;
        self
    }

    /// Sets the prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// State shared by both formset kinds.
struct FormSetCore {
    descriptor: Arc<FormDescriptor>,
    stores: Stores,
    options: FormSetOptions,
    existing: Vec<Document>,
    forms: Vec<DocumentForm>,
    data: Option<FormData>,
    initial_count: usize,
    non_form_errors: Vec<String>,
    management_valid: bool,
    validated: bool,
}

impl FormSetCore {
    fn new(
        descriptor: Arc<FormDescriptor>,
        stores: Stores,
        existing: Vec<Document>,
        options: FormSetOptions,
    ) -> Self {
        let initial_count = existing.len();
        let mut total = initial_count.max(options.min_num) + options.extra;
        if initial_count > options.max_num {
            total = initial_count;
        } else if total > options.max_num {
            total = options.max_num;
        }

        let mut core = Self {
            descriptor,
            stores,
            options,
            existing,
            forms: Vec::new(),
            data: None,
            initial_count,
            non_form_errors: Vec::new(),
            management_valid: true,
            validated: false,
        };
        core.forms = (0..total).map(|i| core.construct_form(i)).collect();
        core
    }

    fn management_name(&self, key: &str) -> String {
        html_name(Some(&self.options.prefix), key)
    }

    fn construct_form(&self, index: usize) -> DocumentForm {
        self.construct_prefixed(index, &format!("{}-{index}", self.options.prefix))
    }

    fn construct_prefixed(&self, index: usize, prefix: &str) -> DocumentForm {
        let mut form = DocumentForm::new(Arc::clone(&self.descriptor), self.stores.clone())
            .with_prefix(prefix);
        if index < self.initial_count {
            if let Some(instance) = self.existing.get(index) {
                form = form.with_instance(instance.clone());
            }
        }
        if self.options.can_order {
            let mut field = FormFieldDef::new(
                ORDERING_FIELD_NAME,
                FormFieldType::Integer {
                    min_value: None,
                    max_value: None,
                },
            )
            .required(false)
            .label("Order")
            .widget(WidgetType::NumberInput);
            if index < self.initial_count {
                field = field.initial(i64::try_from(index + 1).unwrap_or(i64::MAX));
            }
            form.add_field(field);
        }
        if self.options.can_delete {
            form.add_field(
                FormFieldDef::new(DELETION_FIELD_NAME, FormFieldType::Boolean)
                    .required(false)
                    .label("Delete"),
            );
        }
        form
    }

    fn read_count(data: &FormData, name: &str) -> Option<usize> {
        data.get(name)?.trim().parse().ok()
    }

    fn bind(&mut self, data: &FormData) {
        self.data = Some(data.clone());
        self.non_form_errors.clear();
        self.validated = false;

        let total = Self::read_count(data, &self.management_name(TOTAL_FORM_COUNT));
        let initial = Self::read_count(data, &self.management_name(INITIAL_FORM_COUNT));
        let (Some(total), Some(initial)) = (total, initial) else {
            debug!(prefix = %self.options.prefix, "management data missing");
            self.management_valid = false;
            self.non_form_errors.push(MANAGEMENT_ERROR.to_string());
            self.forms.clear();
            return;
        };
        self.management_valid = true;

        let total = total.min(self.options.absolute_max);
        self.initial_count = initial.min(total);
        let mut forms: Vec<DocumentForm> = (0..total).map(|i| self.construct_form(i)).collect();
        for form in &mut forms {
            form.bind(data);
        }
        self.forms = forms;
    }

    fn raw_flag(form: &DocumentForm, name: &str) -> bool {
        form.base()
            .data()
            .and_then(|data| data.get(&form.base().html_name(name)))
            .is_some_and(truthy)
    }

    fn should_delete(&self, form: &DocumentForm) -> bool {
        self.options.can_delete && Self::raw_flag(form, DELETION_FIELD_NAME)
    }

    fn is_skipped(&self, index: usize, form: &DocumentForm) -> bool {
        index >= self.initial_count && !form.has_changed()
    }

    async fn is_valid(&mut self) -> DocFormsResult<bool> {
        self.validated = false;
        if self.data.is_none() || !self.management_valid {
            return Ok(false);
        }
        self.non_form_errors.clear();

        let mut valid = true;
        let mut deleted = 0;
        let mut submitted = 0;
        let mut duplicates = false;
        for index in 0..self.forms.len() {
            if self.is_skipped(index, &self.forms[index]) {
                continue;
            }
            if self.should_delete(&self.forms[index]) {
                deleted += 1;
                continue;
            }
            submitted += 1;
            let form = &mut self.forms[index];
            if !form.is_valid().await? {
                valid = false;
            }
            duplicates |= !form.unique_errors().is_empty();
        }

        if duplicates {
            self.non_form_errors.push(DUPLICATE_ERROR.to_string());
        }
        if submitted < self.options.min_num {
            self.non_form_errors.push(format!(
                "Please submit at least {} forms.",
                self.options.min_num
            ));
        }
        if self.forms.len().saturating_sub(deleted) > self.options.max_num {
            self.non_form_errors.push(format!(
                "Please submit at most {} forms.",
                self.options.max_num
            ));
        }
        debug!(
            forms = self.forms.len(),
            submitted,
            deleted,
            errors = self.non_form_errors.len(),
            "formset validated"
        );
        self.validated = valid && self.non_form_errors.is_empty();
        Ok(self.validated)
    }

    /// Refuses to save unless the last validation accepted every form and
    /// the formset as a whole.
    fn ensure_valid(&self) -> DocFormsResult<()> {
        if self.validated {
            return Ok(());
        }
        let name = self.descriptor.schema().name();
        warn!(
            document = name,
            prefix = %self.options.prefix,
            errors = self.non_form_errors.len(),
            "formset save refused"
        );
        Err(DocFormsError::IllegalSave(format!(
            "The {name} formset could not be saved because the data didn't validate."
        )))
    }

    /// Indexes of the forms to save, honoring `ORDER` when enabled.
    fn saved_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = (0..self.forms.len())
            .filter(|&i| {
                !self.is_skipped(i, &self.forms[i]) && !self.should_delete(&self.forms[i])
            })
            .collect();
        if self.options.can_order {
            indexes.sort_by_key(|&i| {
                let order = self.forms[i]
                    .cleaned_data()
                    .get(ORDERING_FIELD_NAME)
                    .and_then(Value::as_int);
                (order.is_none(), order, i)
            });
        }
        indexes
    }

    fn deleted_indexes(&self) -> Vec<usize> {
        (0..self.forms.len())
            .filter(|&i| !self.is_skipped(i, &self.forms[i]) && self.should_delete(&self.forms[i]))
            .collect()
    }

    fn total_form_count(&self) -> usize {
        self.forms.len()
    }

    fn management_form_html(&self) -> String {
        let widget = Input::hidden();
        [
            (TOTAL_FORM_COUNT, self.total_form_count()),
            (INITIAL_FORM_COUNT, self.initial_count),
            (MIN_NUM_FORM_COUNT, self.options.min_num),
            (MAX_NUM_FORM_COUNT, self.options.max_num),
        ]
        .iter()
        .map(|(key, value)| {
            let name = self.management_name(key);
            let attrs = HashMap::from([("id".to_string(), format!("id_{name}"))]);
            widget.render(&name, Some(&value.to_string()), &attrs)
        })
        .collect()
    }
}

macro_rules! formset_accessors {
    () => {
        /// Binds submitted data, rebuilding the forms from the management
        /// counts.
        pub fn bind(&mut self, data: &FormData) {
            self.core.bind(data);
        }

        /// Returns `true` once data has been bound.
        pub const fn is_bound(&self) -> bool {
            self.core.data.is_some()
        }

        /// Validates every submitted form and the formset as a whole.
        pub async fn is_valid(&mut self) -> DocFormsResult<bool> {
            self.core.is_valid().await
        }

        /// The forms, in page order.
        pub fn forms(&self) -> &[DocumentForm] {
            &self.core.forms
        }

        /// Mutable access to one form, for adding errors.
        pub fn form_mut(&mut self, index: usize) -> Option<&mut DocumentForm> {
            self.core.forms.get_mut(index)
        }

        /// A blank form with the `__prefix__` placeholder, for client-side
        /// cloning.
        pub fn empty_form(&self) -> DocumentForm {
            let prefix = format!("{}-__prefix__", self.core.options.prefix);
            self.core.construct_prefixed(usize::MAX, &prefix)
        }

        /// Formset-level errors.
        pub fn non_form_errors(&self) -> &[String] {
            &self.core.non_form_errors
        }

        /// Number of forms rendered or submitted.
        pub fn total_form_count(&self) -> usize {
            self.core.total_form_count()
        }

        /// Number of forms over existing documents.
        pub const fn initial_form_count(&self) -> usize {
            self.core.initial_count
        }

        /// Indexes of the forms marked for deletion.
        pub fn deleted_forms(&self) -> Vec<usize> {
            self.core.deleted_indexes()
        }

        /// Indexes of the forms that will be saved, in save order.
        pub fn ordered_forms(&self) -> Vec<usize> {
            self.core.saved_indexes()
        }

        /// The management inputs as hidden `<input>` elements.
        pub fn management_form_html(&self) -> String {
            self.core.management_form_html()
        }

        /// The options the formset was built with.
        pub const fn options(&self) -> &FormSetOptions {
            &self.core.options
        }
    };
}

/// A formset over top-level documents.
pub struct DocumentFormSet {
    core: FormSetCore,
}

impl DocumentFormSet {
    /// Creates an unbound formset editing `existing`.
    pub fn new(
        descriptor: Arc<FormDescriptor>,
        stores: Stores,
        existing: Vec<Document>,
        options: FormSetOptions,
    ) -> Self {
        Self {
            core: FormSetCore::new(descriptor, stores, existing, options),
        }
    }

    formset_accessors!();

    /// Saves the submitted forms and deletes the documents marked for
    /// deletion. Deleted documents are not returned. Nothing is written
    /// unless the last `is_valid` succeeded.
    pub async fn save(&mut self, commit: bool) -> DocFormsResult<Vec<Document>> {
        self.core.ensure_valid()?;
        if commit {
            for index in self.core.deleted_indexes() {
                let instance = self.core.forms[index].instance();
                if index < self.core.initial_count && instance.is_saved() {
                    self.core.stores.documents.delete(instance).await?;
                    info!(
                        document = instance.schema().name(),
                        id = ?instance.id(),
                        "document deleted"
                    );
                }
            }
        }

        let mut saved = Vec::new();
        for index in self.core.saved_indexes() {
            saved.push(self.core.forms[index].save(commit).await?);
        }
        Ok(saved)
    }
}

/// A formset over the embedded documents of a parent's list field.
pub struct EmbeddedDocumentFormSet {
    core: FormSetCore,
    parent: Document,
    field: String,
}

impl EmbeddedDocumentFormSet {
    /// Creates an unbound formset over `parent`'s embedded list.
    pub fn new(
        descriptor: Arc<FormDescriptor>,
        stores: Stores,
        parent: Document,
        options: FormSetOptions,
    ) -> DocFormsResult<Self> {
        let field = descriptor
            .embedded_field()
            .ok_or_else(|| {
                DocFormsError::Configuration(format!(
                    "{} does not name the parent field it embeds into",
                    descriptor.name()
                ))
            })?
            .to_string();
        let parent_field = parent.schema().get_field(&field).ok_or_else(|| {
            DocFormsError::Configuration(format!("Parent document must have field {field}"))
        })?;
        if !matches!(parent_field.field_type, DocFieldType::List(_)) {
            return Err(DocFormsError::Configuration(format!(
                "Field {field} of {} is not a list",
                parent.schema().name()
            )));
        }

        let schema = descriptor.schema();
        let existing = parent
            .get(&field)
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_embedded)
            .map(|values| Document::from_embedded(Arc::clone(schema), values.clone()))
            .collect();
        Ok(Self {
            core: FormSetCore::new(Arc::clone(&descriptor), stores, existing, options),
            parent,
            field,
        })
    }

    formset_accessors!();

    /// The parent document.
    pub const fn parent(&self) -> &Document {
        &self.parent
    }

    /// Collects every kept form's instance. With `commit`, uploads are
    /// written, the parent's list is replaced by the collected instances and
    /// the parent is saved once. Uploads are only written after every kept
    /// form has been accepted.
    pub async fn save(&mut self, commit: bool) -> DocFormsResult<Vec<Document>> {
        self.core.ensure_valid()?;
        let indexes = self.core.saved_indexes();
        let mut kept = Vec::with_capacity(indexes.len());
        for &index in &indexes {
            kept.push(self.core.forms[index].save(false).await?);
        }
        if !commit {
            return Ok(kept);
        }

        kept.clear();
        for &index in &indexes {
            let form = &mut self.core.forms[index];
            form.resolve_files().await?;
            form.drop_excluded();
            kept.push(form.instance().clone());
        }

        let values: Vec<Value> = kept.iter().map(Document::to_embedded).collect();
        self.parent.set(self.field.clone(), Value::List(values));
        self.core.stores.documents.save(&mut self.parent).await?;
        for index in indexes {
            self.core.forms[index].mark_saved();
        }
        info!(
            parent = self.parent.schema().name(),
            field = %self.field,
            elements = kept.len(),
            "embedded list replaced"
        );
        Ok(kept)
    }
}
