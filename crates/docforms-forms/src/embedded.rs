//! Forms over documents embedded in a parent.
//!
//! An [`EmbeddedDocumentForm`] edits one embedded document held in a field
//! of a parent document. For a list field the form appends, or replaces the
//! element at its position, through the document store; for a single
//! embedded field it assigns the value and saves the parent.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use docforms_core::{DocFormsError, DocFormsResult};
use docforms_document::{DocFieldType, Document, Value};

use crate::bound_field::BoundField;
use crate::data::FormData;
use crate::document_form::{CleanedData, ErrorMap, FormDescriptor};
use crate::fields::FormFieldDef;
use crate::form::{DocumentForm, Form, Stores};

/// A form editing one embedded document of a parent.
pub struct EmbeddedDocumentForm {
    form: DocumentForm,
    parent: Document,
    field: String,
    is_list: bool,
    position: Option<usize>,
}

impl EmbeddedDocumentForm {
    /// Creates the form.
    ///
    /// The descriptor must name the parent field it embeds into. For a list
    /// field, `position` without `instance` loads that element; `instance`
    /// without `position` is located by value among the existing elements.
    pub fn new(
        descriptor: Arc<FormDescriptor>,
        stores: Stores,
        parent: Document,
        instance: Option<Document>,
        position: Option<usize>,
    ) -> DocFormsResult<Self> {
        let field = descriptor.embedded_field().ok_or_else(|| {
            DocFormsError::Configuration(format!(
                "{} does not name the parent field it embeds into",
                descriptor.name()
            ))
        })?;
        let parent_field = parent.schema().get_field(field).ok_or_else(|| {
            DocFormsError::Configuration(format!("Parent document must have field {field}"))
        })?;
        let is_list = matches!(parent_field.field_type, DocFieldType::List(_));
        let schema = Arc::clone(descriptor.schema());
        let current = parent.get(field);

        let (instance, position) = match (instance, position) {
            (Some(doc), Some(position)) => (doc, Some(position)),
            (Some(doc), None) => {
                let embedded = doc.to_embedded();
                let found = if is_list {
                    current
                        .as_list()
                        .and_then(|items| items.iter().position(|v| *v == embedded))
                } else {
                    None
                };
                (doc, found)
            }
            (None, Some(position)) if is_list => {
                let values = current
                    .as_list()
                    .and_then(|items| items.get(position))
                    .and_then(Value::as_embedded)
                    .ok_or_else(|| {
                        DocFormsError::NotFound(format!(
                            "{} has no {field} at position {position}",
                            parent.schema().name()
                        ))
                    })?;
                (Document::from_embedded(schema, values.clone()), Some(position))
            }
            (None, _) => match current.as_embedded() {
                Some(values) if !is_list => (Document::from_embedded(schema, values.clone()), None),
                _ => (Document::new(schema), None),
            },
        };

        let field = field.to_string();
        let form = DocumentForm::new(descriptor, stores).with_instance(instance);
        Ok(Self {
            form,
            parent,
            field,
            is_list,
            position,
        })
    }

    /// Namespaces the form's HTML names.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.form = self.form.with_prefix(prefix);
        self
    }

    /// The parent document as last written.
    pub const fn parent(&self) -> &Document {
        &self.parent
    }

    /// The parent field this form writes into.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The element position in a list field, once known.
    pub const fn position(&self) -> Option<usize> {
        self.position
    }

    /// The wrapped document form.
    pub const fn form(&self) -> &DocumentForm {
        &self.form
    }

    /// The edited embedded document.
    pub const fn instance(&self) -> &Document {
        self.form.instance()
    }

    /// Writes the embedded document into the parent.
    ///
    /// Without `commit` only the constructed instance is returned.
    pub async fn save(&mut self, commit: bool) -> DocFormsResult<Document> {
        let instance = self.form.save(false).await?;
        if !commit {
            return Ok(instance);
        }
        self.form.resolve_files().await?;
        self.form.drop_excluded();
        let value = self.form.instance().to_embedded();
        let name = self.form.descriptor().schema().name().to_string();
        let documents = Arc::clone(&self.form.stores().documents);

        if self.is_list {
            match self.position {
                None => {
                    documents
                        .push(&mut self.parent, &self.field, value)
                        .await
                        .map_err(|e| {
                            let message = format!("The {name} could not be appended.");
                            DocFormsError::operation(message, e)
                        })?;
                    self.position = self
                        .parent
                        .get(&self.field)
                        .as_list()
                        .map(|items| items.len().saturating_sub(1));
                }
                Some(position) => {
                    documents
                        .set_at(&mut self.parent, &self.field, position, value)
                        .await
                        .map_err(|e| {
                            let message =
                                format!("The {name} could not be updated at position {position}.");
                            DocFormsError::operation(message, e)
                        })?;
                }
            }
        } else {
            self.parent.set(self.field.clone(), value);
            documents.save(&mut self.parent).await?;
        }

        info!(
            document = %name,
            parent = self.parent.schema().name(),
            field = %self.field,
            position = ?self.position,
            "embedded document saved"
        );
        self.form.mark_saved();
        Ok(self.form.instance().clone())
    }
}

impl fmt::Debug for EmbeddedDocumentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedDocumentForm")
            .field("form", &self.form)
            .field("field", &self.field)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Form for EmbeddedDocumentForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.form.fields()
    }

    fn initial(&self) -> &CleanedData {
        self.form.initial()
    }

    fn prefix(&self) -> Option<&str> {
        self.form.prefix()
    }

    fn bind(&mut self, data: &FormData) {
        self.form.bind(data);
    }

    fn is_bound(&self) -> bool {
        self.form.is_bound()
    }

    async fn is_valid(&mut self) -> DocFormsResult<bool> {
        self.form.is_valid().await
    }

    fn errors(&self) -> &ErrorMap {
        self.form.errors()
    }

    fn cleaned_data(&self) -> &CleanedData {
        self.form.cleaned_data()
    }

    fn bound_fields(&self) -> Vec<BoundField> {
        self.form.bound_fields()
    }
}
