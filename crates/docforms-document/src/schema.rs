//! Document schemas.
//!
//! A [`DocumentSchema`] is the declared shape of one document type: ordered
//! fields, names used in messages, and an optional document-level `clean`
//! hook. Schemas are declared once and shared as `Arc<DocumentSchema>`.

use std::fmt;
use std::sync::Arc;

use docforms_core::utils::text::camel_case_to_spaces;
use docforms_core::ValidationError;

use crate::document::Document;
use crate::fields::DocFieldDef;

/// A document-level validation hook. Errors land in the non-field bucket.
pub type SchemaClean = Arc<dyn Fn(&Document) -> Result<(), ValidationError> + Send + Sync>;

/// Name of the implicit identity field.
pub const ID_FIELD: &str = "id";

/// The declared shape of a document type.
///
/// # Examples
///
/// ```
/// use docforms_document::fields::{DocFieldDef, DocFieldType};
/// use docforms_document::schema::DocumentSchema;
///
/// let schema = DocumentSchema::new("BlogPost")
///     .field(DocFieldDef::new("title", DocFieldType::String).required())
///     .field(DocFieldDef::new("body", DocFieldType::String))
///     .build();
/// assert_eq!(schema.collection(), "blog_post");
/// assert_eq!(schema.verbose_name(), "blog post");
/// assert_eq!(schema.field_names(), vec!["title", "body"]);
/// ```
pub struct DocumentSchema {
    name: String,
    collection: String,
    verbose_name: String,
    fields: Vec<DocFieldDef>,
    embedded: bool,
    clean: Option<SchemaClean>,
}

impl DocumentSchema {
    /// Starts declaring a top-level document type.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let verbose_name = camel_case_to_spaces(&name);
        Self {
            collection: verbose_name.replace(' ', "_"),
            verbose_name,
            name,
            fields: Vec::new(),
            embedded: false,
            clean: None,
        }
    }

    /// Starts declaring an embedded document type.
    pub fn embedded(name: impl Into<String>) -> Self {
        let mut schema = Self::new(name);
        schema.embedded = true;
        schema
    }

    /// Appends a field. Declaration order is preserved.
    #[must_use]
    pub fn field(mut self, field: DocFieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Overrides the collection name.
    #[must_use]
    pub fn collection_name(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Overrides the verbose name used in messages.
    #[must_use]
    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = verbose_name.into();
        self
    }

    /// Installs a document-level validation hook.
    #[must_use]
    pub fn clean<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Document) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.clean = Some(Arc::new(hook));
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The collection documents of this type are stored in.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The lowercase human name used in messages.
    pub fn verbose_name(&self) -> &str {
        &self.verbose_name
    }

    /// `true` for types that only live inside a parent document.
    pub const fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[DocFieldDef] {
        &self.fields
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Looks up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&DocFieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Runs the document-level hook, if any.
    pub fn run_clean(&self, document: &Document) -> Result<(), ValidationError> {
        self.clean.as_ref().map_or(Ok(()), |hook| hook(document))
    }
}

impl fmt::Debug for DocumentSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSchema")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .field("embedded", &self.embedded)
            .field("fields", &self.field_names())
            .field("clean", &self.clean.is_some())
            .finish()
    }
}
