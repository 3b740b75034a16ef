//! Document instances.
//!
//! A [`Document`] pairs a schema with field values, an optional identity
//! and the set of fields changed since it was loaded or last saved.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::schema::DocumentSchema;
use crate::value::{DocumentId, EmbeddedValues, Value};

/// A mutable document instance.
///
/// # Examples
///
/// ```
/// use docforms_document::document::Document;
/// use docforms_document::fields::{DocFieldDef, DocFieldType};
/// use docforms_document::schema::DocumentSchema;
/// use docforms_document::value::Value;
///
/// let schema = DocumentSchema::new("Item")
///     .field(DocFieldDef::new("text", DocFieldType::String).default("todo"))
///     .build();
/// let mut doc = Document::new(schema);
/// assert_eq!(doc.get("text"), &Value::from("todo"));
/// doc.set("text", "buy milk");
/// assert!(doc.is_changed("text"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    schema: Arc<DocumentSchema>,
    id: Option<DocumentId>,
    data: BTreeMap<String, Value>,
    changed: BTreeSet<String>,
}

static NULL: Value = Value::Null;

impl Document {
    /// Creates a new unsaved document with defaults applied.
    pub fn new(schema: Arc<DocumentSchema>) -> Self {
        let data = schema
            .fields()
            .iter()
            .filter_map(|f| f.default.as_ref().map(|d| (f.name.clone(), d.produce())))
            .collect();
        Self {
            schema,
            id: None,
            data,
            changed: BTreeSet::new(),
        }
    }

    /// Rebuilds an embedded document from its stored values.
    pub fn from_embedded(schema: Arc<DocumentSchema>, values: EmbeddedValues) -> Self {
        Self {
            schema,
            id: None,
            data: values,
            changed: BTreeSet::new(),
        }
    }

    /// The document's schema.
    pub const fn schema(&self) -> &Arc<DocumentSchema> {
        &self.schema
    }

    /// The identity, once saved.
    pub const fn id(&self) -> Option<DocumentId> {
        self.id
    }

    /// Sets the identity. Stores call this on first save.
    pub fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    /// Returns `true` once the document has an identity.
    pub const fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// The value of a field; `Null` when unset.
    pub fn get(&self, name: &str) -> &Value {
        self.data.get(name).unwrap_or(&NULL)
    }

    /// Returns `true` if the field holds a value.
    pub fn has(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Assigns a field and marks it changed.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        self.changed.insert(name.clone());
        self.data.insert(name, value.into());
    }

    /// Drops a field from the stored values.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let removed = self.data.remove(name);
        if removed.is_some() {
            self.changed.insert(name.to_string());
        }
        removed
    }

    /// Mutable access to a field's value for in-place list edits.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let value = self.data.get_mut(name)?;
        self.changed.insert(name.to_string());
        Some(value)
    }

    /// All stored values.
    pub const fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// Fields changed since load or the last [`clear_changed`](Self::clear_changed).
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Returns `true` if `name` was changed.
    pub fn is_changed(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    /// Forgets change tracking; stores call this after persisting.
    pub fn clear_changed(&mut self) {
        self.changed.clear();
    }

    /// The document as an embedded value.
    pub fn to_embedded(&self) -> Value {
        Value::Embedded(self.data.clone())
    }
}

/// Documents compare by identity when both have one, otherwise by schema
/// name and field values.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.schema.name() == other.schema.name() && self.data == other.data,
        }
    }
}
