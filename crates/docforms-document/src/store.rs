//! Document persistence.
//!
//! [`DocumentStore`] is the boundary the form layer persists through. Every
//! method reports [`DocFormsError::NotFound`], [`DocFormsError::Conflict`]
//! or [`DocFormsError::StoreFailure`] so callers can tell outcomes apart.
//! [`MemoryDocumentStore`] keeps collections in memory and backs the tests
//! and the item-list application.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use docforms_core::{DocFormsError, DocFormsResult};

use crate::document::Document;
use crate::query::Query;
use crate::value::{DocumentId, Value};

/// Async access to stored documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts or replaces a document, assigning an identity on first save.
    async fn save(&self, doc: &mut Document) -> DocFormsResult<()>;

    /// Deletes a stored document.
    async fn delete(&self, doc: &Document) -> DocFormsResult<()>;

    /// Fetches one document by identity.
    async fn get(&self, collection: &str, id: DocumentId) -> DocFormsResult<Document>;

    /// Returns every document matching the query, in query order.
    async fn find(&self, query: &Query) -> DocFormsResult<Vec<Document>>;

    /// Counts the documents matching the query.
    async fn count(&self, query: &Query) -> DocFormsResult<usize>;

    /// Appends `value` to the list in `field` of a stored parent.
    async fn push(&self, parent: &mut Document, field: &str, value: Value) -> DocFormsResult<()>;

    /// Replaces element `index` of the list in `field` of a stored parent.
    async fn set_at(
        &self,
        parent: &mut Document,
        field: &str,
        index: usize,
        value: Value,
    ) -> DocFormsResult<()>;
}

/// An in-memory [`DocumentStore`].
///
/// Documents keep insertion order within a collection. The store can be
/// switched into an unavailable state to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call fail with `StoreFailure` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> DocFormsResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DocFormsError::StoreFailure(
                "document store unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn stored_id(doc: &Document) -> DocFormsResult<DocumentId> {
        doc.id().ok_or_else(|| {
            DocFormsError::NotFound(format!("unsaved {} has no identity", doc.schema().name()))
        })
    }

    async fn update_list<F>(
        &self,
        parent: &mut Document,
        field: &str,
        edit: F,
    ) -> DocFormsResult<()>
    where
        F: Fn(&mut Vec<Value>) -> DocFormsResult<()> + Send,
    {
        self.check_available()?;
        let id = Self::stored_id(parent)?;
        let collection = parent.schema().collection().to_string();
        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id() == Some(id)))
            .ok_or_else(|| DocFormsError::NotFound(format!("{collection} {id}")))?;

        let mut list = match stored.get(field) {
            Value::List(items) => items.clone(),
            Value::Null => Vec::new(),
            other => {
                return Err(DocFormsError::Conflict(format!(
                    "field '{field}' holds {other}, not a list"
                )))
            }
        };
        edit(&mut list)?;
        stored.set(field, Value::List(list.clone()));
        stored.clear_changed();
        drop(collections);

        parent.set(field, Value::List(list));
        parent.clear_changed();
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn save(&self, doc: &mut Document) -> DocFormsResult<()> {
        self.check_available()?;
        let id = match doc.id() {
            Some(id) => id,
            None => {
                let id = DocumentId::new();
                doc.set_id(id);
                id
            }
        };
        doc.clear_changed();

        let collection = doc.schema().collection().to_string();
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.clone()).or_default();
        match docs.iter_mut().find(|d| d.id() == Some(id)) {
            Some(existing) => *existing = doc.clone(),
            None => docs.push(doc.clone()),
        }
        drop(collections);
        tracing::debug!(collection = %collection, id = %id, "document saved");
        Ok(())
    }

    async fn delete(&self, doc: &Document) -> DocFormsResult<()> {
        self.check_available()?;
        let id = Self::stored_id(doc)?;
        let collection = doc.schema().collection();
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| DocFormsError::NotFound(format!("{collection} {id}")))?;
        let before = docs.len();
        docs.retain(|d| d.id() != Some(id));
        if docs.len() == before {
            return Err(DocFormsError::NotFound(format!("{collection} {id}")));
        }
        drop(collections);
        tracing::debug!(collection, id = %id, "document deleted");
        Ok(())
    }

    async fn get(&self, collection: &str, id: DocumentId) -> DocFormsResult<Document> {
        self.check_available()?;
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id() == Some(id)))
            .cloned()
            .ok_or_else(|| DocFormsError::NotFound(format!("{collection} {id}")))
    }

    async fn find(&self, query: &Query) -> DocFormsResult<Vec<Document>> {
        self.check_available()?;
        let mut found: Vec<Document> = self
            .collections
            .read()
            .await
            .get(&query.collection)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();
        query.sort(&mut found);
        Ok(found)
    }

    async fn count(&self, query: &Query) -> DocFormsResult<usize> {
        self.check_available()?;
        Ok(self
            .collections
            .read()
            .await
            .get(&query.collection)
            .map_or(0, |docs| docs.iter().filter(|d| query.matches(d)).count()))
    }

    async fn push(&self, parent: &mut Document, field: &str, value: Value) -> DocFormsResult<()> {
        self.update_list(parent, field, |list| {
            list.push(value.clone());
            Ok(())
        })
        .await
    }

    async fn set_at(
        &self,
        parent: &mut Document,
        field: &str,
        index: usize,
        value: Value,
    ) -> DocFormsResult<()> {
        self.update_list(parent, field, |list| {
            let len = list.len();
            let slot = list.get_mut(index).ok_or_else(|| {
                DocFormsError::Conflict(format!(
                    "position {index} is out of range for '{field}' (length {len})"
                ))
            })?;
            *slot = value.clone();
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fields::{DocFieldDef, DocFieldType};
    use crate::query::Filter;
    use crate::schema::DocumentSchema;

    fn schema() -> Arc<DocumentSchema> {
        DocumentSchema::new("Item")
            .field(DocFieldDef::new("text", DocFieldType::String))
            .field(DocFieldDef::new(
                "notes",
                DocFieldType::List(Box::new(DocFieldType::String)),
            ))
            .build()
    }

    fn item(text: &str) -> Document {
        let mut doc = Document::new(schema());
        doc.set("text", text);
        doc
    }

    #[tokio::test]
    async fn test_save_assigns_identity_and_clears_changes() {
        let store = MemoryDocumentStore::new();
        let mut doc = item("a");
        store.save(&mut doc).await.unwrap();
        let id = doc.id().unwrap();
        assert_eq!(doc.changed_fields().count(), 0);

        let loaded = store.get("item", id).await.unwrap();
        assert_eq!(loaded.get("text"), &Value::from("a"));
    }

    #[tokio::test]
    async fn test_save_replaces_existing() {
        let store = MemoryDocumentStore::new();
        let mut doc = item("a");
        store.save(&mut doc).await.unwrap();
        doc.set("text", "b");
        store.save(&mut doc).await.unwrap();
        assert_eq!(store.count(&Query::new("item")).await.unwrap(), 1);
        let loaded = store.get("item", doc.id().unwrap()).await.unwrap();
        assert_eq!(loaded.get("text"), &Value::from("b"));
    }

    #[tokio::test]
    async fn test_delete_and_not_found() {
        let store = MemoryDocumentStore::new();
        let mut doc = item("a");
        assert!(store.delete(&doc).await.unwrap_err().is_not_found());
        store.save(&mut doc).await.unwrap();
        store.delete(&doc).await.unwrap();
        assert!(store.delete(&doc).await.unwrap_err().is_not_found());
        assert!(store
            .get("item", doc.id().unwrap())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_find_count_and_excluding() {
        let store = MemoryDocumentStore::new();
        let mut a = item("same");
        let mut b = item("same");
        let mut c = item("other");
        for doc in [&mut a, &mut b, &mut c] {
            store.save(doc).await.unwrap();
        }
        let q = Query::new("item").filter(Filter::equals("text", "same"));
        assert_eq!(store.find(&q).await.unwrap().len(), 2);
        assert_eq!(store.count(&q.clone().excluding(a.id().unwrap())).await.unwrap(), 1);
        assert_eq!(store.count(&Query::new("nothing")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_push_and_set_at() {
        let store = MemoryDocumentStore::new();
        let mut doc = item("a");
        store.save(&mut doc).await.unwrap();
        store.push(&mut doc, "notes", Value::from("one")).await.unwrap();
        store.push(&mut doc, "notes", Value::from("two")).await.unwrap();
        store.set_at(&mut doc, "notes", 1, Value::from("TWO")).await.unwrap();

        let expected = Value::List(vec![Value::from("one"), Value::from("TWO")]);
        assert_eq!(doc.get("notes"), &expected);
        let loaded = store.get("item", doc.id().unwrap()).await.unwrap();
        assert_eq!(loaded.get("notes"), &expected);

        let err = store
            .set_at(&mut doc, "notes", 5, Value::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocFormsError::Conflict(_)));
        let err = store.push(&mut doc, "text", Value::from("x")).await.unwrap_err();
        assert!(matches!(err, DocFormsError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_push_to_unsaved_parent_is_not_found() {
        let store = MemoryDocumentStore::new();
        let mut doc = item("a");
        let err = store.push(&mut doc, "notes", Value::from("x")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(true);
        let mut doc = item("a");
        assert!(matches!(
            store.save(&mut doc).await,
            Err(DocFormsError::StoreFailure(_))
        ));
        store.set_unavailable(false);
        store.save(&mut doc).await.unwrap();
    }
}
