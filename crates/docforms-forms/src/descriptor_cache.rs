//! Process-wide cache of built form descriptors.
//!
//! A form type is described once; every later request shares the same
//! `Arc<FormDescriptor>`. Entries live for the process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use docforms_core::DocFormsResult;

use crate::document_form::FormDescriptor;

type Registry = RwLock<HashMap<String, Arc<FormDescriptor>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the cached descriptor for `name`, building and caching it on
/// first use. A failed build is not cached.
///
/// ```
/// use docforms_document::{DocFieldDef, DocFieldType, DocumentSchema};
/// use docforms_forms::descriptor_cache::get_or_build;
/// use docforms_forms::document_form::{build_form_descriptor, DocumentFormConfig};
///
/// let schema = DocumentSchema::new("Note")
///     .field(DocFieldDef::new("text", DocFieldType::String))
///     .build();
/// let build = || build_form_descriptor(DocumentFormConfig::new("NoteForm", schema.clone()));
/// let a = get_or_build("NoteForm", build).unwrap();
/// let b = get_or_build("NoteForm", build).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
pub fn get_or_build<F>(name: &str, build: F) -> DocFormsResult<Arc<FormDescriptor>>
where
    F: FnOnce() -> DocFormsResult<FormDescriptor>,
{
    if let Some(found) = get(name) {
        return Ok(found);
    }
    let built = Arc::new(build()?);
    let mut registry = registry().write().unwrap_or_else(PoisonError::into_inner);
    let entry = registry
        .entry(name.to_string())
        .or_insert_with(|| Arc::clone(&built));
    tracing::debug!(form = name, fields = entry.fields().len(), "form descriptor cached");
    Ok(Arc::clone(entry))
}

/// Returns the cached descriptor for `name`, if any.
pub fn get(name: &str) -> Option<Arc<FormDescriptor>> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
}
