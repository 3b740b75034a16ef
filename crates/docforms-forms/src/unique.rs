//! Uniqueness checks against the document store.
//!
//! Every field declared unique, alone or together with peers, becomes one
//! count query that matches other documents holding the same values. A
//! peer that is a list of references matches only lists containing every
//! id and of the same length.

use std::collections::BTreeSet;

use docforms_core::utils::text::{capfirst, pretty_name};
use docforms_core::DocFormsResult;
use docforms_document::{DocFieldDef, Document, DocumentStore, Filter, Query};

/// A uniqueness failure attributed to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The unique field.
    pub field: String,
    /// The message shown to the user.
    pub message: String,
}

fn unique_filter(instance: &Document, field: &DocFieldDef) -> Filter {
    let schema = instance.schema();
    let mut filter = Filter::equals(&field.name, instance.get(&field.name).clone());
    for peer in &field.unique_with {
        let value = instance.get(peer);
        let is_reference_list = schema
            .get_field(peer)
            .is_some_and(|p| p.field_type.is_reference_list());
        if is_reference_list {
            let items = value.as_list().unwrap_or_default();
            for item in items {
                filter = filter.and(Filter::contains(peer, item.clone()));
            }
            filter = filter.and(Filter::size(peer, items.len()));
        } else {
            filter = filter.and(Filter::equals(peer, value.clone()));
        }
    }
    filter
}

/// Checks the unique constraints of `instance` that are not in
/// `exclusions`, ignoring the instance itself.
pub async fn validate_unique(
    store: &dyn DocumentStore,
    instance: &Document,
    exclusions: &BTreeSet<String>,
) -> DocFormsResult<Vec<FieldError>> {
    let schema = instance.schema();
    let mut errors = Vec::new();

    for field in schema.fields() {
        if !(field.unique || !field.unique_with.is_empty()) || exclusions.contains(&field.name) {
            continue;
        }
        let mut query = Query::new(schema.collection()).filter(unique_filter(instance, field));
        if let Some(id) = instance.id() {
            query = query.excluding(id);
        }
        if store.count(&query).await? > 0 {
            tracing::debug!(
                document = schema.name(),
                field = %field.name,
                "unique constraint violated"
            );
            errors.push(FieldError {
                field: field.name.clone(),
                message: format!(
                    "{} with this {} already exists.",
                    capfirst(schema.verbose_name()),
                    pretty_name(&field.name)
                ),
            });
        }
    }
    Ok(errors)
}
