//! The validation pipeline behind document forms.
//!
//! Field cleaning coerces submitted strings and collects uploads;
//! [`compute_exclusions`] decides which document fields the form answers
//! for; [`validate_document`] runs the document's own field checks and
//! schema hook over everything else. Errors accumulate across all three
//! rather than short-circuiting.

use std::collections::{BTreeMap, BTreeSet};

use docforms_core::ValidationError;
use docforms_document::{Document, Value};

use crate::bound_field::html_name;
use crate::data::FormData;
use crate::document_form::{CleanedData, ErrorMap, FormDescriptor};
use crate::fields::{
    check_image_name, clean_field_value, clean_multi_value, FormFieldDef, FormFieldType,
};
use crate::files::PendingUpload;
use crate::widgets::ClearableFileInput;

/// The outcome of cleaning one file field.
enum FileOutcome {
    Keep(Value),
    Pending(PendingUpload),
}

/// Performs field-level cleaning for every field.
///
/// Disabled fields take their initial value. File fields never read text
/// data: an upload becomes a [`PendingUpload`] and the field's current
/// value is carried into `cleaned` otherwise.
pub fn clean_fields(
    fields: &[FormFieldDef],
    data: &FormData,
    prefix: Option<&str>,
    initial: &CleanedData,
    cleaned: &mut CleanedData,
    errors: &mut ErrorMap,
    uploads: &mut BTreeMap<String, PendingUpload>,
) {
    for field in fields {
        let existing = initial.get(&field.name).or(field.initial.as_ref());
        if field.disabled {
            if let Some(value) = existing {
                cleaned.insert(field.name.clone(), value.clone());
            }
            continue;
        }

        let name = html_name(prefix, &field.name);
        if field.field_type.is_file() {
            match clean_file_field(field, &name, data, existing) {
                Ok(FileOutcome::Keep(value)) => {
                    cleaned.insert(field.name.clone(), value);
                }
                Ok(FileOutcome::Pending(pending)) => {
                    uploads.insert(field.name.clone(), pending);
                }
                Err(messages) => {
                    errors.entry(field.name.clone()).or_default().extend(messages);
                }
            }
            continue;
        }

        let result = if field.field_type.is_multi() {
            clean_multi_value(field, data.get_list(&name))
        } else {
            clean_field_value(field, data.get(&name))
        };
        match result {
            Ok(value) => {
                cleaned.insert(field.name.clone(), value);
            }
            Err(messages) => {
                errors.entry(field.name.clone()).or_default().extend(messages);
            }
        }
    }
}

fn clean_file_field(
    field: &FormFieldDef,
    name: &str,
    data: &FormData,
    existing: Option<&Value>,
) -> Result<FileOutcome, Vec<String>> {
    let pending = match field.field_type {
        FormFieldType::File | FormFieldType::Image => {
            if let Some(upload) = data.file(name) {
                if matches!(field.field_type, FormFieldType::Image) {
                    check_image_name(&upload.name).map_err(|e| vec![e])?;
                }
                Some(PendingUpload::Replace(upload.clone()))
            } else if !field.required
                && data.get(&ClearableFileInput::clear_checkbox_name(name)).is_some()
            {
                Some(PendingUpload::Clear)
            } else {
                None
            }
        }
        FormFieldType::FileList => {
            let mut slots: Vec<Option<_>> = Vec::new();
            for (key, upload) in data.files_with_prefix(name) {
                let Ok(index) = key.parse::<usize>() else { continue };
                if slots.len() <= index {
                    slots.resize(index + 1, None);
                }
                slots[index] = Some(upload.clone());
            }
            (!slots.is_empty()).then_some(PendingUpload::List(slots))
        }
        FormFieldType::FileMap => {
            let uploads: BTreeMap<String, Option<_>> = data
                .files_with_prefix(name)
                .map(|(key, upload)| (key.to_string(), Some(upload.clone())))
                .collect();
            (!uploads.is_empty()).then_some(PendingUpload::Map(uploads))
        }
        _ => None,
    };

    if let Some(pending) = pending {
        return Ok(FileOutcome::Pending(pending));
    }
    let current = existing.cloned().unwrap_or(Value::Null);
    if field.required && current.is_empty() {
        return Err(vec![field.required_message()]);
    }
    Ok(FileOutcome::Keep(current))
}

/// The schema fields the document should not validate for this form.
///
/// A field is excluded when it is not on the form, when the form's
/// allow/deny lists leave it out, when it already has a form error, or when
/// it is optional on the document and its cleaned value is empty. A
/// required field with a non-empty value is excluded only by the first
/// three rules.
pub fn compute_exclusions(
    descriptor: &FormDescriptor,
    cleaned: &CleanedData,
    errors: &ErrorMap,
) -> BTreeSet<String> {
    descriptor
        .schema()
        .fields()
        .iter()
        .filter(|field| {
            let name = field.name.as_str();
            descriptor.field(name).is_none()
                || !descriptor.includes(name)
                || errors.contains_key(name)
                || (!field.required && cleaned.get(name).map_or(true, Value::is_empty))
        })
        .map(|field| field.name.clone())
        .collect()
}

/// Runs document-level validation over a candidate instance.
///
/// Returns the accumulated errors and the excluded fields whose value is
/// empty; those are dropped from the document before it is stored. Fields
/// in `deferred` still wait on an upload and are skipped.
pub fn validate_document(
    instance: &Document,
    exclusions: &BTreeSet<String>,
    deferred: &BTreeSet<String>,
) -> (ErrorMap, Vec<String>) {
    let mut errors = ErrorMap::new();
    let mut drop_before_save = Vec::new();

    for field in instance.schema().fields() {
        if deferred.contains(&field.name) {
            continue;
        }
        let value = instance.get(&field.name);
        if exclusions.contains(&field.name) {
            if value.is_empty() && instance.has(&field.name) {
                drop_before_save.push(field.name.clone());
            }
            continue;
        }
        if let Err(e) = field.validate(value) {
            errors.entry(field.name.clone()).or_default().push(e.message);
        }
    }

    if let Err(e) = instance.schema().run_clean(instance) {
        merge_validation_error(&mut errors, &e);
    }
    (errors, drop_before_save)
}

/// Folds a [`ValidationError`] into an error map.
pub fn merge_validation_error(errors: &mut ErrorMap, error: &ValidationError) {
    for (field, messages) in error.message_dict() {
        errors.entry(field).or_default().extend(messages);
    }
}
