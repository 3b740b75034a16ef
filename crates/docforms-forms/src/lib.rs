//! # docforms-forms
//!
//! Forms bound to documents. A document schema is described once into a
//! [`FormDescriptor`](document_form::FormDescriptor); each request binds
//! submitted data to a [`DocumentForm`](form::DocumentForm), validates it
//! against the form fields, the document's own constraints and the store's
//! uniqueness rules, and saves it. Formsets edit many documents, or the
//! embedded documents of one parent, on a single page.
//!
//! ## Module Overview
//!
//! - [`data`] - Submitted text values and uploads ([`FormData`])
//! - [`fields`] - Form field types and value cleaning
//! - [`widgets`] - HTML widgets
//! - [`bound_field`] - Fields bound to values and errors, for rendering
//! - [`generator`] - Mapping document fields to form fields
//! - [`document_form`] - Form descriptors built from schemas
//! - [`descriptor_cache`] - Process-wide descriptor cache
//! - [`validation`] - Cleaning, exclusions and document validation
//! - [`unique`] - Uniqueness checks against the store
//! - [`files`] - Writing uploads to the blob store
//! - [`form`] - The [`Form`] trait, [`BaseForm`] and [`DocumentForm`]
//! - [`embedded`] - [`EmbeddedDocumentForm`]
//! - [`formset`] - [`DocumentFormSet`] and [`EmbeddedDocumentFormSet`]

pub mod bound_field;
pub mod data;
pub mod descriptor_cache;
pub mod document_form;
pub mod embedded;
pub mod fields;
pub mod files;
pub mod form;
pub mod formset;
pub mod generator;
pub mod unique;
pub mod validation;
pub mod widgets;

pub use data::{FormData, UploadedFile};
pub use document_form::{
    build_form_descriptor, describe, document_to_dict, CleanedData, DocumentFormConfig, ErrorMap,
    FormDescriptor,
};
pub use embedded::EmbeddedDocumentForm;
pub use fields::{FormFieldDef, FormFieldType};
pub use form::{BaseForm, DocumentForm, Form, FormState, Stores};
pub use formset::{DocumentFormSet, EmbeddedDocumentFormSet, FormSetOptions};
pub use generator::{DefaultFieldGenerator, FieldGenerator};
pub use widgets::WidgetType;
