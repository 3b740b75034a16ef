//! # docforms
//!
//! Forms bound to schema-flexible documents.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `docforms` to get everything, or on the individual
//! crates for finer-grained control.

/// Errors, settings, logging setup and text helpers.
pub use docforms_core as core;

/// Document schemas, values, and the document and blob store boundaries.
#[cfg(feature = "document")]
pub use docforms_document as document;

/// Document forms, embedded forms, formsets and upload handling.
#[cfg(feature = "forms")]
pub use docforms_forms as forms;

// Third-party re-exports
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;

/// The names most applications need.
pub mod prelude {
    pub use docforms_core::{DocFormsError, DocFormsResult, ValidationError, SETTINGS};

    #[cfg(feature = "document")]
    pub use docforms_document::{
        BlobStore, DocFieldDef, DocFieldType, Document, DocumentId, DocumentSchema,
        DocumentStore, Filter, Query, Value,
    };

    #[cfg(feature = "forms")]
    pub use docforms_forms::{
        describe, DocumentForm, DocumentFormConfig, DocumentFormSet, EmbeddedDocumentForm,
        EmbeddedDocumentFormSet, Form, FormData, FormSetOptions, Stores, UploadedFile,
    };
}
