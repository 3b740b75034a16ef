//! # docforms-document
//!
//! The document layer docforms binds forms to: schemas, document instances,
//! field values, query predicates, and the async [`DocumentStore`] and
//! [`BlobStore`] boundaries with in-memory implementations.
//!
//! ## Module Overview
//!
//! - [`value`] - [`Value`] and [`DocumentId`]
//! - [`fields`] - Field definitions ([`DocFieldDef`]) and types
//! - [`schema`] - [`DocumentSchema`]
//! - [`document`] - [`Document`] instances with change tracking
//! - [`query`] - [`Filter`] and [`Query`]
//! - [`store`] - [`DocumentStore`] and [`MemoryDocumentStore`]
//! - [`blob`] - [`BlobStore`], [`FileHandle`] and [`MemoryBlobStore`]
//! - [`validators`] - Field validators

pub mod blob;
pub mod document;
pub mod fields;
pub mod query;
pub mod schema;
pub mod store;
pub mod validators;
pub mod value;

pub use blob::{BlobStore, FileHandle, MemoryBlobStore};
pub use document::Document;
pub use fields::{DocFieldDef, DocFieldType, FieldDefault};
pub use query::{Filter, Query};
pub use schema::{DocumentSchema, ID_FIELD};
pub use store::{DocumentStore, MemoryDocumentStore};
pub use validators::Validator;
pub use value::{DocumentId, EmbeddedValues, Value};
