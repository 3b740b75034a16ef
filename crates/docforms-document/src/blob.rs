//! Binary storage for uploaded file content.
//!
//! A [`BlobStore`] keeps named blobs grouped into namespaces, in the manner
//! of GridFS buckets. Names are not required to be unique by the store;
//! callers that want distinct names probe with [`BlobStore::exists`] first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use docforms_core::{DocFormsError, DocFormsResult};

/// A reference to committed blob content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileHandle {
    /// Store-assigned identity of the blob.
    pub id: uuid::Uuid,
    /// The stored name, unique within its namespace when written through
    /// the file saver.
    pub name: String,
    /// The namespace (bucket) holding the blob.
    pub namespace: String,
    /// MIME type recorded at upload.
    pub content_type: String,
    /// Content length in bytes.
    pub length: u64,
    /// Hex-encoded SHA-256 of the content.
    pub sha256: String,
}

/// Async access to blob content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `true` if a blob called `name` exists in `namespace`.
    async fn exists(&self, namespace: &str, name: &str) -> DocFormsResult<bool>;

    /// Stores `content` and returns a handle to it.
    async fn put(
        &self,
        namespace: &str,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> DocFormsResult<FileHandle>;

    /// Reads back the content behind a handle.
    async fn get(&self, handle: &FileHandle) -> DocFormsResult<Vec<u8>>;

    /// Deletes the blob behind a handle.
    async fn delete(&self, handle: &FileHandle) -> DocFormsResult<()>;

    /// Lists every handle in a namespace, oldest first.
    async fn list(&self, namespace: &str) -> DocFormsResult<Vec<FileHandle>>;
}

/// An in-memory [`BlobStore`].
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<Vec<(FileHandle, Vec<u8>)>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs held across all namespaces.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Returns `true` when the store holds no blobs.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

fn digest(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, namespace: &str, name: &str) -> DocFormsResult<bool> {
        Ok(self
            .blobs
            .read()
            .await
            .iter()
            .any(|(h, _)| h.namespace == namespace && h.name == name))
    }

    async fn put(
        &self,
        namespace: &str,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> DocFormsResult<FileHandle> {
        let handle = FileHandle {
            id: uuid::Uuid::new_v4(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            content_type: content_type.to_string(),
            length: content.len() as u64,
            sha256: digest(&content),
        };
        self.blobs.write().await.push((handle.clone(), content));
        tracing::debug!(namespace, name, length = handle.length, "blob stored");
        Ok(handle)
    }

    async fn get(&self, handle: &FileHandle) -> DocFormsResult<Vec<u8>> {
        self.blobs
            .read()
            .await
            .iter()
            .find(|(h, _)| h.id == handle.id)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| DocFormsError::NotFound(format!("blob '{}'", handle.name)))
    }

    async fn delete(&self, handle: &FileHandle) -> DocFormsResult<()> {
        let mut blobs = self.blobs.write().await;
        let Some(index) = blobs.iter().position(|(h, _)| h.id == handle.id) else {
            return Err(DocFormsError::NotFound(format!("blob '{}'", handle.name)));
        };
        blobs.remove(index);
        drop(blobs);
        tracing::debug!(namespace = %handle.namespace, name = %handle.name, "blob deleted");
        Ok(())
    }

    async fn list(&self, namespace: &str) -> DocFormsResult<Vec<FileHandle>> {
        Ok(self
            .blobs
            .read()
            .await
            .iter()
            .filter(|(h, _)| h.namespace == namespace)
            .map(|(h, _)| h.clone())
            .collect())
    }
}
