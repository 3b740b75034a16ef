//! Writing uploads to the blob store.
//!
//! Uploads reach a document as [`PendingUpload`]s and are written here when
//! a form commits. Stored names never collide within a namespace: a taken
//! name gets a numeric suffix before its extension (`photo_1.jpg`). The
//! probe checks and then writes, so two concurrent uploads of the same name
//! can still both pick the same free name.

use std::collections::BTreeMap;

use docforms_core::{DocFormsError, DocFormsResult};
use docforms_document::{BlobStore, FileHandle, Value};

use crate::data::UploadedFile;

/// A file submission waiting to be written to the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingUpload {
    /// Replace a single file field's content.
    Replace(UploadedFile),
    /// Clear a single file field, deleting its blob.
    Clear,
    /// Index-addressed uploads into a list of files. `None` keeps the
    /// existing element.
    List(Vec<Option<UploadedFile>>),
    /// Key-addressed uploads into a map of files. `None` entries are skipped.
    Map(BTreeMap<String, Option<UploadedFile>>),
}

/// Splits a file name into root and extension the way path extensions
/// split: at the last dot of the final component, ignoring leading dots.
///
/// ```
/// use docforms_forms::files::split_extension;
///
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_extension("README"), ("README", ""));
/// ```
pub fn split_extension(name: &str) -> (&str, &str) {
    let base_start = name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let base = &name[base_start..];
    let leading = base.len() - base.trim_start_matches('.').len();
    match base[leading..].rfind('.') {
        Some(dot) => name.split_at(base_start + leading + dot),
        None => (name, ""),
    }
}

/// Reduces a client-supplied file name to its final path component.
fn clean_name(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() {
        "upload"
    } else {
        base
    }
}

/// Finds a name that does not yet exist in `namespace`, probing
/// `root_1.ext`, `root_2.ext` and so on.
pub async fn unique_filename(
    blobs: &dyn BlobStore,
    namespace: &str,
    name: &str,
) -> DocFormsResult<String> {
    let name = clean_name(name);
    let (root, ext) = split_extension(name);
    let mut candidate = name.to_string();
    let mut counter = 1_u32;
    while blobs.exists(namespace, &candidate).await? {
        candidate = format!("{root}_{counter}{ext}");
        counter += 1;
    }
    Ok(candidate)
}

/// Deletes a blob, treating one that is already gone as deleted.
pub async fn clear_file(blobs: &dyn BlobStore, handle: &FileHandle) -> DocFormsResult<()> {
    match blobs.delete(handle).await {
        Ok(()) | Err(DocFormsError::NotFound(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Stores an upload, deleting the blob it replaces first.
pub async fn save_uploaded_file(
    blobs: &dyn BlobStore,
    namespace: &str,
    upload: &UploadedFile,
    previous: Option<&FileHandle>,
) -> DocFormsResult<FileHandle> {
    if let Some(previous) = previous {
        clear_file(blobs, previous).await?;
    }
    let name = unique_filename(blobs, namespace, &upload.name).await?;
    let handle = blobs
        .put(namespace, &name, &upload.content_type, upload.content.clone())
        .await?;
    tracing::info!(
        namespace,
        name = %handle.name,
        length = handle.length,
        replaced = previous.is_some(),
        "upload stored"
    );
    Ok(handle)
}

/// Applies index-addressed uploads to a list of stored files.
///
/// An index past the end appends.
pub async fn save_file_list(
    blobs: &dyn BlobStore,
    namespace: &str,
    existing: &[Value],
    uploads: &[Option<UploadedFile>],
) -> DocFormsResult<Vec<Value>> {
    let mut files = existing.to_vec();
    for (index, upload) in uploads.iter().enumerate() {
        let Some(upload) = upload else { continue };
        let previous = files.get(index).and_then(Value::as_file).cloned();
        let handle = save_uploaded_file(blobs, namespace, upload, previous.as_ref()).await?;
        match files.get_mut(index) {
            Some(slot) => *slot = Value::File(handle),
            None => files.push(Value::File(handle)),
        }
    }
    Ok(files)
}

/// Applies key-addressed uploads to a map of stored files.
pub async fn save_file_map(
    blobs: &dyn BlobStore,
    namespace: &str,
    existing: &BTreeMap<String, Value>,
    uploads: &BTreeMap<String, Option<UploadedFile>>,
) -> DocFormsResult<BTreeMap<String, Value>> {
    let mut files = existing.clone();
    for (key, upload) in uploads {
        let Some(upload) = upload else { continue };
        let previous = files.get(key).and_then(Value::as_file).cloned();
        let handle = save_uploaded_file(blobs, namespace, upload, previous.as_ref()).await?;
        files.insert(key.clone(), Value::File(handle));
    }
    Ok(files)
}

/// Resolves a pending upload against the field's current value, returning
/// the value to store.
pub async fn resolve_pending(
    blobs: &dyn BlobStore,
    namespace: &str,
    pending: &PendingUpload,
    existing: &Value,
) -> DocFormsResult<Value> {
    match pending {
        PendingUpload::Replace(upload) => {
            save_uploaded_file(blobs, namespace, upload, existing.as_file())
                .await
                .map(Value::File)
        }
        PendingUpload::Clear => {
            if let Some(handle) = existing.as_file() {
                clear_file(blobs, handle).await?;
            }
            Ok(Value::Null)
        }
        PendingUpload::List(uploads) => {
            let current = existing.as_list().unwrap_or_default();
            save_file_list(blobs, namespace, current, uploads)
                .await
                .map(Value::List)
        }
        PendingUpload::Map(uploads) => {
            let empty = BTreeMap::new();
            let current = existing.as_map().unwrap_or(&empty);
            save_file_map(blobs, namespace, current, uploads)
                .await
                .map(Value::Map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docforms_document::MemoryBlobStore;

    fn upload(name: &str, content: &[u8]) -> UploadedFile {
        UploadedFile::new(name, "application/octet-stream", content.to_vec())
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("photo.jpg"), ("photo", ".jpg"));
        assert_eq!(split_extension("dir.v2/notes"), ("dir.v2/notes", ""));
        assert_eq!(split_extension("..hidden.txt"), ("..hidden", ".txt"));
    }

    #[test]
    fn test_clean_name_strips_client_paths() {
        assert_eq!(clean_name(r"C:\Users\me\photo.jpg"), "photo.jpg");
        assert_eq!(clean_name("../../etc/passwd"), "passwd");
        assert_eq!(clean_name(""), "upload");
    }

    #[tokio::test]
    async fn test_same_name_uploads_get_distinct_names() {
        let blobs = MemoryBlobStore::new();
        let a = save_uploaded_file(&blobs, "fs", &upload("photo.jpg", b"a"), None)
            .await
            .unwrap();
        let b = save_uploaded_file(&blobs, "fs", &upload("photo.jpg", b"b"), None)
            .await
            .unwrap();
        let c = save_uploaded_file(&blobs, "fs", &upload("photo.jpg", b"c"), None)
            .await
            .unwrap();
        assert_eq!(a.name, "photo.jpg");
        assert_eq!(b.name, "photo_1.jpg");
        assert_eq!(c.name, "photo_2.jpg");
    }

    #[tokio::test]
    async fn test_probe_is_per_namespace() {
        let blobs = MemoryBlobStore::new();
        save_uploaded_file(&blobs, "fs", &upload("a.txt", b"1"), None)
            .await
            .unwrap();
        let other = save_uploaded_file(&blobs, "thumbs", &upload("a.txt", b"2"), None)
            .await
            .unwrap();
        assert_eq!(other.name, "a.txt");
    }

    #[tokio::test]
    async fn test_replacing_deletes_previous_blob() {
        let blobs = MemoryBlobStore::new();
        let old = save_uploaded_file(&blobs, "fs", &upload("a.txt", b"old"), None)
            .await
            .unwrap();
        let new = save_uploaded_file(&blobs, "fs", &upload("a.txt", b"new"), Some(&old))
            .await
            .unwrap();
        assert_eq!(new.name, "a.txt");
        assert_eq!(blobs.len().await, 1);
        assert!(blobs.get(&old).await.unwrap_err().is_not_found());
        assert_eq!(blobs.get(&new).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_file_list_replaces_and_appends() {
        let blobs = MemoryBlobStore::new();
        let first = save_uploaded_file(&blobs, "fs", &upload("0.txt", b"0"), None)
            .await
            .unwrap();
        let second = save_uploaded_file(&blobs, "fs", &upload("1.txt", b"1"), None)
            .await
            .unwrap();
        let existing = vec![Value::File(first.clone()), Value::File(second.clone())];

        let uploads = vec![
            None,
            Some(upload("x.txt", b"x")),
            None,
            None,
            Some(upload("y.txt", b"y")),
        ];
        let files = save_file_list(&blobs, "fs", &existing, &uploads).await.unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0], Value::File(first));
        assert_eq!(files[1].as_file().unwrap().name, "x.txt");
        assert_eq!(files[2].as_file().unwrap().name, "y.txt");
        assert!(blobs.get(&second).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_file_map_inserts_and_replaces() {
        let blobs = MemoryBlobStore::new();
        let cover = save_uploaded_file(&blobs, "fs", &upload("cover.png", b"c"), None)
            .await
            .unwrap();
        let mut existing = BTreeMap::new();
        existing.insert("cover".to_string(), Value::File(cover.clone()));

        let mut uploads = BTreeMap::new();
        uploads.insert("cover".to_string(), Some(upload("cover.png", b"c2")));
        uploads.insert("back".to_string(), Some(upload("back.png", b"b")));
        uploads.insert("spine".to_string(), None);
        let files = save_file_map(&blobs, "fs", &existing, &uploads).await.unwrap();

        assert_eq!(files.len(), 2);
        assert!(!files.contains_key("spine"));
        assert_ne!(files["cover"], Value::File(cover.clone()));
        assert!(blobs.get(&cover).await.unwrap_err().is_not_found());
        assert_eq!(blobs.len().await, 2);
    }

    #[tokio::test]
    async fn test_resolve_clear_deletes_blob() {
        let blobs = MemoryBlobStore::new();
        let handle = save_uploaded_file(&blobs, "fs", &upload("a.txt", b"a"), None)
            .await
            .unwrap();
        let value = resolve_pending(&blobs, "fs", &PendingUpload::Clear, &Value::File(handle))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
        assert!(blobs.is_empty().await);

        let value = resolve_pending(&blobs, "fs", &PendingUpload::Clear, &Value::Null)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }
}
