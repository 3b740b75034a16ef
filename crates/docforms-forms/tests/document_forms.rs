//! Integration tests for document forms, uploads and formsets over the
//! in-memory stores.

use std::collections::BTreeSet;
use std::sync::Arc;

use docforms_core::DocFormsError;
use docforms_document::{
    BlobStore, DocFieldDef, DocFieldType, Document, DocumentId, DocumentSchema, DocumentStore,
    MemoryBlobStore, Query, Value,
};
use docforms_forms::files::save_uploaded_file;
use docforms_forms::validation::compute_exclusions;
use docforms_forms::{
    build_form_descriptor, describe, CleanedData, DocumentForm, DocumentFormConfig,
    EmbeddedDocumentFormSet, ErrorMap, Form, FormData, FormSetOptions, FormState, Stores,
    UploadedFile,
};

// ============================================================================
// Shared helpers
// ============================================================================

fn item_schema() -> Arc<DocumentSchema> {
    DocumentSchema::new("Item")
        .field(DocFieldDef::new(
            "user",
            DocFieldType::Reference {
                document: "User".into(),
            },
        ))
        .field(DocFieldDef::new("text", DocFieldType::String).required().max_length(200))
        .field(DocFieldDef::new("picture", DocFieldType::Image))
        .field(DocFieldDef::new("created", DocFieldType::DateTime))
        .build()
}

fn item_form(stores: &Stores) -> DocumentForm {
    let descriptor = describe(&item_schema(), None, Some(&["user", "created"]), None).unwrap();
    DocumentForm::new(Arc::new(descriptor), stores.clone())
}

fn photo(content: &[u8]) -> UploadedFile {
    UploadedFile::new("photo.jpg", "image/jpeg", content.to_vec())
}

// ============================================================================
// Descriptor order
// ============================================================================

#[test]
fn test_descriptor_order_follows_schema_for_every_combination() {
    let schema = item_schema();
    let all = ["user", "text", "picture", "created"];
    let subsets: Vec<Vec<&str>> = (0..16_u32)
        .map(|mask| {
            all.iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, name)| *name)
                .collect()
        })
        .collect();

    for fields in &subsets {
        for exclude in &subsets {
            let fields_arg = (!fields.is_empty()).then_some(fields.as_slice());
            let exclude_arg = (!exclude.is_empty()).then_some(exclude.as_slice());
            let d = describe(&schema, fields_arg, exclude_arg, None).unwrap();
            let expected: Vec<&str> = all
                .iter()
                .copied()
                .filter(|n| fields_arg.map_or(true, |f| f.contains(n)))
                .filter(|n| !exclude.contains(n))
                .collect();
            assert_eq!(d.field_names(), expected, "fields={fields:?} exclude={exclude:?}");
        }
    }
}

#[test]
fn test_unknown_field_is_a_configuration_error() {
    let err = describe(&item_schema(), Some(&["text", "nope"]), None, None).unwrap_err();
    assert!(matches!(err, DocFormsError::Configuration(_)));
}

// ============================================================================
// Save without validation
// ============================================================================

#[tokio::test]
async fn test_bound_form_saved_without_validation_is_rejected() {
    let stores = Stores::memory();
    let mut form = item_form(&stores);
    form.bind(&FormData::new());
    assert_eq!(form.state(), FormState::Bound);
    assert!(matches!(
        form.save(true).await,
        Err(DocFormsError::IllegalSave(_))
    ));
    assert!(matches!(
        form.save(false).await,
        Err(DocFormsError::IllegalSave(_))
    ));
    let count = stores.documents.count(&Query::new("item")).await.unwrap();
    assert_eq!(count, 0);
}

// ============================================================================
// Exclusions
// ============================================================================

#[test]
fn test_exclusions_keep_required_non_empty_fields() {
    let values = [Value::Null, Value::from(""), Value::from("x"), Value::Int(3)];
    for required in [false, true] {
        let mut field = DocFieldDef::new("a", DocFieldType::String);
        if required {
            field = field.required();
        }
        let schema = DocumentSchema::new("Thing")
            .field(field)
            .field(DocFieldDef::new("b", DocFieldType::String))
            .build();
        let descriptor = describe(&schema, None, None, None).unwrap();
        for value in &values {
            let mut cleaned = CleanedData::new();
            cleaned.insert("a".into(), value.clone());
            let excluded = compute_exclusions(&descriptor, &cleaned, &ErrorMap::new());
            if required && !value.is_empty() {
                assert!(!excluded.contains("a"), "value={value:?}");
            }
            if !required && value.is_empty() {
                assert!(excluded.contains("a"));
            }
        }
    }
}

// ============================================================================
// Uniqueness
// ============================================================================

#[tokio::test]
async fn test_unique_conflict_reported_once_and_cleared_by_delete() {
    let schema = DocumentSchema::new("Account")
        .field(DocFieldDef::new("username", DocFieldType::String).required().unique())
        .build();
    let descriptor = Arc::new(describe(&schema, None, None, None).unwrap());
    let stores = Stores::memory();
    let data = FormData::parse("username=ann");

    let mut first = DocumentForm::new(Arc::clone(&descriptor), stores.clone());
    first.bind(&data);
    assert!(first.is_valid().await.unwrap());
    let saved = first.save(true).await.unwrap();

    let mut second = DocumentForm::new(Arc::clone(&descriptor), stores.clone());
    second.bind(&data);
    assert!(!second.is_valid().await.unwrap());
    assert_eq!(second.unique_errors().len(), 1);
    assert_eq!(second.unique_errors()[0].field, "username");

    stores.documents.delete(&saved).await.unwrap();
    let mut again = DocumentForm::new(descriptor, stores.clone());
    again.bind(&data);
    assert!(again.is_valid().await.unwrap());
    assert!(again.unique_errors().is_empty());
}

#[tokio::test]
async fn test_unique_with_reference_list_needs_equal_length() {
    let schema = DocumentSchema::new("Playlist")
        .field(
            DocFieldDef::new("name", DocFieldType::String)
                .required()
                .unique_with(["songs"]),
        )
        .field(DocFieldDef::new(
            "songs",
            DocFieldType::List(Box::new(DocFieldType::Reference {
                document: "Song".into(),
            })),
        ))
        .build();
    let descriptor = Arc::new(describe(&schema, None, None, None).unwrap());
    let stores = Stores::memory();
    let (s1, s2) = (DocumentId::new(), DocumentId::new());

    let mut first = DocumentForm::new(Arc::clone(&descriptor), stores.clone());
    first.bind(&FormData::parse(&format!("name=mix&songs={s1},{s2}")));
    assert!(first.is_valid().await.unwrap());
    first.save(true).await.unwrap();

    let mut shorter = DocumentForm::new(Arc::clone(&descriptor), stores.clone());
    shorter.bind(&FormData::parse(&format!("name=mix&songs={s1}")));
    assert!(shorter.is_valid().await.unwrap());

    let mut same = DocumentForm::new(descriptor, stores.clone());
    same.bind(&FormData::parse(&format!("name=mix&songs={s1},{s2}")));
    assert!(!same.is_valid().await.unwrap());
    assert_eq!(same.unique_errors().len(), 1);
}

// ============================================================================
// Files
// ============================================================================

#[tokio::test]
async fn test_edit_without_upload_keeps_file_handle() {
    let stores = Stores::memory();
    let mut create = item_form(&stores);
    create.bind(&FormData::parse("text=milk").with_file("picture", photo(b"jpeg")));
    assert!(create.is_valid().await.unwrap());
    let saved = create.save(true).await.unwrap();
    let handle = saved.get("picture").as_file().unwrap().clone();

    let mut edit = item_form(&stores).with_instance(saved);
    edit.bind(&FormData::parse("text=milk and eggs"));
    assert!(edit.is_valid().await.unwrap());
    let edited = edit.save(true).await.unwrap();

    assert_eq!(edited.get("picture").as_file(), Some(&handle));
    let names = stores.blobs.list(&handle.namespace).await.unwrap();
    assert_eq!(names.len(), 1);
}

#[tokio::test]
async fn test_same_name_uploads_get_suffix() {
    let blobs = MemoryBlobStore::new();
    let first = save_uploaded_file(&blobs, "fs", &photo(b"1"), None).await.unwrap();
    let second = save_uploaded_file(&blobs, "fs", &photo(b"2"), None).await.unwrap();
    assert_eq!(first.name, "photo.jpg");
    assert_eq!(second.name, "photo_1.jpg");
    assert_ne!(first.id, second.id);
    assert!(blobs.exists("fs", "photo_1.jpg").await.unwrap());
}

#[tokio::test]
async fn test_replacing_upload_deletes_old_blob() {
    let stores = Stores::memory();
    let mut create = item_form(&stores);
    create.bind(&FormData::parse("text=milk").with_file("picture", photo(b"old")));
    assert!(create.is_valid().await.unwrap());
    let saved = create.save(true).await.unwrap();
    let old = saved.get("picture").as_file().unwrap().clone();

    let mut edit = item_form(&stores).with_instance(saved);
    edit.bind(&FormData::parse("text=milk").with_file("picture", photo(b"new")));
    assert!(edit.is_valid().await.unwrap());
    let edited = edit.save(true).await.unwrap();
    let new = edited.get("picture").as_file().unwrap();

    assert_ne!(new.id, old.id);
    assert!(stores.blobs.get(&old).await.unwrap_err().is_not_found());
    assert_eq!(stores.blobs.get(new).await.unwrap(), b"new");
}

// ============================================================================
// Formsets
// ============================================================================

fn note_schema() -> Arc<DocumentSchema> {
    DocumentSchema::embedded("Note")
        .field(DocFieldDef::new("text", DocFieldType::String).required())
        .build()
}

#[tokio::test]
async fn test_embedded_formset_delete_middle_element() {
    let board = DocumentSchema::new("Board")
        .field(DocFieldDef::new("title", DocFieldType::String))
        .field(DocFieldDef::new(
            "notes",
            DocFieldType::List(Box::new(DocFieldType::Embedded(note_schema()))),
        ))
        .build();
    let stores = Stores::memory();
    let mut parent = Document::new(board);
    parent.set("title", "groceries");
    let notes: Vec<Value> = ["milk", "eggs", "bread"]
        .iter()
        .map(|text| {
            let mut note = Document::new(note_schema());
            note.set("text", *text);
            note.to_embedded()
        })
        .collect();
    parent.set("notes", Value::List(notes.clone()));
    stores.documents.save(&mut parent).await.unwrap();

    let descriptor = Arc::new(
        build_form_descriptor(
            DocumentFormConfig::new("NoteForm", note_schema()).embedded_field("notes"),
        )
        .unwrap(),
    );
    let mut formset = EmbeddedDocumentFormSet::new(
        descriptor,
        stores.clone(),
        parent.clone(),
        FormSetOptions::default().can_delete(true),
    )
    .unwrap();
    assert_eq!(formset.initial_form_count(), 3);

    formset.bind(&FormData::from_pairs([
        ("form-TOTAL_FORMS", "4"),
        ("form-INITIAL_FORMS", "3"),
        ("form-0-text", "milk"),
        ("form-1-text", "eggs"),
        ("form-1-DELETE", "on"),
        ("form-2-text", "bread"),
        ("form-3-text", ""),
    ]));
    assert!(formset.is_valid().await.unwrap());
    formset.save(true).await.unwrap();

    let stored = stores
        .documents
        .get("board", parent.id().unwrap())
        .await
        .unwrap();
    let list = stored.get("notes").as_list().unwrap();
    assert_eq!(list, &[notes[0].clone(), notes[2].clone()]);
    assert_eq!(stored.get("title"), &Value::from("groceries"));
}

#[tokio::test]
async fn test_formset_forms_share_one_descriptor() {
    let descriptor = Arc::new(describe(&item_schema(), Some(&["text"]), None, None).unwrap());
    let stores = Stores::memory();
    let formset = docforms_forms::DocumentFormSet::new(
        Arc::clone(&descriptor),
        stores,
        vec![],
        FormSetOptions::default().extra(3),
    );
    assert_eq!(formset.forms().len(), 3);
    for form in formset.forms() {
        assert!(Arc::ptr_eq(form.descriptor(), &descriptor));
    }
    let names: BTreeSet<&str> = formset.forms().iter().filter_map(|f| f.prefix()).collect();
    assert_eq!(names.len(), 3);
}
