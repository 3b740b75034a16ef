//! Item-list documents and forms.
//!
//! `Item` belongs to a `User` and may carry a picture. The item form is a
//! document form over `Item` without the owner and timestamp; the login and
//! sign-up forms are plain forms.

use std::sync::{Arc, OnceLock};

use docforms_core::{DocFormsResult, ValidationError};
use docforms_document::fields::now;
use docforms_document::{DocFieldDef, DocFieldType, DocumentSchema, Value};
use docforms_forms::descriptor_cache;
use docforms_forms::fields::{FormFieldDef, FormFieldType};
use docforms_forms::{describe, BaseForm, FormDescriptor, WidgetType};

/// Longest accepted username, e-mail and password.
pub const CREDENTIAL_MAX_LENGTH: usize = 100;

/// The `User` document.
pub fn user_schema() -> Arc<DocumentSchema> {
    static SCHEMA: OnceLock<Arc<DocumentSchema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        DocumentSchema::new("User")
            .field(
                DocFieldDef::new("username", DocFieldType::String)
                    .required()
                    .unique()
                    .max_length(CREDENTIAL_MAX_LENGTH),
            )
            .field(DocFieldDef::new("email", DocFieldType::Email))
            .field(DocFieldDef::new("password", DocFieldType::String).required())
            .field(DocFieldDef::new("date_joined", DocFieldType::DateTime).default_with(now))
            .build()
    }))
}

/// The `Item` document.
pub fn item_schema() -> Arc<DocumentSchema> {
    static SCHEMA: OnceLock<Arc<DocumentSchema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        DocumentSchema::new("Item")
            .field(DocFieldDef::new(
                "user",
                DocFieldType::Reference {
                    document: "User".into(),
                },
            ))
            .field(
                DocFieldDef::new("text", DocFieldType::String)
                    .required()
                    .max_length(200),
            )
            .field(DocFieldDef::new("picture", DocFieldType::Image))
            .field(DocFieldDef::new("created", DocFieldType::DateTime).default_with(now))
            .build()
    }))
}

/// The shared `ItemForm` descriptor: every `Item` field except the owner
/// and the creation time.
pub fn item_form() -> DocFormsResult<Arc<FormDescriptor>> {
    descriptor_cache::get_or_build("ItemForm", || {
        describe(&item_schema(), None, Some(&["user", "created"]), None)
    })
}

fn credential(name: &str) -> FormFieldDef {
    FormFieldDef::new(
        name,
        FormFieldType::Char {
            min_length: None,
            max_length: Some(CREDENTIAL_MAX_LENGTH),
            strip: true,
        },
    )
}

fn secret(name: &str) -> FormFieldDef {
    FormFieldDef::new(
        name,
        FormFieldType::Char {
            min_length: None,
            max_length: Some(CREDENTIAL_MAX_LENGTH),
            strip: false,
        },
    )
    .widget(WidgetType::PasswordInput)
}

/// Username and password.
pub fn login_form() -> BaseForm {
    BaseForm::new(vec![credential("username"), secret("password")])
}

/// Sign-up form. Mismatched passwords are a form-level error.
pub fn user_form() -> BaseForm {
    BaseForm::new(vec![
        credential("username"),
        credential("email"),
        secret("password"),
        secret("confirm"),
    ])
    .with_clean(|cleaned, _errors| {
        match (cleaned.get("password"), cleaned.get("confirm")) {
            (Some(Value::String(a)), Some(Value::String(b))) if a != b => Err(
                ValidationError::new("Passwords must match", "password_mismatch"),
            ),
            _ => Ok(()),
        }
    })
}
