//! Item and account handlers.
//!
//! Item handlers require a logged-in user and answer 404 for items that do
//! not exist or belong to someone else.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use docforms_document::{Document, DocumentId, Filter, Value};
use docforms_forms::files::clear_file;
use docforms_forms::{DocumentForm, Form};

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::extract::{CurrentSession, CurrentUser, Submission};
use crate::models::{self, item_schema};
use crate::render;
use crate::session::{expired_cookie, session_cookie, SessionData, NEXT_KEY, USER_KEY};
use crate::state::AppState;

const INDEX_URL: &str = "/item/";

async fn owned_item(state: &AppState, user: &CurrentUser, id: &str) -> AppResult<Document> {
    let Ok(id) = id.parse::<DocumentId>() else {
        return Err(AppError::not_found("Item"));
    };
    let item = match state.stores.documents.get(item_schema().collection(), id).await {
        Ok(item) => item,
        Err(e) if e.is_not_found() => return Err(AppError::not_found("Item")),
        Err(e) => return Err(e.into()),
    };
    if item.get("user") != &Value::Id(user.id()) {
        tracing::debug!(item = %id, "item belongs to another user");
        return Err(AppError::not_found("Item"));
    }
    Ok(item)
}

/// `GET /item/`: the user's items, newest first.
pub async fn index(State(state): State<AppState>, user: CurrentUser) -> AppResult<Html<String>> {
    let query = docforms_document::Query::new(item_schema().collection())
        .filter(Filter::equals("user", user.id()))
        .order_by("-created");
    let items = state.stores.documents.find(&query).await?;
    Ok(Html(render::item_list(user.username(), &items)))
}

/// `GET /item/{id}/`.
pub async fn item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let item = owned_item(&state, &user, &id).await?;
    Ok(Html(render::item_detail(&item)))
}

/// `GET /item/add/`.
pub async fn add_form(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Html<String>> {
    let form = DocumentForm::new(models::item_form()?, state.stores.clone());
    Ok(Html(render::item_form("Add an item", "/item/add/", &form.as_p(), None)))
}

/// `POST /item/add/`: stores a new item owned by the user.
pub async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    Submission(data): Submission,
) -> AppResult<Response> {
    let mut instance = Document::new(item_schema());
    instance.set("user", user.id());
    let mut form =
        DocumentForm::new(models::item_form()?, state.stores.clone()).with_instance(instance);
    form.bind(&data);
    if !form.is_valid().await? {
        let page = render::item_form("Add an item", "/item/add/", &form.as_p(), None);
        return Ok(Html(page).into_response());
    }
    let item = form.save(true).await?;
    tracing::info!(user = user.username(), item = ?item.id(), "item added");
    Ok(Redirect::to(INDEX_URL).into_response())
}

/// `GET /item/edit/{id}/`.
pub async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let item = owned_item(&state, &user, &id).await?;
    let action = format!("/item/edit/{id}/");
    let form = DocumentForm::new(models::item_form()?, state.stores.clone()).with_instance(item);
    Ok(Html(render::item_form(
        "Edit item",
        &action,
        &form.as_p(),
        Some(form.instance()),
    )))
}

/// `POST /item/edit/{id}/`: updates the item in place. A picture that is
/// not re-uploaded is kept.
pub async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Submission(data): Submission,
) -> AppResult<Response> {
    let item = owned_item(&state, &user, &id).await?;
    let current = item.clone();
    let mut form =
        DocumentForm::new(models::item_form()?, state.stores.clone()).with_instance(item);
    form.bind(&data);
    if !form.is_valid().await? {
        let action = format!("/item/edit/{id}/");
        let page = render::item_form("Edit item", &action, &form.as_p(), Some(&current));
        return Ok(Html(page).into_response());
    }
    form.save(true).await?;
    tracing::info!(user = user.username(), item = %id, "item changed");
    Ok(Redirect::to(INDEX_URL).into_response())
}

/// `GET /item/delete/{id}/`: deletes the item and its picture.
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let item = owned_item(&state, &user, &id).await?;
    if let Value::File(handle) = item.get("picture") {
        clear_file(state.stores.blobs.as_ref(), handle).await?;
    }
    state.stores.documents.delete(&item).await?;
    tracing::info!(user = user.username(), item = %id, "item deleted");
    Ok(Redirect::to(INDEX_URL))
}

/// `GET /item/{id}/picture/`: the stored picture content.
pub async fn picture(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let item = owned_item(&state, &user, &id).await?;
    let Value::File(handle) = item.get("picture") else {
        return Err(AppError::not_found("picture"));
    };
    let content = state.stores.blobs.get(handle).await?;
    Ok(([(header::CONTENT_TYPE, handle.content_type.clone())], content).into_response())
}

/// Query string of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

fn safe_next(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next.to_string(),
        _ => fallback.to_string(),
    }
}

/// `GET /auth/login/`: remembers `next` in the session and shows the form.
pub async fn login_form(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<LoginQuery>,
) -> Response {
    let settings = &state.settings;
    let mut session = session.unwrap_or_else(|| SessionData::new(settings.session_cookie_age));
    session.set(
        NEXT_KEY,
        safe_next(query.next.as_deref(), &settings.login_redirect_url),
    );
    state.sessions.save(&session).await;
    let cookie = session_cookie(
        &settings.session_cookie_name,
        &session,
        settings.session_cookie_age,
    );
    (
        [(header::SET_COOKIE, cookie)],
        Html(render::login(&models::login_form().as_p(), None)),
    )
        .into_response()
}

/// `POST /auth/login/`: starts an authenticated session and returns to
/// `next`.
pub async fn login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Submission(data): Submission,
) -> AppResult<Response> {
    let mut form = models::login_form();
    form.bind(&data);
    if !form.is_valid().await? {
        return Ok(Html(render::login(&form.as_p(), None)).into_response());
    }
    let cleaned = form.cleaned_data();
    let username = cleaned.get("username").and_then(Value::as_str).unwrap_or_default();
    let password = cleaned.get("password").and_then(Value::as_str).unwrap_or_default();
    let Some(user) = auth::authenticate(state.stores.documents.as_ref(), username, password).await?
    else {
        let page = render::login(&form.as_p(), Some("Invalid username or password"));
        return Ok(Html(page).into_response());
    };

    let settings = &state.settings;
    let next = safe_next(
        session.as_ref().and_then(|s| s.get_str(NEXT_KEY)),
        &settings.login_redirect_url,
    );
    if let Some(old) = &session {
        state.sessions.delete(&old.session_key).await;
    }
    let mut fresh = SessionData::new(settings.session_cookie_age);
    fresh.set(USER_KEY, user.id().map(|id| id.to_string()).unwrap_or_default());
    state.sessions.save(&fresh).await;
    tracing::info!(username, "user logged in");

    let cookie = session_cookie(&settings.session_cookie_name, &fresh, settings.session_cookie_age);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&next)).into_response())
}

/// `GET /auth/logout/`.
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    if let Some(session) = session {
        state.sessions.delete(&session.session_key).await;
        tracing::info!("user logged out");
    }
    (
        [(header::SET_COOKIE, expired_cookie(&state.settings.session_cookie_name))],
        Redirect::to(INDEX_URL),
    )
        .into_response()
}

/// `GET /auth/create/`.
pub async fn create_form() -> Html<String> {
    Html(render::create_user(&models::user_form().as_p(), None))
}

/// `POST /auth/create/`: registers a user.
pub async fn create(
    State(state): State<AppState>,
    Submission(data): Submission,
) -> AppResult<Response> {
    let mut form = models::user_form();
    form.bind(&data);
    let valid = form.is_valid().await?;
    let cleaned = form.cleaned_data();
    let text = |name: &str| {
        cleaned
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let username = text("username");

    if !username.is_empty()
        && auth::find_user(state.stores.documents.as_ref(), &username).await?.is_some()
    {
        let page = render::create_user(&form.as_p(), Some("Username already taken"));
        return Ok(Html(page).into_response());
    }
    if !valid {
        return Ok(Html(render::create_user(&form.as_p(), None)).into_response());
    }

    auth::create_user(
        state.stores.documents.as_ref(),
        &username,
        &text("email"),
        &text("password"),
    )
    .await?;
    Ok(Redirect::to(INDEX_URL).into_response())
}
