//! URL configuration.
//!
//! - `item/` -> the user's items
//! - `item/add/` -> add an item
//! - `item/{id}/` -> one item
//! - `item/{id}/picture/` -> an item's picture
//! - `item/edit/{id}/` -> edit an item
//! - `item/delete/{id}/` -> delete an item
//! - `auth/login/`, `auth/logout/`, `auth/create/` -> accounts

use axum::extract::{DefaultBodyLimit, Request};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use docforms_core::logging::request_span;

use crate::state::AppState;
use crate::views;

/// Largest accepted request body, uploads included.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Item routes.
pub fn item_urls() -> Router<AppState> {
    Router::new()
        .route("/item/", get(views::index))
        .route("/item/add/", get(views::add_form).post(views::add))
        .route("/item/{id}/", get(views::item))
        .route("/item/{id}/picture/", get(views::picture))
        .route("/item/edit/{id}/", get(views::edit_form).post(views::edit))
        .route("/item/delete/{id}/", get(views::delete))
}

/// Account routes.
pub fn auth_urls() -> Router<AppState> {
    Router::new()
        .route("/auth/login/", get(views::login_form).post(views::login))
        .route("/auth/logout/", get(views::logout))
        .route("/auth/create/", get(views::create_form).post(views::create))
}

/// The complete application.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/item/") }))
        .merge(item_urls())
        .merge(auth_urls())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            request_span(req.method().as_str(), req.uri().path())
        }))
        .with_state(state)
}
