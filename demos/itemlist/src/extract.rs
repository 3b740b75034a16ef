//! Request extractors: the logged-in user, the session, and submitted
//! form data.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use axum::http::header;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use docforms_document::Document;
use docforms_forms::{FormData, UploadedFile};

use crate::error::AppError;
use crate::models::user_schema;
use crate::session::{cookie_value, SessionData};
use crate::state::AppState;

/// The session named by the request's cookie, if it is still live.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<SessionData>);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(key) = cookie_value(&parts.headers, &state.settings.session_cookie_name) else {
            return Ok(Self(None));
        };
        Ok(Self(state.sessions.load(key).await))
    }
}

/// The logged-in user. Anonymous requests are redirected to the login page
/// with the requested path as `next`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The user document.
    pub user: Document,
    /// The session that authenticated the request.
    pub session: SessionData,
}

impl CurrentUser {
    /// The user's identity.
    pub fn id(&self) -> docforms_document::DocumentId {
        self.user.id().unwrap_or_default()
    }

    /// The user's name.
    pub fn username(&self) -> &str {
        self.user.get("username").as_str().unwrap_or_default()
    }
}

fn login_redirect(state: &AppState, parts: &Parts) -> Response {
    let next = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
    let location = format!(
        "{}?next={}",
        state.settings.login_url,
        utf8_percent_encode(next, NON_ALPHANUMERIC)
    );
    Redirect::to(&location).into_response()
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(CurrentSession(Some(session))) =
            CurrentSession::from_request_parts(parts, state).await
        else {
            return Err(login_redirect(state, parts));
        };
        let Some(user_id) = session.user_id() else {
            return Err(login_redirect(state, parts));
        };
        match state.stores.documents.get(user_schema().collection(), user_id).await {
            Ok(user) => Ok(Self { user, session }),
            Err(e) if e.is_not_found() => {
                tracing::debug!(%user_id, "session names a deleted user");
                Err(login_redirect(state, parts))
            }
            Err(e) => Err(AppError::from(e).into_response()),
        }
    }
}

/// A submitted form body, URL-encoded or multipart.
#[derive(Debug, Clone)]
pub struct Submission(pub FormData);

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            return Ok(Self(FormData::parse(&String::from_utf8_lossy(&body))));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let mut data = FormData::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let content = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            match file_name {
                // A file input left blank.
                Some(file_name) if file_name.is_empty() && content.is_empty() => {}
                Some(file_name) => {
                    let file = UploadedFile::new(file_name, content_type, content.to_vec());
                    data.add_file(name, file);
                }
                None => data.append(name, String::from_utf8_lossy(&content).into_owned()),
            }
        }
        Ok(Self(data))
    }
}
