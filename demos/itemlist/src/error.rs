//! Errors raised by the item-list handlers and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use docforms_core::DocFormsError;

use crate::render;

/// An error that ends a request.
#[derive(Debug, Error)]
pub enum AppError {
    /// A form, store or blob failure.
    #[error(transparent)]
    Forms(#[from] DocFormsError),

    /// Password hashing or verification could not run.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// The request body could not be read.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Result type for request handlers.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// The page-not-found error handlers raise for missing or foreign items.
    pub fn not_found(what: &str) -> Self {
        Self::Forms(DocFormsError::NotFound(format!("No {what} matches the given query.")))
    }

    /// The HTTP status this error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forms(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Html(render::error_page(status, &self.to_string()))).into_response()
    }
}
