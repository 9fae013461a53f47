//! Error types for the wall server.
//!
//! [`WebError`] unifies all request-time failure modes into a single enum
//! that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::pages::PageError;

/// Errors that can occur while answering a request.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The submitted form is missing a field or has a malformed value.
    #[error("invalid form: {0}")]
    InvalidForm(String),

    /// A page template failed to render.
    #[error("page error: {0}")]
    Page(#[from] PageError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidForm(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Page(e) => {
                tracing::error!(error = %e, "page render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
