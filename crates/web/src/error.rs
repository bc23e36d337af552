//! Error types for the Framedash web server.

use axum::response::IntoResponse;
use thiserror::Error;

/// Main error type for web operations.
#[derive(Error, Debug)]
pub enum WebError {
    /// Dashboard document could not be loaded.
    #[error("Document error: {0}")]
    Document(String),

    /// Remote document fetch failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    /// File watcher error.
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Core Framedash error.
    #[error("Core error: {0}")]
    Core(#[from] framedash_core::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP server error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result alias for web operations.
pub type WebResult<T> = Result<T, WebError>;

impl WebError {
    /// Convert to HTTP status code.
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            WebError::Document(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            WebError::Fetch(_) => axum::http::StatusCode::BAD_GATEWAY,
            WebError::Watcher(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Core(framedash_core::Error::Url(_)) => axum::http::StatusCode::BAD_REQUEST,
            WebError::Core(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Io(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Http(_) => axum::http::StatusCode::BAD_GATEWAY,
            WebError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
        }
    }
}

impl From<WebError> for axum::response::Response {
    fn from(error: WebError) -> Self {
        let status = error.status_code();
        let body = serde_json::json!({
            "error": error.to_string(),
            "code": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        self.into()
    }
}
