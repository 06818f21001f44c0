//! Error handlers
//!
//! Maps request errors onto HTTP responses. Internal detail stays in the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::types::{ArchiveError, AuthError, FileManagerError, StorageError};

/// Where unauthenticated callers are sent.
pub const LOGIN_ROUTE: &str = "/login";

/// Convert error to HTTP status code
pub fn error_to_status(err: &FileManagerError) -> StatusCode {
    match err {
        FileManagerError::Auth(AuthError::Unauthorized) => StatusCode::SEE_OTHER,
        FileManagerError::Auth(AuthError::MalformedInput(_)) => StatusCode::BAD_REQUEST,
        FileManagerError::Auth(AuthError::Hash(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::Storage(StorageError::PathEscape(_)) => StatusCode::NOT_FOUND,
        FileManagerError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
        FileManagerError::Storage(StorageError::InvalidName(_)) => StatusCode::BAD_REQUEST,
        FileManagerError::Storage(StorageError::RootProtected) => StatusCode::FORBIDDEN,
        FileManagerError::Storage(StorageError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::Archive(ArchiveError::NoSelection) => StatusCode::BAD_REQUEST,
        FileManagerError::Archive(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        FileManagerError::Multipart(e) => e.status(),
        FileManagerError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Short public message for a status; never includes the underlying cause.
fn public_message(err: &FileManagerError) -> String {
    match err {
        FileManagerError::Archive(ArchiveError::NoSelection) => {
            "No files selected for download".to_string()
        }
        FileManagerError::BadRequest(msg) => msg.clone(),
        FileManagerError::Multipart(_) => "Error parsing form".to_string(),
        FileManagerError::Storage(StorageError::InvalidName(_)) => "Invalid name".to_string(),
        FileManagerError::Storage(StorageError::RootProtected) => "Forbidden".to_string(),
        FileManagerError::Auth(AuthError::MalformedInput(_)) => "Malformed input".to_string(),
        _ => match error_to_status(err) {
            StatusCode::NOT_FOUND => "404 page not found".to_string(),
            _ => "Internal server error".to_string(),
        },
    }
}

impl IntoResponse for FileManagerError {
    fn into_response(self) -> Response {
        if matches!(self, FileManagerError::Auth(AuthError::Unauthorized)) {
            return Redirect::to(LOGIN_ROUTE).into_response();
        }
        (error_to_status(&self), public_message(&self)).into_response()
    }
}
