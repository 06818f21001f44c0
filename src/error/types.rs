//! Error types
//!
//! Defines domain-specific error types for each module of the file manager.

use std::io;
use thiserror::Error;

/// Path resolution errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The virtual path would resolve outside the configured root.
    #[error("Path escapes the root: {0}")]
    Escape(String),
}

/// Storage module errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Path traversal attempt: {0}")]
    PathEscape(#[from] PathError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Refusing to modify the root directory")]
    RootProtected,
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Archive module errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("No files selected for download")]
    NoSelection,
    #[error("Archive error: {0}")]
    Zip(#[from] async_zip::error::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Authentication module errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Missing or expired session")]
    Unauthorized,
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// General error that encompasses all request-level error types
#[derive(Debug, Error)]
pub enum FileManagerError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Malformed upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("Template rendering failed: {0}")]
    Render(#[from] askama::Error),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<PathError> for FileManagerError {
    fn from(error: PathError) -> Self {
        FileManagerError::Storage(StorageError::PathEscape(error))
    }
}

impl From<io::Error> for FileManagerError {
    fn from(error: io::Error) -> Self {
        FileManagerError::Storage(StorageError::Io(error))
    }
}

/// Errors that abort startup
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Logging setup failed: {0}")]
    Logging(String),
    #[error("Authentication setup failed: {0}")]
    Auth(#[from] AuthError),
    #[error("TLS setup failed: {0}")]
    Tls(io::Error),
    #[error("Server error: {0}")]
    Io(#[from] io::Error),
}
