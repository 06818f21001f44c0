//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::time::SystemTime;

use axum::body::Bytes;

use crate::storage::validation::ResolvedPath;

/// One child of a listed directory.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Result of a directory listing operation
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    pub path: ResolvedPath,
    pub entries: Vec<EntryInfo>,
    /// Raw markdown of the directory's `README.md`, if readable.
    pub readme: Option<String>,
}

/// A file part received from an upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub contents: Bytes,
}

/// Result of a batch delete
#[derive(Debug, Default, Clone)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}
