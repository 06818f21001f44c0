//! Path validation
//!
//! Confines client-supplied virtual paths to the server root. Resolution is
//! purely lexical: no filesystem call is made while deciding whether a path
//! escapes.

use std::path::{Path, PathBuf};

use crate::error::{PathError, StorageError};

/// A virtual path that has been normalized and confined to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Root-relative form without a leading slash, `""` for the root itself.
    virtual_path: String,
    real_path: PathBuf,
}

impl ResolvedPath {
    /// Root-relative virtual path (`dir/x.txt`), empty for the root.
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// Virtual path as shown to clients (`/dir/x.txt`, `/` for the root).
    pub fn display_path(&self) -> String {
        format!("/{}", self.virtual_path)
    }

    pub fn real_path(&self) -> &Path {
        &self.real_path
    }

    pub fn is_root(&self) -> bool {
        self.virtual_path.is_empty()
    }

    /// Virtual path of the parent directory, `None` at the root.
    pub fn parent_display_path(&self) -> Option<String> {
        if self.is_root() {
            return None;
        }
        match self.virtual_path.rsplit_once('/') {
            Some((parent, _)) => Some(format!("/{parent}/")),
            None => Some("/".to_string()),
        }
    }
}

/// Maps virtual paths onto the configured root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// `root` must be trusted and absolute; it is canonicalized at startup.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an untrusted virtual path to a location inside the root.
    pub fn resolve(&self, raw: &str) -> Result<ResolvedPath, PathError> {
        let segments = normalize_segments(raw)?;

        let mut real_path = self.root.clone();
        for segment in &segments {
            real_path.push(segment);
        }

        // Component-wise, so `/base-evil` never matches root `/base`.
        if !real_path.starts_with(&self.root) {
            return Err(PathError::Escape(raw.to_string()));
        }

        Ok(ResolvedPath {
            virtual_path: segments.join("/"),
            real_path,
        })
    }

    /// Resolves `name` as a direct child of `dir`. `name` must be a single
    /// path component.
    pub fn resolve_child(
        &self,
        dir: &ResolvedPath,
        name: &str,
    ) -> Result<ResolvedPath, StorageError> {
        let name = validate_entry_name(name)?;
        let joined = format!("{}/{}", dir.virtual_path(), name);
        Ok(self.resolve(&joined)?)
    }
}

/// Collapses separators, `.` and `..`. A `..` that would climb above the
/// root is rejected here, before any filesystem call.
fn normalize_segments(raw: &str) -> Result<Vec<&str>, PathError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::Escape(raw.to_string()));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments)
}

/// Validates a single new entry name (folder name, uploaded file name).
pub fn validate_entry_name(name: &str) -> Result<&str, StorageError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

/// Browsers may send a full client-side path as the upload file name; only
/// the last component is kept.
pub fn upload_file_name(raw: &str) -> Result<&str, StorageError> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    validate_entry_name(last)
}
