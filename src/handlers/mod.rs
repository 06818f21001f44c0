//! Request handlers
//!
//! Thin adapters between HTTP and the storage, archive and session modules.
//! File system work runs on the blocking thread pool.

pub mod actions;
pub mod browse;
pub mod download;
pub mod session;

use axum::response::Redirect;

use crate::error::FileManagerError;
use crate::listing::format::encode_path;
use crate::storage::ResolvedPath;

/// Runs blocking file system work off the async workers.
pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T, FileManagerError>
where
    F: FnOnce() -> Result<T, FileManagerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}

/// URL of a directory listing, `/`-terminated and percent-encoded.
pub(crate) fn directory_url(dir: &ResolvedPath) -> String {
    if dir.is_root() {
        "/".to_string()
    } else {
        format!("{}/", encode_path(&dir.display_path()))
    }
}

/// 303 back to the listing the form was submitted from.
pub(crate) fn back_to(dir: &ResolvedPath) -> Redirect {
    Redirect::to(&directory_url(dir))
}
