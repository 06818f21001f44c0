//! Storage operations
//!
//! Listing, folder creation, uploads and recursive deletion. Every path is
//! resolved before the first mutating call of an operation.

use log::{debug, error, info, warn};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::client::Actor;
use crate::error::StorageError;
use crate::storage::filesystem::{EntryKind, FileSystem};
use crate::storage::results::{DeleteReport, DirectoryListing, EntryInfo, UploadedFile};
use crate::storage::validation::{PathResolver, ResolvedPath, upload_file_name};

const README_NAME: &str = "README.md";
const MAX_README_BYTES: u64 = 1024 * 1024;

/// Lists the contents of a directory, directories first, then by name.
pub fn list_directory(
    fs: &dyn FileSystem,
    dir: &ResolvedPath,
) -> Result<DirectoryListing, StorageError> {
    let children = fs.read_dir(dir.real_path())?;

    let mut entries = Vec::with_capacity(children.len());
    let mut has_readme = false;
    for child in children {
        let child_path = dir.real_path().join(&child.name);
        match fs.metadata(&child_path) {
            Ok(metadata) => {
                if child.name == README_NAME && metadata.is_file() {
                    has_readme = true;
                }
                entries.push(EntryInfo {
                    name: child.name,
                    is_dir: metadata.is_dir(),
                    size: metadata.len,
                    modified: metadata.modified,
                });
            }
            Err(e) => {
                // Dangling symlinks and races with concurrent deletes.
                debug!("Error getting file info for {}: {}", child_path.display(), e);
                entries.push(EntryInfo {
                    name: child.name,
                    is_dir: false,
                    size: 0,
                    modified: None,
                });
            }
        }
    }

    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));

    let readme = if has_readme {
        read_readme(fs, &dir.real_path().join(README_NAME))
    } else {
        None
    };

    debug!(
        "Listed directory {} (real: {}) - {} entries",
        dir.display_path(),
        dir.real_path().display(),
        entries.len()
    );

    Ok(DirectoryListing {
        path: dir.clone(),
        entries,
        readme,
    })
}

fn read_readme(fs: &dyn FileSystem, path: &Path) -> Option<String> {
    let result = fs.open_read(path).and_then(|reader| {
        let mut buf = String::new();
        reader.take(MAX_README_BYTES).read_to_string(&mut buf)?;
        Ok(buf)
    });
    match result {
        Ok(markdown) => Some(markdown),
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            None
        }
    }
}

/// Creates exactly one new directory named `folder_name` inside `current_path`.
pub fn create_folder(
    fs: &dyn FileSystem,
    resolver: &PathResolver,
    current_path: &str,
    folder_name: &str,
    actor: &Actor,
) -> Result<ResolvedPath, StorageError> {
    let dir = resolver.resolve(current_path)?;
    let target = resolver.resolve_child(&dir, folder_name)?;

    fs.create_dir(target.real_path()).inspect_err(|e| {
        error!(
            "Error creating folder {}: {} from {}",
            target.real_path().display(),
            e,
            actor
        );
    })?;

    info!("Folder created: {} by {}", target.real_path().display(), actor);
    Ok(target)
}

/// Stores uploaded files under `current_path`, creating it if needed.
pub fn store_uploads(
    fs: &dyn FileSystem,
    resolver: &PathResolver,
    current_path: &str,
    files: &[UploadedFile],
    actor: &Actor,
) -> Result<Vec<ResolvedPath>, StorageError> {
    let dir = resolver.resolve(current_path)?;
    let targets = files
        .iter()
        .map(|file| {
            let name = upload_file_name(&file.file_name)?;
            resolver.resolve_child(&dir, name)
        })
        .collect::<Result<Vec<_>, _>>()?;

    fs.create_dir_all(dir.real_path()).inspect_err(|e| {
        error!(
            "Error creating directory {}: {} from {}",
            dir.real_path().display(),
            e,
            actor
        );
    })?;

    for (file, target) in files.iter().zip(&targets) {
        write_file(fs, target.real_path(), &file.contents).inspect_err(|e| {
            error!(
                "Error saving file {}: {} from {}",
                target.real_path().display(),
                e,
                actor
            );
        })?;
        info!("File uploaded: {} by {}", target.real_path().display(), actor);
    }

    Ok(targets)
}

fn write_file(fs: &dyn FileSystem, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs.create_file(path)?;
    file.write_all(contents)?;
    file.flush()
}

/// Deletes every item of a selection set.
///
/// All items are resolved first; one escaping item rejects the whole batch
/// before anything is removed, and the root itself is never deleted. A
/// failing item is logged and the remaining items are still processed. The
/// batch fails only when no item could be deleted.
pub fn delete_items(
    fs: &dyn FileSystem,
    resolver: &PathResolver,
    items: &[String],
    actor: &Actor,
) -> Result<DeleteReport, StorageError> {
    let targets = items
        .iter()
        .map(|item| resolver.resolve(item))
        .collect::<Result<Vec<_>, _>>()?;
    if targets.iter().any(ResolvedPath::is_root) {
        warn!("Refused to delete the root directory, requested by {}", actor);
        return Err(StorageError::RootProtected);
    }

    let mut report = DeleteReport::default();
    let mut last_error = None;
    for target in &targets {
        match remove_tree(fs, target.real_path(), actor) {
            Ok(()) => {
                info!("Item deleted: {} by {}", target.real_path().display(), actor);
                report.deleted.push(target.display_path());
            }
            Err(e) => {
                error!(
                    "Error deleting item {}: {} from {}",
                    target.real_path().display(),
                    e,
                    actor
                );
                report.failed.push(target.display_path());
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if report.deleted.is_empty() => Err(StorageError::Io(e)),
        _ => Ok(report),
    }
}

/// Depth-first removal that logs every node. Symlinks are unlinked, never
/// followed.
fn remove_tree(fs: &dyn FileSystem, path: &Path, actor: &Actor) -> io::Result<()> {
    let metadata = fs.symlink_metadata(path)?;
    if metadata.kind == EntryKind::Directory {
        for child in fs.read_dir(path)? {
            remove_tree(fs, &path.join(&child.name), actor)?;
        }
        info!("Deleting: {} by {}", path.display(), actor);
        fs.remove_dir(path)
    } else {
        info!("Deleting: {} by {}", path.display(), actor);
        fs.remove_file(path)
    }
}
