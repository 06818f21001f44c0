//! File system access
//!
//! Storage operations go through the [`FileSystem`] trait so directory walks
//! can run against an in-memory fake in tests.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::SystemTime;

/// Kind of a directory entry. Symlinks are only reported by
/// [`FileSystem::symlink_metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// Metadata needed by listing, archiving and deletion.
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    pub kind: EntryKind,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl EntryMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// A child of a listed directory.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
}

/// Directory-entry interface used by every storage operation.
pub trait FileSystem: Send + Sync + 'static {
    /// Stat, following symlinks.
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    /// Stat without following symlinks.
    fn symlink_metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Creates or truncates a file.
    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;

    /// Creates exactly one directory; fails if it exists.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Removes a file or a symlink.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Removes an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by the host file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

fn convert_metadata(metadata: fs::Metadata) -> EntryMetadata {
    let kind = if metadata.file_type().is_symlink() {
        EntryKind::Symlink
    } else if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    EntryMetadata {
        kind,
        len: if kind == EntryKind::File { metadata.len() } else { 0 },
        modified: metadata.modified().ok(),
    }
}

impl FileSystem for LocalFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        fs::metadata(path).map(convert_metadata)
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        fs::symlink_metadata(path).map(convert_metadata)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }
        Ok(entries)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(fs::File::open(path)?))
    }

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(fs::File::create(path)?))
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory [`FileSystem`] that records every call.

    use super::*;
    use std::collections::{BTreeMap, HashSet};
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    enum Node {
        File(Vec<u8>),
        Dir,
    }

    #[derive(Debug, Default)]
    pub(crate) struct MemoryFs {
        nodes: Arc<Mutex<BTreeMap<PathBuf, Node>>>,
        calls: Mutex<Vec<String>>,
        failing_reads: Mutex<HashSet<PathBuf>>,
        failing_removes: Mutex<HashSet<PathBuf>>,
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
    }

    impl MemoryFs {
        /// Creates a file system whose only content is `root` and its ancestors.
        pub(crate) fn with_root(root: &Path) -> Self {
            let fs = Self::default();
            fs.insert_dirs(root);
            fs
        }

        fn insert_dirs(&self, path: &Path) {
            let mut nodes = self.nodes.lock().unwrap();
            for ancestor in path.ancestors() {
                nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
            }
        }

        pub(crate) fn add_file(&self, path: impl AsRef<Path>, contents: &[u8]) {
            let path = path.as_ref();
            if let Some(parent) = path.parent() {
                self.insert_dirs(parent);
            }
            self.nodes
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), Node::File(contents.to_vec()));
        }

        pub(crate) fn add_dir(&self, path: impl AsRef<Path>) {
            self.insert_dirs(path.as_ref());
        }

        /// Opening `path` succeeds but the first read fails.
        pub(crate) fn fail_reads_of(&self, path: impl AsRef<Path>) {
            self.failing_reads
                .lock()
                .unwrap()
                .insert(path.as_ref().to_path_buf());
        }

        pub(crate) fn fail_removes_of(&self, path: impl AsRef<Path>) {
            self.failing_removes
                .lock()
                .unwrap()
                .insert(path.as_ref().to_path_buf());
        }

        pub(crate) fn exists(&self, path: impl AsRef<Path>) -> bool {
            self.nodes.lock().unwrap().contains_key(path.as_ref())
        }

        pub(crate) fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
            match self.nodes.lock().unwrap().get(path.as_ref()) {
                Some(Node::File(bytes)) => Some(bytes.clone()),
                _ => None,
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, op: &str, path: &Path) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{op} {}", path.display()));
        }

        fn stat(&self, path: &Path) -> io::Result<EntryMetadata> {
            match self.nodes.lock().unwrap().get(path) {
                Some(Node::File(bytes)) => Ok(EntryMetadata {
                    kind: EntryKind::File,
                    len: bytes.len() as u64,
                    modified: Some(SystemTime::UNIX_EPOCH),
                }),
                Some(Node::Dir) => Ok(EntryMetadata {
                    kind: EntryKind::Directory,
                    len: 0,
                    modified: Some(SystemTime::UNIX_EPOCH),
                }),
                None => Err(not_found(path)),
            }
        }

        fn check_remove(&self, path: &Path) -> io::Result<()> {
            if self.failing_removes.lock().unwrap().contains(path) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    path.display().to_string(),
                ));
            }
            Ok(())
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("simulated read failure"))
        }
    }

    struct MemoryFile {
        path: PathBuf,
        nodes: Arc<Mutex<BTreeMap<PathBuf, Node>>>,
    }

    impl Write for MemoryFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut nodes = self.nodes.lock().unwrap();
            match nodes.get_mut(&self.path) {
                Some(Node::File(bytes)) => {
                    bytes.extend_from_slice(buf);
                    Ok(buf.len())
                }
                _ => Err(not_found(&self.path)),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl FileSystem for MemoryFs {
        fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
            self.record("metadata", path);
            self.stat(path)
        }

        fn symlink_metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
            self.record("symlink_metadata", path);
            self.stat(path)
        }

        fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
            self.record("read_dir", path);
            let nodes = self.nodes.lock().unwrap();
            match nodes.get(path) {
                Some(Node::Dir) => Ok(nodes
                    .keys()
                    .filter(|p| p.parent() == Some(path))
                    .filter_map(|p| p.file_name())
                    .map(|name| DirEntry {
                        name: name.to_string_lossy().into_owned(),
                    })
                    .collect()),
                Some(Node::File(_)) => Err(io::Error::other("not a directory")),
                None => Err(not_found(path)),
            }
        }

        fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
            self.record("open_read", path);
            if self.failing_reads.lock().unwrap().contains(path) {
                return Ok(Box::new(FailingReader));
            }
            match self.nodes.lock().unwrap().get(path) {
                Some(Node::File(bytes)) => Ok(Box::new(Cursor::new(bytes.clone()))),
                Some(Node::Dir) => Err(io::Error::other("is a directory")),
                None => Err(not_found(path)),
            }
        }

        fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
            self.record("create_file", path);
            let mut nodes = self.nodes.lock().unwrap();
            match path.parent().and_then(|parent| nodes.get(parent)) {
                Some(Node::Dir) => {}
                _ => return Err(not_found(path)),
            }
            nodes.insert(path.to_path_buf(), Node::File(Vec::new()));
            Ok(Box::new(MemoryFile {
                path: path.to_path_buf(),
                nodes: Arc::clone(&self.nodes),
            }))
        }

        fn create_dir(&self, path: &Path) -> io::Result<()> {
            self.record("create_dir", path);
            let mut nodes = self.nodes.lock().unwrap();
            if nodes.contains_key(path) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    path.display().to_string(),
                ));
            }
            match path.parent().and_then(|parent| nodes.get(parent)) {
                Some(Node::Dir) => {
                    nodes.insert(path.to_path_buf(), Node::Dir);
                    Ok(())
                }
                _ => Err(not_found(path)),
            }
        }

        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            self.record("create_dir_all", path);
            self.insert_dirs(path);
            Ok(())
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            self.record("remove_file", path);
            self.check_remove(path)?;
            let mut nodes = self.nodes.lock().unwrap();
            match nodes.get(path) {
                Some(Node::File(_)) => {
                    nodes.remove(path);
                    Ok(())
                }
                Some(Node::Dir) => Err(io::Error::other("is a directory")),
                None => Err(not_found(path)),
            }
        }

        fn remove_dir(&self, path: &Path) -> io::Result<()> {
            self.record("remove_dir", path);
            self.check_remove(path)?;
            let mut nodes = self.nodes.lock().unwrap();
            if nodes.keys().any(|p| p.parent() == Some(path)) {
                return Err(io::Error::other("directory not empty"));
            }
            match nodes.remove(path) {
                Some(Node::Dir) => Ok(()),
                Some(node) => {
                    nodes.insert(path.to_path_buf(), node);
                    Err(io::Error::other("not a directory"))
                }
                None => Err(not_found(path)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_fs_round_trip() {
        let temp = tempdir().unwrap();
        let fs = LocalFs;
        let dir = temp.path().join("docs");
        fs.create_dir(&dir).unwrap();
        {
            let mut file = fs.create_file(&dir.join("a.txt")).unwrap();
            file.write_all(b"hello").unwrap();
        }

        let meta = fs.metadata(&dir.join("a.txt")).unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.len, 5);

        let names: Vec<String> = fs.read_dir(&dir).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a.txt".to_string()]);

        let mut contents = String::new();
        fs.open_read(&dir.join("a.txt"))
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "hello");

        assert!(fs.create_dir(&dir).is_err());
        fs.remove_file(&dir.join("a.txt")).unwrap();
        fs.remove_dir(&dir).unwrap();
        assert!(fs.metadata(&dir).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_reported_without_following() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(LocalFs.symlink_metadata(&link).unwrap().kind, EntryKind::Symlink);
        assert_eq!(LocalFs.metadata(&link).unwrap().kind, EntryKind::Directory);
    }
}
