//! Size-rotated log file
//!
//! `RotatingFile` is a `Write` sink for the logger. When the active file
//! would grow past the size limit it is gzip-compressed into `<file>.1.gz`,
//! older backups shift up by one, and backups beyond the count or age limits
//! are removed.
//!
//! The sink runs while the logger holds its output lock, so nothing in this
//! module may call the `log` macros. Problems are reported on stderr.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const MIB: u64 = 1024 * 1024;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Rotation limits. Zero disables a limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub max_files: usize,
    pub max_age: Duration,
}

impl RotationPolicy {
    /// Builds a policy from the `logging` section units (MiB, count, days).
    pub fn new(max_size_mb: u64, max_files: usize, max_age_days: u64) -> Self {
        Self {
            max_bytes: max_size_mb.saturating_mul(MIB),
            max_files,
            max_age: DAY.saturating_mul(u32::try_from(max_age_days).unwrap_or(u32::MAX)),
        }
    }
}

pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    size: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_log(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            policy,
            file: Some(file),
            size,
        })
    }

    /// Path of the `n`th compressed backup.
    pub fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{n}.gz"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        let mut highest = 0;
        while self.backup_path(highest + 1).exists() {
            highest += 1;
        }
        for n in (1..=highest).rev() {
            fs::rename(self.backup_path(n), self.backup_path(n + 1))?;
        }

        compress(&self.path, &self.backup_path(1))?;
        fs::remove_file(&self.path)?;
        for (backup, e) in self.prune(highest + 1) {
            eprintln!("Failed to remove old log file {}: {}", backup.display(), e);
        }

        self.file = Some(open_log(&self.path)?);
        self.size = 0;
        Ok(())
    }

    /// Removes backups over the count or age limit. Returns the ones that
    /// could not be removed.
    fn prune(&self, highest: usize) -> Vec<(PathBuf, io::Error)> {
        let now = SystemTime::now();
        let mut failures = Vec::new();
        for n in 1..=highest {
            let backup = self.backup_path(n);
            let over_count = self.policy.max_files > 0 && n > self.policy.max_files;
            let too_old = !self.policy.max_age.is_zero()
                && fs::metadata(&backup)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > self.policy.max_age);
            if over_count || too_old {
                if let Err(e) = fs::remove_file(&backup) {
                    failures.push((backup, e));
                }
            }
        }
        failures
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let limit = self.policy.max_bytes;
        if limit > 0 && self.size > 0 && self.size + buf.len() as u64 > limit {
            self.rotate()?;
        }
        // A failed rotation leaves no handle; retry the open on the next write.
        if self.file.is_none() {
            self.file = Some(open_log(&self.path)?);
            self.size = 0;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file unavailable"))?;
        let written = file.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

fn compress(source: &Path, target: &Path) -> io::Result<()> {
    let mut input = BufReader::new(File::open(source)?);
    let mut encoder = GzEncoder::new(File::create(target)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    fn decompress(path: &Path) -> String {
        let mut out = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    fn policy(max_bytes: u64, max_files: usize) -> RotationPolicy {
        RotationPolicy {
            max_bytes,
            max_files,
            max_age: Duration::ZERO,
        }
    }

    #[test]
    fn rotates_into_compressed_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.log");
        let mut log = RotatingFile::open(&path, policy(10, 0)).unwrap();

        log.write_all(b"first-12345\n").unwrap();
        log.write_all(b"second\n").unwrap();
        log.write_all(b"third-6789\n").unwrap();
        log.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "third-6789\n");
        assert_eq!(decompress(&log.backup_path(1)), "second\n");
        assert_eq!(decompress(&log.backup_path(2)), "first-12345\n");
    }

    #[test]
    fn keeps_at_most_max_files_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.log");
        let mut log = RotatingFile::open(&path, policy(4, 2)).unwrap();
        for line in ["aaaa", "bbbb", "cccc", "dddd", "eeee"] {
            log.write_all(line.as_bytes()).unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "eeee");
        assert_eq!(decompress(&log.backup_path(1)), "dddd");
        assert_eq!(decompress(&log.backup_path(2)), "cccc");
        assert!(!log.backup_path(3).exists());
    }

    #[test]
    fn undeletable_backup_does_not_stop_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.log");
        let mut log = RotatingFile::open(&path, policy(4, 1)).unwrap();
        fs::create_dir(log.backup_path(1)).unwrap();
        fs::write(log.backup_path(1).join("keep"), "x").unwrap();

        log.write_all(b"aaaa").unwrap();
        log.write_all(b"bbbb").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "bbbb");
        assert_eq!(decompress(&log.backup_path(1)), "aaaa");
        assert_eq!(
            log.prune(2).into_iter().map(|(p, _)| p).collect::<Vec<_>>(),
            vec![log.backup_path(2)]
        );
    }

    #[test]
    fn zero_size_never_rotates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.log");
        let mut log = RotatingFile::open(&path, policy(0, 0)).unwrap();
        for _ in 0..100 {
            log.write_all(b"0123456789").unwrap();
        }
        assert_eq!(fs::metadata(&path).unwrap().len(), 1000);
        assert!(!log.backup_path(1).exists());
    }

    #[test]
    fn appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/server.log");
        RotatingFile::open(&path, policy(0, 0))
            .unwrap()
            .write_all(b"one\n")
            .unwrap();
        RotatingFile::open(&path, policy(0, 0))
            .unwrap()
            .write_all(b"two\n")
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[cfg(unix)]
    #[test]
    fn log_file_mode_is_0644() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.log");
        RotatingFile::open(&path, policy(0, 0)).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // The process umask can only clear bits.
        assert_eq!(mode & !0o644, 0);
    }

    #[test]
    fn policy_from_config_units() {
        let policy = RotationPolicy::new(2, 5, 1);
        assert_eq!(policy.max_bytes, 2 * MIB);
        assert_eq!(policy.max_files, 5);
        assert_eq!(policy.max_age, DAY);
    }
}
