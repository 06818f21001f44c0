//! Archive operations
//!
//! Selection filtering and zip writing. Entry names are root-relative
//! virtual paths, so the server's real root never appears in an archive.

use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, ZipDateTime, ZipEntryBuilder};
use chrono::{DateTime, Local};
use futures_util::AsyncWriteExt as _;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::io::{self, Read};
use std::mem;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::{AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::task;

use crate::archive::results::{ArchiveReport, DownloadPlan};
use crate::client::ClientAddr;
use crate::error::ArchiveError;
use crate::storage::filesystem::EntryMetadata;
use crate::storage::{FileSystem, PathResolver, ResolvedPath};

/// File name offered to the client for a bundle.
pub const ARCHIVE_NAME: &str = "files.zip";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Bytes buffered between the archive task and the response body.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Reduces a selection set to the regular files that exist.
///
/// Items that escape the root, do not exist or are directories are logged
/// and dropped. Repeated items are kept once, at their first position.
pub fn select_files(
    fs: &dyn FileSystem,
    resolver: &PathResolver,
    items: &[String],
) -> Result<DownloadPlan, ArchiveError> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for item in items {
        let resolved = match resolver.resolve(item) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Skipping download item: {}", e);
                continue;
            }
        };
        match fs.metadata(resolved.real_path()) {
            Ok(metadata) if metadata.is_file() => {
                if seen.insert(resolved.virtual_path().to_string()) {
                    files.push(resolved);
                }
            }
            Ok(_) => debug!("Skipping directory in download: {}", resolved.display_path()),
            Err(e) => warn!(
                "Error accessing file {}: {}",
                resolved.real_path().display(),
                e
            ),
        }
    }

    match files.len() {
        0 => Err(ArchiveError::NoSelection),
        1 => Ok(DownloadPlan::Single(files.remove(0))),
        _ => Ok(DownloadPlan::Bundle(files)),
    }
}

/// An open source file, read in chunks on the blocking pool.
struct Source {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
}

impl Source {
    async fn open(
        fs: &Arc<dyn FileSystem>,
        file: &ResolvedPath,
    ) -> io::Result<(EntryMetadata, Source)> {
        let fs = Arc::clone(fs);
        let path = file.real_path().to_path_buf();
        task::spawn_blocking(move || {
            let metadata = fs.metadata(&path)?;
            let reader = fs.open_read(&path)?;
            Ok::<_, io::Error>((
                metadata,
                Source {
                    reader,
                    buffer: vec![0u8; COPY_BUFFER_SIZE],
                },
            ))
        })
        .await
        .map_err(io::Error::other)?
    }

    /// Reads the next chunk into the buffer. Zero means end of file.
    async fn next_chunk(&mut self) -> io::Result<usize> {
        let mut reader = mem::replace(&mut self.reader, Box::new(io::empty()));
        let mut buffer = mem::take(&mut self.buffer);
        let (reader, buffer, result) = task::spawn_blocking(move || {
            let result = loop {
                match reader.read(&mut buffer) {
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    other => break other,
                }
            };
            (reader, buffer, result)
        })
        .await
        .map_err(io::Error::other)?;
        self.reader = reader;
        self.buffer = buffer;
        result
    }

    fn chunk(&self, len: usize) -> &[u8] {
        &self.buffer[..len]
    }
}

/// Streams `files` as a zip container into `sink`, one entry at a time.
///
/// A file that cannot be opened, or whose first read fails, is logged and
/// left out. A read failure after data was written closes that entry early
/// and is reported as truncated. Any failure writing to `sink` ends the
/// archive at once; files after it are never opened. The central directory
/// is written exactly once, after the last entry.
pub async fn write_archive<W>(
    fs: Arc<dyn FileSystem>,
    files: Vec<ResolvedPath>,
    sink: W,
) -> Result<(W, ArchiveReport), ArchiveError>
where
    W: AsyncWrite + Unpin,
{
    let mut zip = ZipFileWriter::with_tokio(sink);
    let mut report = ArchiveReport::default();

    for file in &files {
        let entry_name = file.virtual_path().to_string();

        let (metadata, mut source) = match Source::open(&fs, file).await {
            Ok(opened) => opened,
            Err(e) => {
                error!("Error opening file {}: {}", file.real_path().display(), e);
                report.skipped.push(entry_name);
                continue;
            }
        };
        let mut len = match source.next_chunk().await {
            Ok(len) => len,
            Err(e) => {
                error!("Error reading file {}: {}", file.real_path().display(), e);
                report.skipped.push(entry_name);
                continue;
            }
        };

        let mut builder = ZipEntryBuilder::new(entry_name.clone().into(), Compression::Deflate);
        if let Some(modified) = metadata.modified {
            builder = builder.last_modification_date(zip_timestamp(modified));
        }
        let mut entry = zip.write_entry_stream(builder).await?;

        let mut total = 0u64;
        let mut read_failure = None;
        while len > 0 {
            entry.write_all(source.chunk(len)).await?;
            total += len as u64;
            len = match source.next_chunk().await {
                Ok(len) => len,
                Err(e) => {
                    read_failure = Some(e);
                    break;
                }
            };
        }
        entry.close().await?;

        match read_failure {
            None => {
                debug!("Added {} ({} bytes) to archive", entry_name, total);
                report.written.push(entry_name);
            }
            Some(e) => {
                error!(
                    "Error reading file {} after {} bytes: {}",
                    file.real_path().display(),
                    total,
                    e
                );
                report.truncated.push(entry_name);
            }
        }
    }

    let mut sink = zip.close().await?.into_inner();
    sink.flush().await?;
    info!(
        "Archive finished with {} entries ({} skipped, {} truncated)",
        report.written.len() + report.truncated.len(),
        report.skipped.len(),
        report.truncated.len()
    );
    Ok((sink, report))
}

fn zip_timestamp(modified: SystemTime) -> ZipDateTime {
    let local: DateTime<Local> = modified.into();
    ZipDateTime::from_chrono(&local.naive_local().and_utc())
}

/// Starts streaming a bundle and returns the readable end of the pipe.
///
/// The archive is written by a background task into a bounded pipe, so it
/// only advances as fast as the reader drains it. Dropping the reader makes
/// the next write fail, which stops the task and releases the open file.
pub fn stream_bundle(
    fs: Arc<dyn FileSystem>,
    files: Vec<ResolvedPath>,
    client: ClientAddr,
) -> DuplexStream {
    let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
    tokio::spawn(async move {
        match write_archive(fs, files, writer).await {
            Ok((_, report)) => info!(
                "Archive downloaded: {} files ({} skipped) by IP: {}",
                report.written.len(),
                report.skipped.len() + report.truncated.len(),
                client
            ),
            Err(e) => warn!("Archive download aborted: {} for IP: {}", e, client),
        }
    });
    reader
}
