//! Bulk download
//!
//! Filters a selection set down to existing regular files and bundles more
//! than one of them into a deflate-compressed zip container, streamed
//! straight into the response body.

pub mod operations;
pub mod results;

pub use operations::{ARCHIVE_NAME, select_files, stream_bundle, write_archive};
pub use results::{ArchiveReport, DownloadPlan};
