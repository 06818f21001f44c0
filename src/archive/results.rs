//! Archive result types

use crate::storage::ResolvedPath;

/// What a download request turns into after filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadPlan {
    /// Exactly one file: served as-is with its own content type.
    Single(ResolvedPath),
    /// Two or more files, in selection order.
    Bundle(Vec<ResolvedPath>),
}

/// Entry names written to, and skipped from, a bundle.
#[derive(Debug, Default, Clone)]
pub struct ArchiveReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    /// Entries closed early after a read failure part way through.
    pub truncated: Vec<String>,
}
