//! Operation statistics and run result wrappers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::collection::{CollectionDirs, CollectionFiles};
use crate::spec::{DirTreeError, EnumTreeOperation, SpecItemError};

////////////////////////////////////////////////////////////////////////////////
// #region RunWrappers

/// Statistics of a completed run plus the items it had to skip.
#[derive(Debug, Default, Clone)]
pub struct ReportRun<R> {
    /// Operation-specific counters.
    pub stats: R,
    /// Non-fatal per-item failures, in the order they occurred.
    pub errors: Vec<SpecItemError>,
}

impl<R> ReportRun<R> {
    /// Wrap fresh counters.
    pub fn new(stats: R) -> Self {
        Self {
            stats,
            errors: Vec::new(),
        }
    }

    /// Number of collected non-fatal errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// True when every item was handled.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record one non-fatal failure and emit it as a warning event.
    pub fn add_error(
        &mut self,
        path: impl Into<PathBuf>,
        operation: EnumTreeOperation,
        exception: impl Into<String>,
    ) {
        let item = SpecItemError {
            path: path.into(),
            operation,
            exception: exception.into(),
        };
        tracing::warn!(
            operation = %item.operation,
            path = %item.path.display(),
            "{}",
            item.exception
        );
        self.errors.push(item);
    }

    /// Turn this partial run into a fatal failure.
    pub fn into_failure(self, error: DirTreeError) -> FailureRun<R> {
        FailureRun {
            error,
            partial: self,
        }
    }
}

/// Fatal failure together with whatever was accumulated before it.
///
/// The partial statistics carry no completeness guarantee.
#[derive(Debug)]
pub struct FailureRun<R> {
    /// Reason the run stopped.
    pub error: DirTreeError,
    /// Counters and non-fatal errors gathered so far.
    pub partial: ReportRun<R>,
}

impl<R> fmt::Display for FailureRun<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.partial.errors.is_empty() {
            write!(f, " ({} item error(s) before abort)", self.partial.errors.len())?;
        }
        Ok(())
    }
}

impl<R: fmt::Debug> std::error::Error for FailureRun<R> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Outcome of every public operation.
pub type ResultRun<R> = Result<ReportRun<R>, FailureRun<R>>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Statistics

/// Counters of a copy (tree or single directory).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportCopyTree {
    /// Directories whose contents were read.
    pub total_dirs_scanned: u64,
    /// Sub-directory entries seen, descended or not.
    pub total_sub_dirs: u64,
    /// Source directories with at least one file copied.
    pub dirs_copied: u64,
    /// Destination directories created.
    pub dirs_created: u64,
    /// Non-directory entries examined.
    pub total_files_processed: u64,
    /// Files written to the destination.
    pub files_copied: u64,
    /// Bytes of `files_copied`.
    pub file_bytes_copied: u64,
    /// Files not written: unmatched, type-filtered or failed.
    pub files_not_copied: u64,
    /// Bytes of `files_not_copied`.
    pub file_bytes_not_copied: u64,
}

impl ReportCopyTree {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("total_dirs_scanned".to_string(), self.total_dirs_scanned);
        dict_counts.insert("total_sub_dirs".to_string(), self.total_sub_dirs);
        dict_counts.insert("dirs_copied".to_string(), self.dirs_copied);
        dict_counts.insert("dirs_created".to_string(), self.dirs_created);
        dict_counts.insert("total_files_processed".to_string(), self.total_files_processed);
        dict_counts.insert("files_copied".to_string(), self.files_copied);
        dict_counts.insert("file_bytes_copied".to_string(), self.file_bytes_copied);
        dict_counts.insert("files_not_copied".to_string(), self.files_not_copied);
        dict_counts.insert("file_bytes_not_copied".to_string(), self.file_bytes_not_copied);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs_scanned={} dirs_created={} processed={} copied={} not_copied={} bytes_copied={}",
            self.total_dirs_scanned,
            self.dirs_created,
            self.total_files_processed,
            self.files_copied,
            self.files_not_copied,
            self.file_bytes_copied
        )
    }

    /// Record one copied file.
    pub fn add_copied(&mut self, n_bytes: u64) {
        self.files_copied += 1;
        self.file_bytes_copied += n_bytes;
    }

    /// Record one file left behind.
    pub fn add_not_copied(&mut self, n_bytes: u64) {
        self.files_not_copied += 1;
        self.file_bytes_not_copied += n_bytes;
    }
}

impl fmt::Display for ReportCopyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Counters of a move (tree, sub-tree or single directory).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportMove {
    /// Source files examined.
    pub total_src_files_processed: u64,
    /// Files present at the destination and gone from the source.
    pub source_files_moved: u64,
    /// Bytes of `source_files_moved`.
    pub source_file_bytes_moved: u64,
    /// Files still present in the source.
    pub source_files_remaining: u64,
    /// Bytes of `source_files_remaining`.
    pub source_file_bytes_remaining: u64,
    /// Source directories whose contents were read.
    pub total_dirs_processed: u64,
    /// Destination directories created.
    pub dirs_created: u64,
    /// Sub-directory entries found below the source root.
    pub num_of_sub_directories: u64,
    /// The source root no longer exists.
    pub if_source_dir_deleted: bool,
}

impl ReportMove {
    /// Machine-readable counters. Booleans map to `0`/`1`.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert(
            "total_src_files_processed".to_string(),
            self.total_src_files_processed,
        );
        dict_counts.insert("source_files_moved".to_string(), self.source_files_moved);
        dict_counts.insert(
            "source_file_bytes_moved".to_string(),
            self.source_file_bytes_moved,
        );
        dict_counts.insert(
            "source_files_remaining".to_string(),
            self.source_files_remaining,
        );
        dict_counts.insert(
            "source_file_bytes_remaining".to_string(),
            self.source_file_bytes_remaining,
        );
        dict_counts.insert("total_dirs_processed".to_string(), self.total_dirs_processed);
        dict_counts.insert("dirs_created".to_string(), self.dirs_created);
        dict_counts.insert(
            "num_of_sub_directories".to_string(),
            self.num_of_sub_directories,
        );
        dict_counts.insert(
            "if_source_dir_deleted".to_string(),
            u64::from(self.if_source_dir_deleted),
        );
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} processed={} moved={} remaining={} bytes_moved={} dirs_created={} source_deleted={}",
            self.total_src_files_processed,
            self.source_files_moved,
            self.source_files_remaining,
            self.source_file_bytes_moved,
            self.dirs_created,
            self.if_source_dir_deleted
        )
    }
}

impl fmt::Display for ReportMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MOVE]"))
    }
}

/// Counters of a delete.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportDelete {
    /// Non-directory entries examined.
    pub total_files_processed: u64,
    /// Files removed.
    pub files_deleted: u64,
    /// Bytes of `files_deleted`.
    pub files_deleted_bytes: u64,
    /// Files still present: unmatched or failed.
    pub files_remaining: u64,
    /// Bytes of `files_remaining`.
    pub files_remaining_bytes: u64,
    /// Sub-directory entries seen.
    pub total_sub_dirs: u64,
    /// Directories whose contents were read.
    pub total_dirs_scanned: u64,
    /// Directories in which at least one file was removed.
    pub num_dirs_where_files_deleted: u64,
    /// Directories removed.
    pub dirs_deleted: u64,
}

impl ReportDelete {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("total_files_processed".to_string(), self.total_files_processed);
        dict_counts.insert("files_deleted".to_string(), self.files_deleted);
        dict_counts.insert("files_deleted_bytes".to_string(), self.files_deleted_bytes);
        dict_counts.insert("files_remaining".to_string(), self.files_remaining);
        dict_counts.insert("files_remaining_bytes".to_string(), self.files_remaining_bytes);
        dict_counts.insert("total_sub_dirs".to_string(), self.total_sub_dirs);
        dict_counts.insert("total_dirs_scanned".to_string(), self.total_dirs_scanned);
        dict_counts.insert(
            "num_dirs_where_files_deleted".to_string(),
            self.num_dirs_where_files_deleted,
        );
        dict_counts.insert("dirs_deleted".to_string(), self.dirs_deleted);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} processed={} deleted={} remaining={} bytes_deleted={} dirs_scanned={} dirs_deleted={}",
            self.total_files_processed,
            self.files_deleted,
            self.files_remaining,
            self.files_deleted_bytes,
            self.total_dirs_scanned,
            self.dirs_deleted
        )
    }

    /// Record one removed file.
    pub fn add_deleted(&mut self, n_bytes: u64) {
        self.files_deleted += 1;
        self.files_deleted_bytes += n_bytes;
    }

    /// Record one file left in place.
    pub fn add_remaining(&mut self, n_bytes: u64) {
        self.files_remaining += 1;
        self.files_remaining_bytes += n_bytes;
    }
}

impl fmt::Display for ReportDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[DELETE]"))
    }
}

/// Size summary of a directory tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportDirectory {
    /// Directories whose contents were read, root included.
    pub total_dirs_scanned: u64,
    /// Sub-directory entries seen.
    pub total_sub_dirs: u64,
    /// Non-directory entries.
    pub num_files: u64,
    /// Bytes of `num_files`.
    pub num_bytes: u64,
}

impl ReportDirectory {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("total_dirs_scanned".to_string(), self.total_dirs_scanned);
        dict_counts.insert("total_sub_dirs".to_string(), self.total_sub_dirs);
        dict_counts.insert("num_files".to_string(), self.num_files);
        dict_counts.insert("num_bytes".to_string(), self.num_bytes);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs_scanned={} sub_dirs={} files={} bytes={}",
            self.total_dirs_scanned, self.total_sub_dirs, self.num_files, self.num_bytes
        )
    }
}

impl fmt::Display for ReportDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[DIR]"))
    }
}

/// Result of a search: counters plus the matched entries.
#[derive(Debug, Default, Clone)]
pub struct ReportFind {
    /// Directories whose contents were read.
    pub total_dirs_scanned: u64,
    /// Sub-directory entries seen.
    pub total_sub_dirs: u64,
    /// Non-directory entries examined.
    pub total_files_processed: u64,
    /// Entries accepted by the selection criteria.
    pub files_matched: u64,
    /// Bytes of `files_matched`.
    pub file_bytes_matched: u64,
    /// Directories whose files were eligible, in breadth-first order.
    pub dirs: CollectionDirs,
    /// Matched entries, in discovery order.
    pub files: CollectionFiles,
}

impl ReportFind {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("total_dirs_scanned".to_string(), self.total_dirs_scanned);
        dict_counts.insert("total_sub_dirs".to_string(), self.total_sub_dirs);
        dict_counts.insert("total_files_processed".to_string(), self.total_files_processed);
        dict_counts.insert("files_matched".to_string(), self.files_matched);
        dict_counts.insert("file_bytes_matched".to_string(), self.file_bytes_matched);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs_scanned={} processed={} matched={} bytes_matched={}",
            self.total_dirs_scanned,
            self.total_files_processed,
            self.files_matched,
            self.file_bytes_matched
        )
    }
}

impl fmt::Display for ReportFind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[FIND]"))
    }
}

/// Counters of a file-operation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportExecute {
    /// Directories whose contents were read.
    pub total_dirs_scanned: u64,
    /// Sub-directory entries seen.
    pub total_sub_dirs: u64,
    /// Non-directory entries examined.
    pub total_files_processed: u64,
    /// Entries accepted by the selection criteria.
    pub files_selected: u64,
    /// Bytes of `files_selected`, measured before any operation ran.
    pub file_bytes_selected: u64,
    /// File operations that succeeded.
    pub operations_applied: u64,
    /// File operations that failed.
    pub operations_failed: u64,
}

impl ReportExecute {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("total_dirs_scanned".to_string(), self.total_dirs_scanned);
        dict_counts.insert("total_sub_dirs".to_string(), self.total_sub_dirs);
        dict_counts.insert("total_files_processed".to_string(), self.total_files_processed);
        dict_counts.insert("files_selected".to_string(), self.files_selected);
        dict_counts.insert("file_bytes_selected".to_string(), self.file_bytes_selected);
        dict_counts.insert("operations_applied".to_string(), self.operations_applied);
        dict_counts.insert("operations_failed".to_string(), self.operations_failed);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs_scanned={} processed={} selected={} ops_applied={} ops_failed={}",
            self.total_dirs_scanned,
            self.total_files_processed,
            self.files_selected,
            self.operations_applied,
            self.operations_failed
        )
    }
}

impl fmt::Display for ReportExecute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[EXEC]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
