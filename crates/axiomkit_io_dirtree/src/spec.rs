//! Operation specification models and top-level error types.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// How active selection criteria are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSelectCombineMode {
    /// A file matches when every active criterion matches.
    #[default]
    And,
    /// A file matches when any active criterion matches.
    Or,
}

/// Operation family, used to give non-fatal errors their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumTreeOperation {
    /// Copy a directory or a directory tree.
    Copy,
    /// Move a directory or a directory tree.
    Move,
    /// Delete files and/or directories.
    Delete,
    /// Search without mutating anything.
    Find,
    /// Apply caller-chosen file operations to selected files.
    Execute,
}

impl EnumTreeOperation {
    /// Lower-case label used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Delete => "delete",
            Self::Find => "find",
            Self::Execute => "execute",
        }
    }
}

impl fmt::Display for EnumTreeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action applied to each selected file by the execute strategies.
///
/// The source is the selected file. The destination is the same relative
/// path below the target base directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFileOperation {
    /// Copy to the destination, then remove the source.
    MoveSourceToDestination,
    /// Remove the destination file if it exists.
    DeleteDestinationFile,
    /// Remove the source file if it exists.
    DeleteSourceFile,
    /// Remove both files, each only if it exists.
    DeleteSourceAndDestinationFiles,
    /// Hard link, falling back to a stream copy.
    CopyByHardLinkThenStream,
    /// Stream copy, falling back to a hard link.
    CopyByStreamThenHardLink,
    /// Hard link only.
    CopyByHardLink,
    /// Stream copy only.
    CopyByStream,
    /// Create the directory holding the source file.
    CreateSourceDir,
    /// Create the source directory, then an empty source file.
    CreateSourceDirAndFile,
    /// Create an empty source file, truncating an existing one.
    CreateSourceFile,
    /// Create the directory that would hold the destination file.
    CreateDestinationDir,
    /// Create the destination directory, then an empty destination file.
    CreateDestinationDirAndFile,
    /// Create an empty destination file, truncating an existing one.
    CreateDestinationFile,
}

impl EnumFileOperation {
    /// Snake-case label used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveSourceToDestination => "move_source_to_destination",
            Self::DeleteDestinationFile => "delete_destination_file",
            Self::DeleteSourceFile => "delete_source_file",
            Self::DeleteSourceAndDestinationFiles => "delete_source_and_destination_files",
            Self::CopyByHardLinkThenStream => "copy_by_hard_link_then_stream",
            Self::CopyByStreamThenHardLink => "copy_by_stream_then_hard_link",
            Self::CopyByHardLink => "copy_by_hard_link",
            Self::CopyByStream => "copy_by_stream",
            Self::CreateSourceDir => "create_source_dir",
            Self::CreateSourceDirAndFile => "create_source_dir_and_file",
            Self::CreateSourceFile => "create_source_file",
            Self::CreateDestinationDir => "create_destination_dir",
            Self::CreateDestinationDirAndFile => "create_destination_dir_and_file",
            Self::CreateDestinationFile => "create_destination_file",
        }
    }

    /// True when the operation reads or writes below the target base directory.
    pub fn if_touches_destination(&self) -> bool {
        !matches!(
            self,
            Self::DeleteSourceFile
                | Self::CreateSourceDir
                | Self::CreateSourceDirAndFile
                | Self::CreateSourceFile
        )
    }
}

impl fmt::Display for EnumFileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Composable file selection predicate.
///
/// Every field left at its default value is *inactive* and never causes a
/// rejection. When no criterion is active, every file matches regardless of
/// [`EnumSelectCombineMode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecSelectionCriteria {
    /// Glob patterns matched against the file base name. Empty or blank
    /// strings are ignored; the criterion matches if any pattern matches.
    pub patterns_name: Vec<String>,
    /// Match files whose modification time is strictly older than this.
    pub time_older_than: Option<SystemTime>,
    /// Match files whose modification time is strictly newer than this.
    pub time_newer_than: Option<SystemTime>,
    /// Match files whose permission bits (`mode & 0o7777`) equal this value.
    pub permission_mask: Option<u32>,
    /// Regular expression matched against the file base name.
    pub pattern_regex: Option<String>,
    /// AND / OR combination of the active criteria.
    pub rule_combine: EnumSelectCombineMode,
}

impl SpecSelectionCriteria {
    /// Criteria selecting files whose base name matches any of `patterns`.
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns_name: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// True when the name-pattern criterion contributes to matching.
    pub fn is_pattern_active(&self) -> bool {
        self.patterns_name.iter().any(|p| !p.trim().is_empty())
    }

    /// True when the regex criterion contributes to matching.
    pub fn is_regex_active(&self) -> bool {
        self.pattern_regex
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }

    /// True when at least one criterion is active.
    pub fn is_active(&self) -> bool {
        self.is_pattern_active()
            || self.is_regex_active()
            || self.time_older_than.is_some()
            || self.time_newer_than.is_some()
            || self.permission_mask.is_some()
    }
}

/// Which non-directory entry kinds a copy may write to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFileTypeFilters {
    /// Copy regular files.
    pub if_regular: bool,
    /// Copy symbolic links.
    pub if_symlink: bool,
    /// Copy other non-regular files (fifos, sockets, devices).
    pub if_other: bool,
}

impl Default for SpecFileTypeFilters {
    fn default() -> Self {
        Self {
            if_regular: true,
            if_symlink: true,
            if_other: true,
        }
    }
}

/// Input options shared by tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTreeOptions {
    /// Do not process files located directly inside the root directory.
    pub if_skip_top_level_dir: bool,
    /// Descend into sub-directories.
    pub if_scan_sub_dirs: bool,
    /// File selection predicate.
    pub spec_select: SpecSelectionCriteria,
    /// Entry kinds eligible for copying (copy/move only).
    pub spec_file_types: SpecFileTypeFilters,
    /// Create destination directories even when no file is copied into them
    /// (copy/move only).
    pub if_copy_empty_dirs: bool,
}

impl Default for SpecTreeOptions {
    fn default() -> Self {
        Self {
            if_skip_top_level_dir: false,
            if_scan_sub_dirs: true,
            spec_select: SpecSelectionCriteria::default(),
            spec_file_types: SpecFileTypeFilters::default(),
            if_copy_empty_dirs: false,
        }
    }
}

impl SpecTreeOptions {
    /// Options restricted to the files directly inside the root directory.
    pub fn top_level_only(spec_select: SpecSelectionCriteria) -> Self {
        Self {
            if_scan_sub_dirs: false,
            spec_select,
            ..Self::default()
        }
    }

    /// Reject contradictory flag combinations.
    ///
    /// Skipping the top level without scanning sub-directories can never
    /// yield an eligible file.
    pub fn validate(&self) -> Result<(), DirTreeError> {
        if self.if_skip_top_level_dir && !self.if_scan_sub_dirs {
            return Err(DirTreeError::ConflictingOptions(
                "`if_skip_top_level_dir=true` requires `if_scan_sub_dirs=true`.".to_string(),
            ));
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One non-fatal failure item: the item was skipped and the operation went on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecItemError {
    /// Failed file or directory path.
    pub path: PathBuf,
    /// Operation during which the failure occurred.
    pub operation: EnumTreeOperation,
    /// User-facing error text.
    pub exception: String,
}

impl fmt::Display for SpecItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.operation,
            self.path.display(),
            self.exception
        )
    }
}

/// Fatal errors: the call stopped and its statistics are incomplete.
#[derive(Debug, Error)]
pub enum DirTreeError {
    /// Empty, blank or malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Flags that contradict each other.
    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),
    /// A glob or regex that does not compile. Reported per evaluated file.
    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Offending pattern text.
        pattern: String,
        /// Compiler error text.
        message: String,
    },
    /// Source and destination trees contain one another.
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .dir_source.display(),
        .dir_destination.display()
    )]
    SourceDestinationOverlap {
        /// Absolute source directory.
        dir_source: PathBuf,
        /// Absolute destination directory.
        dir_destination: PathBuf,
    },
    /// Required directory is missing.
    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    /// Path exists but is a file or another non-directory.
    #[error("Path exists but is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// Absolute form exists on disk but the original form does not.
    #[error(
        "Inconsistent path state: {} exists but {} does not",
        .absolute.display(),
        .original.display()
    )]
    InconsistentState {
        /// Path as supplied by the caller.
        original: PathBuf,
        /// Derived absolute path.
        absolute: PathBuf,
    },
    /// A path does not begin with the base directory it was expected under.
    #[error(
        "Path {} does not begin with base directory {}",
        .path.display(),
        .base.display()
    )]
    PathSubstitution {
        /// Path that was being rebased.
        path: PathBuf,
        /// Expected leading base directory.
        base: PathBuf,
    },
    /// The traversal's own bookkeeping failed.
    #[error("Traversal bookkeeping failed: {0}")]
    Structural(String),
    /// Filesystem failure where continuing is unsafe.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path the failing call was made on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Move refused to delete its source after an incomplete copy.
    #[error(
        "Copy phase incomplete: {files_not_copied} file(s) not copied, {n_errors} error(s); \
         source {} was NOT deleted",
        .dir_source.display()
    )]
    CopyPhaseIncomplete {
        /// Source directory that was left untouched.
        dir_source: PathBuf,
        /// Files the copy phase did not write.
        files_not_copied: u64,
        /// Non-fatal errors reported by the copy phase.
        n_errors: usize,
    },
    /// Every step succeeded but the advertised result is not on disk.
    #[error("Post-condition violated: {0}")]
    PostConditionViolated(String),
}

impl DirTreeError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors detected from the inputs alone, before any I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::ConflictingOptions(_)
                | Self::InvalidPattern { .. }
                | Self::SourceDestinationOverlap { .. }
        )
    }

    /// Errors raised because the traversal's own state could not be trusted.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Structural(_) | Self::PathSubstitution { .. } | Self::InconsistentState { .. }
        )
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
