//! Directory entry snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Entry kind as reported by a non-following `lstat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumEntryKind {
    /// Directory.
    Directory,
    /// Regular file.
    Regular,
    /// Symbolic link (never followed by the traversal).
    Symlink,
    /// FIFO, socket, device or other special file.
    Other,
    /// The entry type could not be determined; carries the reason.
    Unknown(String),
}

/// Snapshot of one directory entry taken when its parent was listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFileInfo {
    /// Base name.
    pub name: String,
    /// Full path (parent directory joined with `name`).
    pub path: PathBuf,
    /// Entry kind.
    pub kind: EnumEntryKind,
    /// Size in bytes (`0` when unknown).
    pub size: u64,
    /// Last modification time, when the platform reports it.
    pub time_modified: Option<SystemTime>,
    /// Unix mode bits; synthesized from the read-only flag elsewhere.
    pub mode: u32,
}

impl SpecFileInfo {
    /// Build a snapshot from `symlink_metadata` output.
    pub fn from_metadata(path: PathBuf, meta: &fs::Metadata) -> Self {
        let cfg_file_type = meta.file_type();
        let kind = if cfg_file_type.is_symlink() {
            EnumEntryKind::Symlink
        } else if cfg_file_type.is_dir() {
            EnumEntryKind::Directory
        } else if cfg_file_type.is_file() {
            EnumEntryKind::Regular
        } else {
            EnumEntryKind::Other
        };

        Self {
            name: derive_name(&path),
            path,
            kind,
            size: meta.len(),
            time_modified: meta.modified().ok(),
            mode: derive_mode(meta),
        }
    }

    /// Placeholder for an entry whose type could not be read.
    pub fn unknown(path: PathBuf, reason: String) -> Self {
        Self {
            name: derive_name(&path),
            path,
            kind: EnumEntryKind::Unknown(reason),
            size: 0,
            time_modified: None,
            mode: 0,
        }
    }

    /// True for directories.
    pub fn is_dir(&self) -> bool {
        self.kind == EnumEntryKind::Directory
    }

    /// Permission bits including setuid/setgid/sticky.
    pub fn permission_bits(&self) -> u32 {
        self.mode & 0o7777
    }
}

fn derive_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(unix)]
fn derive_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.mode()
}

#[cfg(not(unix))]
fn derive_mode(meta: &fs::Metadata) -> u32 {
    match (meta.is_dir(), meta.permissions().readonly()) {
        (true, true) => 0o555,
        (true, false) => 0o777,
        (false, true) => 0o444,
        (false, false) => 0o666,
    }
}
