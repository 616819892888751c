//! Filesystem collaborators used by the traversal engine.
//!
//! The engine never calls `std::fs` directly; it goes through
//! [`TraitFsAccess`] and [`TraitFileCopier`] so strategies can be exercised
//! against injected failures.

use std::fs;
use std::io;
use std::path::Path;

use crate::entry::SpecFileInfo;

////////////////////////////////////////////////////////////////////////////////
// #region Traits

/// Directory listing, stat and removal primitives.
pub trait TraitFsAccess {
    /// List the entries of `path` without following symlinks.
    ///
    /// Entries whose type cannot be read are returned with
    /// [`crate::EnumEntryKind::Unknown`] rather than dropped.
    fn list_directory(&self, path: &Path) -> io::Result<Vec<SpecFileInfo>>;

    /// Stat `path`, following symlinks. `Ok(None)` when nothing exists there.
    fn stat_path(&self, path: &Path) -> io::Result<Option<SpecFileInfo>>;

    /// Remove one non-directory entry.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove one empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Create `path` and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create an empty file at `path`, truncating an existing one.
    fn create_file(&self, path: &Path) -> io::Result<()>;
}

/// Single-file copy primitives.
///
/// Only [`Self::copy_file`] is required; collaborators that cannot tell the
/// copy modes apart fall back to it.
pub trait TraitFileCopier {
    /// Copy `path_src` to `path_dst`, replacing an existing destination file.
    fn copy_file(&self, path_src: &Path, path_dst: &Path) -> io::Result<()>;

    /// Copy by hard link only.
    fn link_file(&self, path_src: &Path, path_dst: &Path) -> io::Result<()> {
        self.copy_file(path_src, path_dst)
    }

    /// Copy by writing a new file only.
    fn stream_file(&self, path_src: &Path, path_dst: &Path) -> io::Result<()> {
        self.copy_file(path_src, path_dst)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region NativeImpl

/// [`TraitFsAccess`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsNative;

impl TraitFsAccess for FsNative {
    fn list_directory(&self, path: &Path) -> io::Result<Vec<SpecFileInfo>> {
        let mut l_entries = Vec::new();
        for entry_res in fs::read_dir(path)? {
            let entry = match entry_res {
                Ok(v) => v,
                Err(e) => {
                    l_entries.push(SpecFileInfo::unknown(
                        path.to_path_buf(),
                        format!("Failed to read directory entry under {} ({e})", path.display()),
                    ));
                    continue;
                }
            };

            let path_entry = entry.path();
            match entry.metadata() {
                Ok(meta) => l_entries.push(SpecFileInfo::from_metadata(path_entry, &meta)),
                Err(e) => {
                    let reason = format!("Failed to inspect {} ({e})", path_entry.display());
                    l_entries.push(SpecFileInfo::unknown(path_entry, reason));
                }
            }
        }
        Ok(l_entries)
    }

    fn stat_path(&self, path: &Path) -> io::Result<Option<SpecFileInfo>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(SpecFileInfo::from_metadata(path.to_path_buf(), &meta))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        fs::File::create(path).map(|_| ())
    }
}

/// [`TraitFileCopier`] trying a hard link first, then a stream copy.
///
/// The stream copy preserves permissions, timestamps and (on Linux) extended
/// attributes. Symbolic links are recreated rather than dereferenced. Fifos,
/// sockets and devices can only be hard linked; streaming them is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCopierNative;

impl TraitFileCopier for FileCopierNative {
    fn copy_file(&self, path_src: &Path, path_dst: &Path) -> io::Result<()> {
        clear_destination(path_dst)?;
        match fs::hard_link(path_src, path_dst) {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::trace!(
                    src = %path_src.display(),
                    dst = %path_dst.display(),
                    error = %e,
                    "hard link failed; falling back to stream copy"
                );
            }
        }
        stream_copy(path_src, path_dst)
    }

    fn link_file(&self, path_src: &Path, path_dst: &Path) -> io::Result<()> {
        clear_destination(path_dst)?;
        fs::hard_link(path_src, path_dst)
    }

    fn stream_file(&self, path_src: &Path, path_dst: &Path) -> io::Result<()> {
        clear_destination(path_dst)?;
        stream_copy(path_src, path_dst)
    }
}

fn clear_destination(path_dst: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path_dst) {
        Ok(meta_dst) if meta_dst.is_dir() => Err(io::Error::other(format!(
            "Destination is a directory: {}",
            path_dst.display()
        ))),
        Ok(_) => fs::remove_file(path_dst),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn stream_copy(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let cfg_file_type = fs::symlink_metadata(path_src)?.file_type();
    if cfg_file_type.is_symlink() {
        return create_symbolic_link(path_src, path_dst);
    }
    // Opening a fifo for reading blocks until a writer shows up.
    if !cfg_file_type.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Source is not a regular file and cannot be stream-copied: {}",
                path_src.display()
            ),
        ));
    }
    copy_file_with_metadata(path_src, path_dst)
}

fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let target = fs::read_link(path_src)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, path_dst);
        Err(io::Error::other(
            "Symbolic links are unsupported on this platform",
        ))
    }
}

fn copy_file_with_metadata(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    fs::copy(path_src, path_dst)?;
    apply_metadata(path_src, path_dst)
}

fn apply_metadata(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_src)?;
    fs::set_permissions(path_dst, stat_src.permissions())?;
    set_file_times(
        path_dst,
        FileTime::from_last_access_time(&stat_src),
        FileTime::from_last_modification_time(&stat_src),
    )?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_src, path_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_src: &Path, path_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_dst, &name, &raw_value) {
            tracing::debug!(dst = %path_dst.display(), error = %e, "xattr not preserved");
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
