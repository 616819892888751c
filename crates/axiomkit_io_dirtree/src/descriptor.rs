//! Directory descriptor: a validated directory path plus cached existence state.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::entry::SpecFileInfo;
use crate::fsys::{FsNative, TraitFsAccess};
use crate::spec::DirTreeError;

/// One directory path, its derived forms and the last observed disk state.
///
/// Derived fields are only trustworthy right after [`Self::validate`]; every
/// traversal step that touches disk re-validates first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecDirDescriptor {
    /// Path exactly as supplied.
    pub path_original: PathBuf,
    /// Lexically cleaned form of `path_original` (still relative if it was).
    pub path_normalized: PathBuf,
    /// Absolute, lexically cleaned path.
    pub path_absolute: PathBuf,
    /// Parent of `path_absolute` (itself for a filesystem root).
    pub path_parent: PathBuf,
    /// Final component of `path_absolute`.
    pub name_leaf: String,
    /// Windows volume prefix such as `C:`; empty elsewhere.
    pub name_volume: String,
    /// `path_absolute` existed as a directory at the last validation.
    pub if_exists_absolute: bool,
    /// `path_original` existed at the last validation.
    pub if_exists_original: bool,
    /// Snapshot taken at the last successful validation.
    pub meta_cached: Option<SpecFileInfo>,
}

impl SpecDirDescriptor {
    /// Record a raw path. Nothing is derived until [`Self::validate`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path_original: path.into(),
            ..Self::default()
        }
    }

    /// Path used for disk access: absolute once validated, raw before.
    pub fn path(&self) -> &Path {
        if self.path_absolute.as_os_str().is_empty() {
            &self.path_original
        } else {
            &self.path_absolute
        }
    }

    /// Refresh every derived field from the raw path using the native filesystem.
    ///
    /// See [`Self::validate_with`].
    pub fn validate(&mut self, if_require_exists: bool) -> Result<bool, DirTreeError> {
        self.validate_with(&FsNative, if_require_exists)
    }

    /// Refresh every derived field from the raw path.
    ///
    /// Returns `Ok(false)` for a missing directory when `if_require_exists` is
    /// false. A path naming a file, or an absolute form that exists while the
    /// original form does not, is an error.
    pub fn validate_with(
        &mut self,
        fs: &dyn TraitFsAccess,
        if_require_exists: bool,
    ) -> Result<bool, DirTreeError> {
        let c_raw = self.path_original.to_string_lossy().to_string();
        if c_raw.trim().is_empty() {
            self.reset_state();
            return Err(DirTreeError::InvalidInput(
                "Directory path is empty or blank.".to_string(),
            ));
        }
        if let Some(reason) = find_malformed(&c_raw) {
            self.reset_state();
            return Err(DirTreeError::InvalidInput(format!("{reason}: {c_raw}")));
        }

        self.path_normalized = clean_path(&self.path_original);
        self.path_absolute = absolutize_path(&self.path_original)?;
        self.path_parent = self
            .path_absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.path_absolute.clone());
        self.name_leaf = self
            .path_absolute
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.name_volume = volume_name(&self.path_absolute);

        let stat_abs = fs
            .stat_path(&self.path_absolute)
            .map_err(|e| DirTreeError::io(&self.path_absolute, e))?;
        let Some(info) = stat_abs else {
            self.reset_state();
            if if_require_exists {
                return Err(DirTreeError::DirectoryNotFound(self.path_absolute.clone()));
            }
            return Ok(false);
        };
        if !info.is_dir() {
            self.reset_state();
            return Err(DirTreeError::NotADirectory(self.path_absolute.clone()));
        }

        let stat_orig = fs
            .stat_path(&self.path_original)
            .map_err(|e| DirTreeError::io(&self.path_original, e))?;
        if stat_orig.is_none() {
            self.reset_state();
            return Err(DirTreeError::InconsistentState {
                original: self.path_original.clone(),
                absolute: self.path_absolute.clone(),
            });
        }

        self.if_exists_absolute = true;
        self.if_exists_original = true;
        self.meta_cached = Some(info);
        Ok(true)
    }

    /// Descriptor for the sub-directory `name` of this directory.
    pub fn child(&self, name: &str) -> Self {
        Self::new(self.path().join(name))
    }

    /// Rebase this directory from under `base_old` to under `base_new`.
    pub fn substitute_base_path(
        &self,
        base_old: &Path,
        base_new: &Path,
    ) -> Result<PathBuf, DirTreeError> {
        substitute_base_path(self.path(), base_old, base_new)
    }

    fn reset_state(&mut self) {
        self.if_exists_absolute = false;
        self.if_exists_original = false;
        self.meta_cached = None;
    }
}

/// Replace the leading `base_old` components of `path` with `base_new`.
///
/// Matching is per component, so trailing separators on either base are
/// irrelevant. A `path` not located under `base_old` is an error.
pub fn substitute_base_path(
    path: &Path,
    base_old: &Path,
    base_new: &Path,
) -> Result<PathBuf, DirTreeError> {
    let path_rel = path
        .strip_prefix(base_old)
        .map_err(|_| DirTreeError::PathSubstitution {
            path: path.to_path_buf(),
            base: base_old.to_path_buf(),
        })?;
    if path_rel.as_os_str().is_empty() {
        return Ok(base_new.to_path_buf());
    }
    Ok(base_new.join(path_rel))
}

/// Reject a source and destination where one contains the other.
pub(crate) fn check_overlap(path_src: &Path, path_dst: &Path) -> Result<(), DirTreeError> {
    if path_dst.starts_with(path_src) || path_src.starts_with(path_dst) {
        return Err(DirTreeError::SourceDestinationOverlap {
            dir_source: path_src.to_path_buf(),
            dir_destination: path_dst.to_path_buf(),
        });
    }
    Ok(())
}

/// Lexically resolve `.` and `..` components without touching disk.
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    let mut l_parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match l_parts.last() {
                Some(Component::Normal(_)) => {
                    l_parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => l_parts.push(component),
            },
            _ => l_parts.push(component),
        }
    }

    if l_parts.is_empty() {
        return PathBuf::from(".");
    }
    l_parts.iter().collect()
}

pub(crate) fn absolutize_path(path: &Path) -> Result<PathBuf, DirTreeError> {
    if path.is_absolute() {
        return Ok(clean_path(path));
    }
    let path_cwd = env::current_dir().map_err(|e| DirTreeError::io(path, e))?;
    Ok(clean_path(&path_cwd.join(path)))
}

fn find_malformed(c_raw: &str) -> Option<&'static str> {
    if c_raw.contains("...") {
        return Some("Path contains a triple-dot sequence");
    }
    // A leading doubled separator is a UNC / network prefix.
    let c_tail = c_raw
        .char_indices()
        .nth(1)
        .map(|(i, _)| &c_raw[i..])
        .unwrap_or_default();
    if c_tail.contains("//") || (cfg!(windows) && c_tail.contains("\\\\")) {
        return Some("Path contains doubled separators");
    }
    None
}

fn volume_name(path: &Path) -> String {
    match path.components().next() {
        Some(Component::Prefix(prefix)) => prefix.as_os_str().to_string_lossy().to_string(),
        _ => String::new(),
    }
}
