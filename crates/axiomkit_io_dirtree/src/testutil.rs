//! Scratch-tree helpers and fault-injecting collaborators for unit tests.

use std::io;
use std::path::{Path, PathBuf};

use crate::entry::SpecFileInfo;
use crate::fsys::{FileCopierNative, FsNative, TraitFileCopier, TraitFsAccess};

/// Create every relative file path below `root`, with the path as content.
pub(crate) fn write_tree(root: &Path, l_rel: &[&str]) {
    for c_rel in l_rel {
        let path_file = root.join(c_rel);
        if let Some(path_parent) = path_file.parent() {
            std::fs::create_dir_all(path_parent).expect("create parent");
        }
        std::fs::write(&path_file, c_rel.as_bytes()).expect("write file");
    }
}

/// Native filesystem with injected failures on chosen paths.
#[derive(Debug, Default)]
pub(crate) struct FsFaulty {
    l_fail_list: Vec<PathBuf>,
    l_fail_remove: Vec<PathBuf>,
    l_unknown: Vec<PathBuf>,
}

impl FsFaulty {
    pub(crate) fn failing_list(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            l_fail_list: paths.into_iter().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn failing_remove(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            l_fail_remove: paths.into_iter().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn unknown_entries(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            l_unknown: paths.into_iter().collect(),
            ..Self::default()
        }
    }
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("injected failure: {}", path.display()),
    )
}

impl TraitFsAccess for FsFaulty {
    fn list_directory(&self, path: &Path) -> io::Result<Vec<SpecFileInfo>> {
        if self.l_fail_list.iter().any(|p| p == path) {
            return Err(denied(path));
        }
        let l_entries = FsNative.list_directory(path)?;
        Ok(l_entries
            .into_iter()
            .map(|info| {
                if self.l_unknown.contains(&info.path) {
                    SpecFileInfo::unknown(info.path, "injected".to_string())
                } else {
                    info
                }
            })
            .collect())
    }

    fn stat_path(&self, path: &Path) -> io::Result<Option<SpecFileInfo>> {
        FsNative.stat_path(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.l_fail_remove.iter().any(|p| p == path) {
            return Err(denied(path));
        }
        FsNative.remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        if self.l_fail_remove.iter().any(|p| p == path) {
            return Err(denied(path));
        }
        FsNative.remove_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        FsNative.create_dir_all(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        FsNative.create_file(path)
    }
}

/// Native copier that fails for chosen base names.
#[derive(Debug, Default)]
pub(crate) struct CopierFaulty {
    l_fail_names: Vec<String>,
}

impl CopierFaulty {
    pub(crate) fn failing_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            l_fail_names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl TraitFileCopier for CopierFaulty {
    fn copy_file(&self, path_src: &Path, path_dst: &Path) -> io::Result<()> {
        let c_name = path_src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.l_fail_names.contains(&c_name) {
            return Err(denied(path_src));
        }
        FileCopierNative.copy_file(path_src, path_dst)
    }
}
