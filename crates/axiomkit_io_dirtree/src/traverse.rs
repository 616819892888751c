//! Queue-driven breadth-first traversal shared by every operation.
//!
//! The engine owns no statistics of its own beyond [`SpecWalkState`]; what
//! happens to each entry is decided by a [`TraitTreeVisitor`].

use std::path::Path;

use crate::collection::CollectionDirs;
use crate::descriptor::SpecDirDescriptor;
use crate::entry::{EnumEntryKind, SpecFileInfo};
use crate::fsys::{FileCopierNative, FsNative, TraitFileCopier, TraitFsAccess};
use crate::select::SpecSelectionMatcher;
use crate::spec::{DirTreeError, SpecTreeOptions};

////////////////////////////////////////////////////////////////////////////////
// #region Visitor

/// Terminal actions invoked by [`EngineDirTree::walk`].
///
/// Returning an error from a callback aborts the walk; per-item problems
/// should be recorded by the visitor and swallowed instead.
pub trait TraitTreeVisitor {
    /// A directory was listed. Called before any of its files.
    ///
    /// `if_files_eligible` is false only for a skipped root.
    fn on_directory(
        &mut self,
        _dir: &SpecDirDescriptor,
        _if_files_eligible: bool,
    ) -> Result<(), DirTreeError> {
        Ok(())
    }

    /// A non-root directory vanished or could not be listed.
    fn on_directory_failed(&mut self, dir: &SpecDirDescriptor, exception: String);

    /// A file is about to be evaluated. Called before the predicate.
    fn on_file_processed(&mut self, _file: &SpecFileInfo) {}

    /// The predicate accepted `file`, located in `dir`.
    fn on_file_selected(
        &mut self,
        dir: &SpecDirDescriptor,
        file: &SpecFileInfo,
    ) -> Result<(), DirTreeError>;

    /// The predicate rejected `file`.
    fn on_file_rejected(&mut self, _file: &SpecFileInfo) {}

    /// `file` could not be classified or evaluated and was skipped.
    fn on_file_failed(&mut self, file: &SpecFileInfo, exception: String);
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Engine

/// Counters and directory list maintained by the engine during one walk.
///
/// Left partially filled when the walk aborts.
#[derive(Debug, Default, Clone)]
pub struct SpecWalkState {
    /// Directories whose contents were read, excluding a skipped root.
    pub total_dirs_scanned: u64,
    /// Sub-directory entries seen, descended or not.
    pub total_sub_dirs: u64,
    /// Non-directory entries handed to the visitor.
    pub total_files_processed: u64,
    /// Listed directories in breadth-first order, without a skipped root.
    pub dirs_visited: CollectionDirs,
}

/// Breadth-first traversal over an explicit FIFO directory queue.
///
/// Built per call; holds only borrowed collaborators.
#[derive(Clone, Copy)]
pub struct EngineDirTree<'a> {
    fs: &'a dyn TraitFsAccess,
    copier: &'a dyn TraitFileCopier,
}

impl EngineDirTree<'static> {
    /// Engine on the real filesystem.
    pub fn native() -> Self {
        Self {
            fs: &FsNative,
            copier: &FileCopierNative,
        }
    }
}

impl<'a> EngineDirTree<'a> {
    /// Engine on injected collaborators.
    pub fn new(fs: &'a dyn TraitFsAccess, copier: &'a dyn TraitFileCopier) -> Self {
        Self { fs, copier }
    }

    /// Filesystem collaborator.
    pub fn fs(&self) -> &'a dyn TraitFsAccess {
        self.fs
    }

    /// File-copy collaborator.
    pub fn copier(&self) -> &'a dyn TraitFileCopier {
        self.copier
    }

    /// Validate an operation root, which must be an existing directory.
    pub fn open_root(&self, path: &Path) -> Result<SpecDirDescriptor, DirTreeError> {
        let mut desc_root = SpecDirDescriptor::new(path);
        desc_root.validate_with(self.fs, true)?;
        Ok(desc_root)
    }

    /// True when `path` currently exists.
    pub fn exists(&self, path: &Path) -> Result<bool, DirTreeError> {
        self.fs
            .stat_path(path)
            .map(|v| v.is_some())
            .map_err(|e| DirTreeError::io(path, e))
    }

    /// Walk the tree below `root`, breadth first.
    ///
    /// The root must exist; failing to validate or list it is fatal. Any
    /// other directory that cannot be listed is reported through
    /// [`TraitTreeVisitor::on_directory_failed`] and skipped. Symbolic links
    /// are never followed.
    pub fn walk(
        &self,
        root: &SpecDirDescriptor,
        spec_options: &SpecTreeOptions,
        matcher: &SpecSelectionMatcher,
        visitor: &mut dyn TraitTreeVisitor,
        state: &mut SpecWalkState,
    ) -> Result<(), DirTreeError> {
        spec_options.validate()?;

        let mut queue_dirs = CollectionDirs::new();
        queue_dirs.push_back(root.clone());
        let mut if_root = true;

        loop {
            let (dir_next, status) = queue_dirs.peek_or_pop(0, true);
            let Some(mut dir) = dir_next else {
                if status.is_collection_empty() {
                    break;
                }
                return Err(DirTreeError::Structural(format!(
                    "Directory queue access failed: {status}"
                )));
            };
            if !status.is_error_free() {
                return Err(DirTreeError::Structural(format!(
                    "Directory queue access failed: {status}"
                )));
            }

            if let Err(e) = dir.validate_with(self.fs, true) {
                if if_root {
                    return Err(e);
                }
                visitor.on_directory_failed(&dir, e.to_string());
                continue;
            }

            let l_entries = match self.fs.list_directory(dir.path()) {
                Ok(v) => v,
                Err(e) if if_root => return Err(DirTreeError::io(dir.path(), e)),
                Err(e) => {
                    visitor.on_directory_failed(
                        &dir,
                        format!("Failed to read directory {} ({e})", dir.path().display()),
                    );
                    continue;
                }
            };

            let if_files_eligible = !(if_root && spec_options.if_skip_top_level_dir);
            if if_files_eligible {
                state.total_dirs_scanned += 1;
            }
            tracing::debug!(
                dir = %dir.path().display(),
                n_entries = l_entries.len(),
                if_files_eligible,
                "scanning directory"
            );
            visitor.on_directory(&dir, if_files_eligible)?;

            for entry in l_entries {
                if entry.is_dir() {
                    state.total_sub_dirs += 1;
                    if spec_options.if_scan_sub_dirs {
                        queue_dirs.push_back(dir.child(&entry.name));
                    }
                    continue;
                }
                if !if_files_eligible {
                    continue;
                }

                state.total_files_processed += 1;
                visitor.on_file_processed(&entry);
                if let EnumEntryKind::Unknown(reason) = &entry.kind {
                    let exception = format!("Entry type could not be determined: {reason}");
                    visitor.on_file_failed(&entry, exception);
                    continue;
                }
                match matcher.matches(&entry) {
                    Ok(true) => visitor.on_file_selected(&dir, &entry)?,
                    Ok(false) => visitor.on_file_rejected(&entry),
                    Err(e) => visitor.on_file_failed(&entry, e.to_string()),
                }
            }

            state.dirs_visited.push_back(dir);
            if_root = false;
        }

        if spec_options.if_skip_top_level_dir {
            let (_, status) = state.dirs_visited.peek_or_pop(0, true);
            if !(status.is_error_free() || status.is_collection_empty()) {
                return Err(DirTreeError::Structural(format!(
                    "Failed to evict root from visited directories: {status}"
                )));
            }
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecSelectionCriteria;
    use crate::testutil::{FsFaulty, write_tree};
    use std::path::PathBuf;

    #[derive(Default)]
    struct VisitorRecorder {
        l_dirs: Vec<(String, bool)>,
        l_selected: Vec<String>,
        l_rejected: Vec<String>,
        l_failed: Vec<String>,
        l_dir_failed: Vec<PathBuf>,
        n_processed: u64,
    }

    impl TraitTreeVisitor for VisitorRecorder {
        fn on_directory(
            &mut self,
            dir: &SpecDirDescriptor,
            if_files_eligible: bool,
        ) -> Result<(), DirTreeError> {
            self.l_dirs.push((dir.name_leaf.clone(), if_files_eligible));
            Ok(())
        }

        fn on_directory_failed(&mut self, dir: &SpecDirDescriptor, _exception: String) {
            self.l_dir_failed.push(dir.path().to_path_buf());
        }

        fn on_file_processed(&mut self, _file: &SpecFileInfo) {
            self.n_processed += 1;
        }

        fn on_file_selected(
            &mut self,
            _dir: &SpecDirDescriptor,
            file: &SpecFileInfo,
        ) -> Result<(), DirTreeError> {
            self.l_selected.push(file.name.clone());
            Ok(())
        }

        fn on_file_rejected(&mut self, file: &SpecFileInfo) {
            self.l_rejected.push(file.name.clone());
        }

        fn on_file_failed(&mut self, file: &SpecFileInfo, _exception: String) {
            self.l_failed.push(file.name.clone());
        }
    }

    fn run(
        engine: EngineDirTree<'_>,
        root: &std::path::Path,
        spec_options: &SpecTreeOptions,
    ) -> (Result<(), DirTreeError>, VisitorRecorder, SpecWalkState) {
        let matcher = spec_options.spec_select.compile();
        let mut visitor = VisitorRecorder::default();
        let mut state = SpecWalkState::default();
        let res = engine.walk(
            &SpecDirDescriptor::new(root),
            spec_options,
            &matcher,
            &mut visitor,
            &mut state,
        );
        (res, visitor, state)
    }

    #[test]
    fn directories_are_visited_breadth_first() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_tree(tmp.path(), &["a/deep/x.txt", "b/y.txt", "top.txt"]);

        let (res, visitor, state) = run(
            EngineDirTree::native(),
            tmp.path(),
            &SpecTreeOptions::default(),
        );
        res.expect("walk");

        let l_names: Vec<&str> = visitor.l_dirs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(l_names.len(), 4);
        assert_eq!(l_names[3], "deep");
        assert_eq!(state.total_dirs_scanned, 4);
        assert_eq!(state.total_sub_dirs, 3);
        assert_eq!(state.total_files_processed, 3);
        assert_eq!(visitor.n_processed, 3);
        assert_eq!(state.dirs_visited.len(), 4);
    }

    #[test]
    fn non_recursive_walk_stays_in_root() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_tree(tmp.path(), &["a.txt", "sub/b.txt"]);

        let spec_options = SpecTreeOptions::top_level_only(SpecSelectionCriteria::default());
        let (res, visitor, state) = run(EngineDirTree::native(), tmp.path(), &spec_options);
        res.expect("walk");

        assert_eq!(visitor.l_selected, vec!["a.txt".to_string()]);
        assert_eq!(state.total_dirs_scanned, 1);
        assert_eq!(state.total_sub_dirs, 1);
        assert_eq!(state.dirs_visited.len(), 1);
    }

    #[test]
    fn skipped_root_is_listed_but_not_counted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_tree(tmp.path(), &["a.txt", "sub/b.txt"]);

        let spec_options = SpecTreeOptions {
            if_skip_top_level_dir: true,
            ..SpecTreeOptions::default()
        };
        let (res, visitor, state) = run(EngineDirTree::native(), tmp.path(), &spec_options);
        res.expect("walk");

        assert_eq!(visitor.l_selected, vec!["b.txt".to_string()]);
        assert!(!visitor.l_dirs[0].1);
        assert_eq!(state.total_dirs_scanned, 1);
        assert_eq!(state.dirs_visited.len(), 1);
        let (dir_first, _) = state.dirs_visited.clone().peek_first();
        assert_eq!(dir_first.expect("sub").name_leaf, "sub");
    }

    #[test]
    fn conflicting_options_fail_before_io() {
        let spec_options = SpecTreeOptions {
            if_skip_top_level_dir: true,
            if_scan_sub_dirs: false,
            ..SpecTreeOptions::default()
        };
        let (res, visitor, state) = run(
            EngineDirTree::native(),
            std::path::Path::new("/definitely/not/here"),
            &spec_options,
        );
        assert!(matches!(res, Err(DirTreeError::ConflictingOptions(_))));
        assert!(visitor.l_dirs.is_empty());
        assert_eq!(state.total_dirs_scanned, 0);
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let (res, _, _) = run(
            EngineDirTree::native(),
            &tmp.path().join("missing"),
            &SpecTreeOptions::default(),
        );
        assert!(matches!(res, Err(DirTreeError::DirectoryNotFound(_))));
    }

    #[test]
    fn unreadable_sub_directory_is_not_fatal() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_tree(tmp.path(), &["a.txt", "bad/b.txt", "good/c.txt"]);
        let fs_faulty = FsFaulty::failing_list([tmp.path().join("bad")]);
        let engine = EngineDirTree::new(&fs_faulty, &crate::fsys::FileCopierNative);

        let (res, mut visitor, state) = run(engine, tmp.path(), &SpecTreeOptions::default());
        res.expect("walk");

        visitor.l_selected.sort();
        assert_eq!(visitor.l_selected, vec!["a.txt".to_string(), "c.txt".to_string()]);
        assert_eq!(visitor.l_dir_failed, vec![tmp.path().join("bad")]);
        assert_eq!(state.total_dirs_scanned, 2);
    }

    #[test]
    fn unknown_entries_fail_per_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_tree(tmp.path(), &["a.txt", "odd.bin"]);
        let fs_faulty = FsFaulty::unknown_entries([tmp.path().join("odd.bin")]);
        let engine = EngineDirTree::new(&fs_faulty, &crate::fsys::FileCopierNative);

        let (res, visitor, state) = run(engine, tmp.path(), &SpecTreeOptions::default());
        res.expect("walk");

        assert_eq!(visitor.l_selected, vec!["a.txt".to_string()]);
        assert_eq!(visitor.l_failed, vec!["odd.bin".to_string()]);
        assert_eq!(state.total_files_processed, 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_tree(tmp.path(), &["real/a.txt"]);
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link"))
            .expect("symlink");

        let (res, mut visitor, state) = run(
            EngineDirTree::native(),
            tmp.path(),
            &SpecTreeOptions::default(),
        );
        res.expect("walk");

        visitor.l_selected.sort();
        assert_eq!(visitor.l_selected, vec!["a.txt".to_string(), "link".to_string()]);
        assert_eq!(state.total_sub_dirs, 1);
    }

    #[test]
    fn rejected_files_are_reported() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_tree(tmp.path(), &["a.txt", "b.log"]);

        let spec_options = SpecTreeOptions {
            spec_select: SpecSelectionCriteria::with_patterns(["*.txt"]),
            ..SpecTreeOptions::default()
        };
        let (res, visitor, _) = run(EngineDirTree::native(), tmp.path(), &spec_options);
        res.expect("walk");
        assert_eq!(visitor.l_selected, vec!["a.txt".to_string()]);
        assert_eq!(visitor.l_rejected, vec!["b.log".to_string()]);
    }

    #[test]
    fn malformed_pattern_fails_each_file_and_walk_continues() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_tree(tmp.path(), &["a.txt", "sub/b.txt"]);

        let spec_options = SpecTreeOptions {
            spec_select: SpecSelectionCriteria::with_patterns(["[a-"]),
            ..SpecTreeOptions::default()
        };
        let (res, mut visitor, state) = run(EngineDirTree::native(), tmp.path(), &spec_options);
        res.expect("walk");

        visitor.l_failed.sort();
        assert_eq!(visitor.l_failed, vec!["a.txt".to_string(), "b.txt".to_string()]);
        assert!(visitor.l_selected.is_empty());
        assert_eq!(state.total_files_processed, 2);
        assert_eq!(state.total_dirs_scanned, 2);
    }
}
