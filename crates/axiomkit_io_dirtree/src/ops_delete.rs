//! Delete strategies.
//!
//! File removal failures are never fatal: the file is tallied as remaining
//! and the walk goes on. Whole-tree deletes additionally check that what they
//! promised to remove is actually gone.

use std::path::Path;

use crate::descriptor::SpecDirDescriptor;
use crate::entry::SpecFileInfo;
use crate::report::{ReportDelete, ReportRun, ResultRun};
use crate::select::SpecSelectionMatcher;
use crate::spec::{DirTreeError, EnumTreeOperation, SpecSelectionCriteria, SpecTreeOptions};
use crate::traverse::{EngineDirTree, SpecWalkState, TraitTreeVisitor};

////////////////////////////////////////////////////////////////////////////////
// #region PublicApi

/// Remove the files of the tree below `dir` selected by `spec_options`.
///
/// Directories are left in place.
pub fn delete_directory_tree_files<P: AsRef<Path>>(
    dir: P,
    spec_options: SpecTreeOptions,
) -> ResultRun<ReportDelete> {
    EngineDirTree::native().delete_directory_tree_files(dir, spec_options)
}

/// Remove the files directly inside `dir` selected by `spec_select`.
pub fn delete_directory_files<P: AsRef<Path>>(
    dir: P,
    spec_select: SpecSelectionCriteria,
) -> ResultRun<ReportDelete> {
    EngineDirTree::native().delete_directory_files(dir, spec_select)
}

/// Remove the files directly inside `dir` whose name matches the glob `pattern`.
pub fn delete_files_by_name_pattern<P: AsRef<Path>>(
    dir: P,
    pattern: &str,
) -> ResultRun<ReportDelete> {
    EngineDirTree::native().delete_files_by_name_pattern(dir, pattern)
}

/// Remove `dir` with everything below it.
pub fn delete_directory_all<P: AsRef<Path>>(dir: P) -> ResultRun<ReportDelete> {
    EngineDirTree::native().delete_directory_all(dir)
}

/// Remove every sub-directory tree of `dir`; files directly inside `dir` stay.
pub fn delete_sub_directories<P: AsRef<Path>>(dir: P) -> ResultRun<ReportDelete> {
    EngineDirTree::native().delete_sub_directories(dir)
}

impl EngineDirTree<'_> {
    /// See [`delete_directory_tree_files`].
    pub fn delete_directory_tree_files<P: AsRef<Path>>(
        &self,
        dir: P,
        spec_options: SpecTreeOptions,
    ) -> ResultRun<ReportDelete> {
        let mut run = ReportRun::new(ReportDelete::default());
        let res = spec_options.prepare().and_then(|matcher| {
            let desc_root = self.open_root(dir.as_ref())?;
            let mut state = SpecWalkState::default();
            self.delete_files_into(&desc_root, &spec_options, &matcher, &mut run, &mut state)
        });
        finish(run, res)
    }

    /// See [`delete_directory_files`].
    pub fn delete_directory_files<P: AsRef<Path>>(
        &self,
        dir: P,
        spec_select: SpecSelectionCriteria,
    ) -> ResultRun<ReportDelete> {
        self.delete_directory_tree_files(dir, SpecTreeOptions::top_level_only(spec_select))
    }

    /// See [`delete_files_by_name_pattern`].
    pub fn delete_files_by_name_pattern<P: AsRef<Path>>(
        &self,
        dir: P,
        pattern: &str,
    ) -> ResultRun<ReportDelete> {
        if pattern.trim().is_empty() {
            let run = ReportRun::new(ReportDelete::default());
            return Err(run.into_failure(DirTreeError::InvalidInput(
                "File name pattern is empty or blank.".to_string(),
            )));
        }
        self.delete_directory_files(dir, SpecSelectionCriteria::with_patterns([pattern]))
    }

    /// See [`delete_directory_all`].
    pub fn delete_directory_all<P: AsRef<Path>>(&self, dir: P) -> ResultRun<ReportDelete> {
        let mut run = ReportRun::new(ReportDelete::default());
        let res = self.delete_all_into(dir.as_ref(), &mut run);
        finish(run, res)
    }

    /// See [`delete_sub_directories`].
    pub fn delete_sub_directories<P: AsRef<Path>>(&self, dir: P) -> ResultRun<ReportDelete> {
        let mut run = ReportRun::new(ReportDelete::default());
        let res = self.delete_sub_dirs_into(dir.as_ref(), &mut run);
        finish(run, res)
    }

    /// Remove every file, then every directory bottom-up, root included.
    pub(crate) fn delete_all_into(
        &self,
        dir: &Path,
        run: &mut ReportRun<ReportDelete>,
    ) -> Result<(), DirTreeError> {
        let spec_options = SpecTreeOptions::default();
        let matcher = spec_options.prepare()?;
        let desc_root = self.open_root(dir)?;
        let mut state = SpecWalkState::default();
        self.delete_files_into(&desc_root, &spec_options, &matcher, run, &mut state)?;
        self.remove_dirs_bottom_up(state, run);

        if self.exists(desc_root.path())? {
            return Err(DirTreeError::PostConditionViolated(format!(
                "Directory {} still exists after deleting it ({} item error(s))",
                desc_root.path().display(),
                run.error_count()
            )));
        }
        Ok(())
    }

    /// Remove every sub-directory tree below `dir`, keeping top-level files.
    pub(crate) fn delete_sub_dirs_into(
        &self,
        dir: &Path,
        run: &mut ReportRun<ReportDelete>,
    ) -> Result<(), DirTreeError> {
        let spec_options = SpecTreeOptions {
            if_skip_top_level_dir: true,
            ..SpecTreeOptions::default()
        };
        let matcher = spec_options.prepare()?;
        let desc_root = self.open_root(dir)?;
        let mut state = SpecWalkState::default();
        self.delete_files_into(&desc_root, &spec_options, &matcher, run, &mut state)?;
        self.remove_dirs_bottom_up(state, run);

        let l_entries = self
            .fs()
            .list_directory(desc_root.path())
            .map_err(|e| DirTreeError::io(desc_root.path(), e))?;
        let n_dirs_left = l_entries.iter().filter(|v| v.is_dir()).count();
        if n_dirs_left > 0 {
            return Err(DirTreeError::PostConditionViolated(format!(
                "{n_dirs_left} sub-directory(ies) of {} remain after deleting them",
                desc_root.path().display()
            )));
        }
        Ok(())
    }

    fn delete_files_into(
        &self,
        desc_root: &SpecDirDescriptor,
        spec_options: &SpecTreeOptions,
        matcher: &SpecSelectionMatcher,
        run: &mut ReportRun<ReportDelete>,
        state: &mut SpecWalkState,
    ) -> Result<(), DirTreeError> {
        let res_walk = {
            let mut visitor = VisitorDelete {
                engine: *self,
                if_dir_touched: false,
                run: &mut *run,
            };
            self.walk(desc_root, spec_options, matcher, &mut visitor, state)
        };

        run.stats.total_dirs_scanned = state.total_dirs_scanned;
        run.stats.total_sub_dirs = state.total_sub_dirs;
        run.stats.total_files_processed = state.total_files_processed;
        res_walk?;

        let n_accounted = run.stats.files_deleted + run.stats.files_remaining;
        if run.stats.total_files_processed != n_accounted {
            return Err(DirTreeError::Structural(format!(
                "processed={} but deleted + remaining={}",
                run.stats.total_files_processed, n_accounted
            )));
        }
        Ok(())
    }

    fn remove_dirs_bottom_up(&self, state: SpecWalkState, run: &mut ReportRun<ReportDelete>) {
        // Reverse breadth-first order removes children before parents.
        for dir in state.dirs_visited.into_vec().into_iter().rev() {
            match self.fs().remove_dir(dir.path()) {
                Ok(()) => run.stats.dirs_deleted += 1,
                Err(e) => run.add_error(
                    dir.path(),
                    EnumTreeOperation::Delete,
                    format!("Failed to remove directory ({e})"),
                ),
            }
        }
    }
}

fn finish(
    run: ReportRun<ReportDelete>,
    res: Result<(), DirTreeError>,
) -> ResultRun<ReportDelete> {
    match res {
        Ok(()) => {
            tracing::info!("{}", run.stats);
            Ok(run)
        }
        Err(e) => Err(run.into_failure(e)),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Visitor

struct VisitorDelete<'e, 'r> {
    engine: EngineDirTree<'e>,
    if_dir_touched: bool,
    run: &'r mut ReportRun<ReportDelete>,
}

impl TraitTreeVisitor for VisitorDelete<'_, '_> {
    fn on_directory(
        &mut self,
        _dir: &SpecDirDescriptor,
        _if_files_eligible: bool,
    ) -> Result<(), DirTreeError> {
        self.if_dir_touched = false;
        Ok(())
    }

    fn on_directory_failed(&mut self, dir: &SpecDirDescriptor, exception: String) {
        self.run.add_error(dir.path(), EnumTreeOperation::Delete, exception);
    }

    fn on_file_selected(
        &mut self,
        _dir: &SpecDirDescriptor,
        file: &SpecFileInfo,
    ) -> Result<(), DirTreeError> {
        match self.engine.fs().remove_file(&file.path) {
            Ok(()) => {
                self.run.stats.add_deleted(file.size);
                if !self.if_dir_touched {
                    self.if_dir_touched = true;
                    self.run.stats.num_dirs_where_files_deleted += 1;
                }
            }
            Err(e) => {
                self.run.stats.add_remaining(file.size);
                self.run.add_error(
                    &file.path,
                    EnumTreeOperation::Delete,
                    format!("Failed to remove file ({e})"),
                );
            }
        }
        Ok(())
    }

    fn on_file_rejected(&mut self, file: &SpecFileInfo) {
        self.run.stats.add_remaining(file.size);
    }

    fn on_file_failed(&mut self, file: &SpecFileInfo, exception: String) {
        self.run.stats.add_remaining(file.size);
        self.run.add_error(&file.path, EnumTreeOperation::Delete, exception);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
