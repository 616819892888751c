//! Copy strategies: whole tree or a single directory level.
//!
//! Destination directories are derived per source directory by base-path
//! substitution and created lazily, right before the first file lands there.

use std::path::{Path, PathBuf};

use crate::descriptor::{SpecDirDescriptor, check_overlap, substitute_base_path};
use crate::entry::{EnumEntryKind, SpecFileInfo};
use crate::report::{ReportCopyTree, ReportRun, ResultRun};
use crate::spec::{DirTreeError, EnumTreeOperation, SpecFileTypeFilters, SpecTreeOptions};
use crate::traverse::{EngineDirTree, SpecWalkState, TraitTreeVisitor};

////////////////////////////////////////////////////////////////////////////////
// #region PublicApi

/// Copy the files of `dir_source` selected by `spec_options` into
/// `dir_destination`, mirroring the directory structure.
///
/// Returns [`ReportRun`] when the run completes; per-file failures are stored
/// in it. Returns [`crate::FailureRun`] for invalid inputs, an unreadable
/// source root, an unwritable destination directory and failed post-checks.
pub fn copy_directory_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_options: SpecTreeOptions,
) -> ResultRun<ReportCopyTree>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    EngineDirTree::native().copy_directory_tree(dir_source, dir_destination, spec_options)
}

/// Copy the files directly inside `dir_source` into `dir_destination`.
///
/// Recursion and top-level skipping in `spec_options` are ignored.
pub fn copy_directory<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_options: SpecTreeOptions,
) -> ResultRun<ReportCopyTree>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    EngineDirTree::native().copy_directory(dir_source, dir_destination, spec_options)
}

impl EngineDirTree<'_> {
    /// See [`copy_directory_tree`].
    pub fn copy_directory_tree<P, Q>(
        &self,
        dir_source: P,
        dir_destination: Q,
        spec_options: SpecTreeOptions,
    ) -> ResultRun<ReportCopyTree>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let mut run = ReportRun::new(ReportCopyTree::default());
        match self.copy_tree_into(
            dir_source.as_ref(),
            dir_destination.as_ref(),
            &spec_options,
            &mut run,
        ) {
            Ok(()) => {
                tracing::info!("{}", run.stats);
                Ok(run)
            }
            Err(e) => Err(run.into_failure(e)),
        }
    }

    /// See [`copy_directory`].
    pub fn copy_directory<P, Q>(
        &self,
        dir_source: P,
        dir_destination: Q,
        spec_options: SpecTreeOptions,
    ) -> ResultRun<ReportCopyTree>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let spec_options = SpecTreeOptions {
            if_skip_top_level_dir: false,
            if_scan_sub_dirs: false,
            ..spec_options
        };
        self.copy_directory_tree(dir_source, dir_destination, spec_options)
    }

    /// Copy phase shared with the move strategies.
    ///
    /// Fills `run` as it goes, so the caller keeps partial counters on error.
    pub(crate) fn copy_tree_into(
        &self,
        dir_source: &Path,
        dir_destination: &Path,
        spec_options: &SpecTreeOptions,
        run: &mut ReportRun<ReportCopyTree>,
    ) -> Result<(), DirTreeError> {
        let matcher = spec_options.prepare()?;

        let desc_src = self.open_root(dir_source)?;
        let mut desc_dst = SpecDirDescriptor::new(dir_destination);
        desc_dst.validate_with(self.fs(), false)?;

        let path_base_src = desc_src.path().to_path_buf();
        let path_base_dst = desc_dst.path().to_path_buf();
        check_overlap(&path_base_src, &path_base_dst)?;

        let mut state = SpecWalkState::default();
        let res_walk = {
            let mut visitor = VisitorCopy {
                engine: *self,
                path_base_src: &path_base_src,
                path_base_dst: &path_base_dst,
                spec_file_types: spec_options.spec_file_types,
                if_copy_empty_dirs: spec_options.if_copy_empty_dirs,
                path_dir_dst: PathBuf::new(),
                if_dst_ready: false,
                if_dir_copied: false,
                run: &mut *run,
            };
            self.walk(&desc_src, spec_options, &matcher, &mut visitor, &mut state)
        };

        run.stats.total_dirs_scanned = state.total_dirs_scanned;
        run.stats.total_sub_dirs = state.total_sub_dirs;
        run.stats.total_files_processed = state.total_files_processed;
        res_walk?;

        if run.stats.files_copied > 0 && !self.exists(&path_base_dst)? {
            return Err(DirTreeError::PostConditionViolated(format!(
                "{} file(s) copied but destination {} does not exist",
                run.stats.files_copied,
                path_base_dst.display()
            )));
        }
        let n_accounted = run.stats.files_copied + run.stats.files_not_copied;
        if run.stats.total_files_processed != n_accounted {
            return Err(DirTreeError::Structural(format!(
                "processed={} but copied + not_copied={}",
                run.stats.total_files_processed, n_accounted
            )));
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Visitor

struct VisitorCopy<'e, 'r> {
    engine: EngineDirTree<'e>,
    path_base_src: &'r Path,
    path_base_dst: &'r Path,
    spec_file_types: SpecFileTypeFilters,
    if_copy_empty_dirs: bool,
    path_dir_dst: PathBuf,
    if_dst_ready: bool,
    if_dir_copied: bool,
    run: &'r mut ReportRun<ReportCopyTree>,
}

impl VisitorCopy<'_, '_> {
    fn ensure_dir_dst(&mut self) -> Result<(), DirTreeError> {
        if self.if_dst_ready {
            return Ok(());
        }
        match self.engine.fs().stat_path(&self.path_dir_dst) {
            Ok(Some(info)) if info.is_dir() => {}
            Ok(Some(_)) => return Err(DirTreeError::NotADirectory(self.path_dir_dst.clone())),
            Ok(None) => {
                self.engine
                    .fs()
                    .create_dir_all(&self.path_dir_dst)
                    .map_err(|e| DirTreeError::io(&self.path_dir_dst, e))?;
                self.run.stats.dirs_created += 1;
                tracing::debug!(
                    dir = %self.path_dir_dst.display(),
                    "created destination directory"
                );
            }
            Err(e) => return Err(DirTreeError::io(&self.path_dir_dst, e)),
        }
        self.if_dst_ready = true;
        Ok(())
    }

    fn is_type_allowed(&self, kind: &EnumEntryKind) -> bool {
        match kind {
            EnumEntryKind::Regular => self.spec_file_types.if_regular,
            EnumEntryKind::Symlink => self.spec_file_types.if_symlink,
            EnumEntryKind::Other => self.spec_file_types.if_other,
            EnumEntryKind::Directory | EnumEntryKind::Unknown(_) => false,
        }
    }
}

impl TraitTreeVisitor for VisitorCopy<'_, '_> {
    fn on_directory(
        &mut self,
        dir: &SpecDirDescriptor,
        if_files_eligible: bool,
    ) -> Result<(), DirTreeError> {
        self.path_dir_dst =
            substitute_base_path(dir.path(), self.path_base_src, self.path_base_dst)?;
        self.if_dst_ready = false;
        self.if_dir_copied = false;
        if self.if_copy_empty_dirs && if_files_eligible {
            self.ensure_dir_dst()?;
        }
        Ok(())
    }

    fn on_directory_failed(&mut self, dir: &SpecDirDescriptor, exception: String) {
        self.run.add_error(dir.path(), EnumTreeOperation::Copy, exception);
    }

    fn on_file_selected(
        &mut self,
        _dir: &SpecDirDescriptor,
        file: &SpecFileInfo,
    ) -> Result<(), DirTreeError> {
        if !self.is_type_allowed(&file.kind) {
            self.run.stats.add_not_copied(file.size);
            return Ok(());
        }

        self.ensure_dir_dst()?;
        let path_dst = self.path_dir_dst.join(&file.name);
        match self.engine.copier().copy_file(&file.path, &path_dst) {
            Ok(()) => {
                self.run.stats.add_copied(file.size);
                if !self.if_dir_copied {
                    self.if_dir_copied = true;
                    self.run.stats.dirs_copied += 1;
                }
            }
            Err(e) => {
                self.run.stats.add_not_copied(file.size);
                self.run.add_error(
                    &file.path,
                    EnumTreeOperation::Copy,
                    format!("Failed to copy to {} ({e})", path_dst.display()),
                );
            }
        }
        Ok(())
    }

    fn on_file_rejected(&mut self, file: &SpecFileInfo) {
        self.run.stats.add_not_copied(file.size);
    }

    fn on_file_failed(&mut self, file: &SpecFileInfo, exception: String) {
        self.run.stats.add_not_copied(file.size);
        self.run.add_error(&file.path, EnumTreeOperation::Copy, exception);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
