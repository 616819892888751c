//! File-operation strategies: apply a caller-chosen list of operations to
//! every selected file.
//!
//! Each selected file is paired with a destination at the same relative path
//! below the target base directory. Every operation runs for every selected
//! file; a failing operation is recorded and the next one still runs.

use std::io;
use std::path::{Path, PathBuf};

use crate::descriptor::{SpecDirDescriptor, check_overlap, substitute_base_path};
use crate::entry::SpecFileInfo;
use crate::report::{ReportExecute, ReportRun, ResultRun};
use crate::spec::{
    DirTreeError, EnumFileOperation, EnumTreeOperation, SpecSelectionCriteria, SpecTreeOptions,
};
use crate::traverse::{EngineDirTree, SpecWalkState, TraitTreeVisitor};

////////////////////////////////////////////////////////////////////////////////
// #region PublicApi

/// Apply `l_ops`, in order, to every file of the tree below `dir_source`
/// selected by `spec_select`.
///
/// Destinations mirror the source layout below `dir_target`, which need not
/// exist. Per-operation failures are non-fatal.
pub fn execute_directory_tree_ops<P, Q>(
    dir_source: P,
    dir_target: Q,
    spec_select: SpecSelectionCriteria,
    l_ops: &[EnumFileOperation],
) -> ResultRun<ReportExecute>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    EngineDirTree::native().execute_directory_tree_ops(dir_source, dir_target, spec_select, l_ops)
}

/// Same as [`execute_directory_tree_ops`] for the files directly inside
/// `dir_source`.
pub fn execute_directory_file_ops<P, Q>(
    dir_source: P,
    dir_target: Q,
    spec_select: SpecSelectionCriteria,
    l_ops: &[EnumFileOperation],
) -> ResultRun<ReportExecute>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    EngineDirTree::native().execute_directory_file_ops(dir_source, dir_target, spec_select, l_ops)
}

impl EngineDirTree<'_> {
    /// See [`execute_directory_tree_ops`].
    pub fn execute_directory_tree_ops<P, Q>(
        &self,
        dir_source: P,
        dir_target: Q,
        spec_select: SpecSelectionCriteria,
        l_ops: &[EnumFileOperation],
    ) -> ResultRun<ReportExecute>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let spec_options = SpecTreeOptions {
            spec_select,
            ..SpecTreeOptions::default()
        };
        self.execute_ops(dir_source.as_ref(), dir_target.as_ref(), &spec_options, l_ops)
    }

    /// See [`execute_directory_file_ops`].
    pub fn execute_directory_file_ops<P, Q>(
        &self,
        dir_source: P,
        dir_target: Q,
        spec_select: SpecSelectionCriteria,
        l_ops: &[EnumFileOperation],
    ) -> ResultRun<ReportExecute>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let spec_options = SpecTreeOptions::top_level_only(spec_select);
        self.execute_ops(dir_source.as_ref(), dir_target.as_ref(), &spec_options, l_ops)
    }

    fn execute_ops(
        &self,
        dir_source: &Path,
        dir_target: &Path,
        spec_options: &SpecTreeOptions,
        l_ops: &[EnumFileOperation],
    ) -> ResultRun<ReportExecute> {
        let mut run = ReportRun::new(ReportExecute::default());
        let res = self.execute_ops_into(dir_source, dir_target, spec_options, l_ops, &mut run);
        match res {
            Ok(()) => {
                tracing::info!("{}", run.stats);
                Ok(run)
            }
            Err(e) => Err(run.into_failure(e)),
        }
    }

    fn execute_ops_into(
        &self,
        dir_source: &Path,
        dir_target: &Path,
        spec_options: &SpecTreeOptions,
        l_ops: &[EnumFileOperation],
        run: &mut ReportRun<ReportExecute>,
    ) -> Result<(), DirTreeError> {
        if l_ops.is_empty() {
            return Err(DirTreeError::InvalidInput(
                "File operation list is empty.".to_string(),
            ));
        }
        let matcher = spec_options.prepare()?;

        let desc_src = self.open_root(dir_source)?;
        let mut desc_dst = SpecDirDescriptor::new(dir_target);
        desc_dst.validate_with(self.fs(), false)?;

        let path_base_src = desc_src.path().to_path_buf();
        let path_base_dst = desc_dst.path().to_path_buf();
        if l_ops.iter().any(EnumFileOperation::if_touches_destination) {
            check_overlap(&path_base_src, &path_base_dst)?;
        }

        let mut state = SpecWalkState::default();
        let res_walk = {
            let mut visitor = VisitorExecute {
                engine: *self,
                path_base_src: &path_base_src,
                path_base_dst: &path_base_dst,
                l_ops,
                path_dir_dst: PathBuf::new(),
                run: &mut *run,
            };
            self.walk(&desc_src, spec_options, &matcher, &mut visitor, &mut state)
        };

        run.stats.total_dirs_scanned = state.total_dirs_scanned;
        run.stats.total_sub_dirs = state.total_sub_dirs;
        run.stats.total_files_processed = state.total_files_processed;
        res_walk?;

        let n_expected = run.stats.files_selected * l_ops.len() as u64;
        let n_accounted = run.stats.operations_applied + run.stats.operations_failed;
        if n_expected != n_accounted {
            return Err(DirTreeError::Structural(format!(
                "selected={} x ops={} but applied + failed={}",
                run.stats.files_selected,
                l_ops.len(),
                n_accounted
            )));
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Visitor

struct VisitorExecute<'e, 'r> {
    engine: EngineDirTree<'e>,
    path_base_src: &'r Path,
    path_base_dst: &'r Path,
    l_ops: &'r [EnumFileOperation],
    path_dir_dst: PathBuf,
    run: &'r mut ReportRun<ReportExecute>,
}

impl VisitorExecute<'_, '_> {
    fn apply(&self, op: EnumFileOperation, path_src: &Path, path_dst: &Path) -> io::Result<()> {
        match op {
            EnumFileOperation::MoveSourceToDestination => {
                self.create_parent(path_dst)?;
                self.engine.copier().copy_file(path_src, path_dst)?;
                self.engine.fs().remove_file(path_src)
            }
            EnumFileOperation::DeleteDestinationFile => self.remove_if_exists(path_dst),
            EnumFileOperation::DeleteSourceFile => self.remove_if_exists(path_src),
            EnumFileOperation::DeleteSourceAndDestinationFiles => {
                let res_dst = self.remove_if_exists(path_dst);
                let res_src = self.remove_if_exists(path_src);
                res_dst.and(res_src)
            }
            EnumFileOperation::CopyByHardLinkThenStream => {
                self.create_parent(path_dst)?;
                let copier = self.engine.copier();
                copier.link_file(path_src, path_dst).or_else(|e_first| {
                    copier
                        .stream_file(path_src, path_dst)
                        .map_err(|e_second| both_failed("hard link", e_first, e_second))
                })
            }
            EnumFileOperation::CopyByStreamThenHardLink => {
                self.create_parent(path_dst)?;
                let copier = self.engine.copier();
                copier.stream_file(path_src, path_dst).or_else(|e_first| {
                    copier
                        .link_file(path_src, path_dst)
                        .map_err(|e_second| both_failed("stream copy", e_first, e_second))
                })
            }
            EnumFileOperation::CopyByHardLink => {
                self.create_parent(path_dst)?;
                self.engine.copier().link_file(path_src, path_dst)
            }
            EnumFileOperation::CopyByStream => {
                self.create_parent(path_dst)?;
                self.engine.copier().stream_file(path_src, path_dst)
            }
            EnumFileOperation::CreateSourceDir => self.create_parent(path_src),
            EnumFileOperation::CreateSourceDirAndFile => {
                self.create_parent(path_src)?;
                self.engine.fs().create_file(path_src)
            }
            EnumFileOperation::CreateSourceFile => self.engine.fs().create_file(path_src),
            EnumFileOperation::CreateDestinationDir => self.create_parent(path_dst),
            EnumFileOperation::CreateDestinationDirAndFile => {
                self.create_parent(path_dst)?;
                self.engine.fs().create_file(path_dst)
            }
            EnumFileOperation::CreateDestinationFile => self.engine.fs().create_file(path_dst),
        }
    }

    fn create_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(path_parent) => self.engine.fs().create_dir_all(path_parent),
            None => Ok(()),
        }
    }

    fn remove_if_exists(&self, path: &Path) -> io::Result<()> {
        match self.engine.fs().remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            res => res,
        }
    }
}

fn both_failed(c_first: &str, e_first: io::Error, e_second: io::Error) -> io::Error {
    io::Error::other(format!("{c_first} failed ({e_first}); fallback failed ({e_second})"))
}

impl TraitTreeVisitor for VisitorExecute<'_, '_> {
    fn on_directory(
        &mut self,
        dir: &SpecDirDescriptor,
        _if_files_eligible: bool,
    ) -> Result<(), DirTreeError> {
        self.path_dir_dst =
            substitute_base_path(dir.path(), self.path_base_src, self.path_base_dst)?;
        Ok(())
    }

    fn on_directory_failed(&mut self, dir: &SpecDirDescriptor, exception: String) {
        self.run.add_error(dir.path(), EnumTreeOperation::Execute, exception);
    }

    fn on_file_selected(
        &mut self,
        _dir: &SpecDirDescriptor,
        file: &SpecFileInfo,
    ) -> Result<(), DirTreeError> {
        self.run.stats.files_selected += 1;
        self.run.stats.file_bytes_selected += file.size;

        let path_dst = self.path_dir_dst.join(&file.name);
        for op in self.l_ops {
            match self.apply(*op, &file.path, &path_dst) {
                Ok(()) => self.run.stats.operations_applied += 1,
                Err(e) => {
                    self.run.stats.operations_failed += 1;
                    self.run.add_error(
                        &file.path,
                        EnumTreeOperation::Execute,
                        format!("{op} failed for destination {} ({e})", path_dst.display()),
                    );
                }
            }
        }
        Ok(())
    }

    fn on_file_failed(&mut self, file: &SpecFileInfo, exception: String) {
        self.run.add_error(&file.path, EnumTreeOperation::Execute, exception);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
