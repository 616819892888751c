//! Move strategies.
//!
//! A tree move is a full copy followed by a delete of the source. The delete
//! only runs when the copy left nothing behind and reported no error; in any
//! other case the source stays untouched and the move fails.

use std::path::{Path, PathBuf};

use crate::descriptor::{SpecDirDescriptor, check_overlap};
use crate::entry::SpecFileInfo;
use crate::report::{ReportCopyTree, ReportDelete, ReportMove, ReportRun, ResultRun};
use crate::spec::{
    DirTreeError, EnumTreeOperation, SpecFileTypeFilters, SpecSelectionCriteria, SpecTreeOptions,
};
use crate::traverse::{EngineDirTree, SpecWalkState, TraitTreeVisitor};

////////////////////////////////////////////////////////////////////////////////
// #region PublicApi

/// Move the whole tree below `dir_source` to `dir_destination`.
///
/// Only `if_skip_top_level_dir` is read from `spec_options`: when set, files
/// directly inside `dir_source` stay and only its sub-directory trees move.
/// Every file and every empty directory is copied before anything is removed.
pub fn move_directory_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_options: SpecTreeOptions,
) -> ResultRun<ReportMove>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    EngineDirTree::native().move_directory_tree(dir_source, dir_destination, spec_options)
}

/// Move every sub-directory tree of `dir_source` below `dir_destination`.
pub fn move_sub_directory_tree<P, Q>(dir_source: P, dir_destination: Q) -> ResultRun<ReportMove>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let spec_options = SpecTreeOptions {
        if_skip_top_level_dir: true,
        ..SpecTreeOptions::default()
    };
    move_directory_tree(dir_source, dir_destination, spec_options)
}

/// Move the files directly inside `dir_source` selected by `spec_select`.
///
/// Each file is copied, then removed from the source. The source directory is
/// removed when it ends up empty.
pub fn move_directory<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_select: SpecSelectionCriteria,
) -> ResultRun<ReportMove>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    EngineDirTree::native().move_directory(dir_source, dir_destination, spec_select)
}

impl EngineDirTree<'_> {
    /// See [`move_directory_tree`].
    pub fn move_directory_tree<P, Q>(
        &self,
        dir_source: P,
        dir_destination: Q,
        spec_options: SpecTreeOptions,
    ) -> ResultRun<ReportMove>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let mut run = ReportRun::new(ReportMove::default());
        match self.move_tree_into(
            dir_source.as_ref(),
            dir_destination.as_ref(),
            spec_options.if_skip_top_level_dir,
            &mut run,
        ) {
            Ok(()) => {
                tracing::info!("{}", run.stats);
                Ok(run)
            }
            Err(e) => Err(run.into_failure(e)),
        }
    }

    /// See [`move_directory`].
    pub fn move_directory<P, Q>(
        &self,
        dir_source: P,
        dir_destination: Q,
        spec_select: SpecSelectionCriteria,
    ) -> ResultRun<ReportMove>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let mut run = ReportRun::new(ReportMove::default());
        match self.move_files_into(
            dir_source.as_ref(),
            dir_destination.as_ref(),
            spec_select,
            &mut run,
        ) {
            Ok(()) => {
                tracing::info!("{}", run.stats);
                Ok(run)
            }
            Err(e) => Err(run.into_failure(e)),
        }
    }

    fn move_tree_into(
        &self,
        dir_source: &Path,
        dir_destination: &Path,
        if_skip_top_level_dir: bool,
        run: &mut ReportRun<ReportMove>,
    ) -> Result<(), DirTreeError> {
        let spec_copy = SpecTreeOptions {
            if_skip_top_level_dir,
            if_scan_sub_dirs: true,
            spec_select: SpecSelectionCriteria::default(),
            spec_file_types: SpecFileTypeFilters::default(),
            if_copy_empty_dirs: true,
        };

        let mut run_copy = ReportRun::new(ReportCopyTree::default());
        let res_copy = self.copy_tree_into(dir_source, dir_destination, &spec_copy, &mut run_copy);
        run.stats.total_src_files_processed = run_copy.stats.total_files_processed;
        run.stats.total_dirs_processed = run_copy.stats.total_dirs_scanned;
        run.stats.dirs_created = run_copy.stats.dirs_created;
        run.stats.num_of_sub_directories = run_copy.stats.total_sub_dirs;
        let n_copy_errors = run_copy.error_count();
        run.errors.append(&mut run_copy.errors);
        res_copy?;

        if run_copy.stats.files_not_copied > 0 || n_copy_errors > 0 {
            run.stats.source_files_remaining = run_copy.stats.total_files_processed;
            run.stats.source_file_bytes_remaining =
                run_copy.stats.file_bytes_copied + run_copy.stats.file_bytes_not_copied;
            return Err(DirTreeError::CopyPhaseIncomplete {
                dir_source: dir_source.to_path_buf(),
                files_not_copied: run_copy.stats.files_not_copied,
                n_errors: n_copy_errors,
            });
        }

        let mut run_delete = ReportRun::new(ReportDelete::default());
        let res_delete = if if_skip_top_level_dir {
            self.delete_sub_dirs_into(dir_source, &mut run_delete)
        } else {
            self.delete_all_into(dir_source, &mut run_delete)
        };
        run.stats.source_files_moved = run_delete.stats.files_deleted;
        run.stats.source_file_bytes_moved = run_delete.stats.files_deleted_bytes;
        run.stats.source_files_remaining = run_delete.stats.files_remaining;
        run.stats.source_file_bytes_remaining = run_delete.stats.files_remaining_bytes;
        run.errors.append(&mut run_delete.errors);
        run.stats.if_source_dir_deleted = !self.exists(dir_source)?;
        res_delete
    }

    fn move_files_into(
        &self,
        dir_source: &Path,
        dir_destination: &Path,
        spec_select: SpecSelectionCriteria,
        run: &mut ReportRun<ReportMove>,
    ) -> Result<(), DirTreeError> {
        let spec_options = SpecTreeOptions::top_level_only(spec_select);
        let matcher = spec_options.prepare()?;

        let desc_src = self.open_root(dir_source)?;
        let mut desc_dst = SpecDirDescriptor::new(dir_destination);
        desc_dst.validate_with(self.fs(), false)?;
        check_overlap(desc_src.path(), desc_dst.path())?;

        let mut state = SpecWalkState::default();
        let res_walk = {
            let mut visitor = VisitorMove {
                engine: *self,
                path_dir_dst: desc_dst.path().to_path_buf(),
                if_dst_ready: desc_dst.if_exists_absolute,
                run: &mut *run,
            };
            self.walk(&desc_src, &spec_options, &matcher, &mut visitor, &mut state)
        };
        run.stats.total_src_files_processed = state.total_files_processed;
        run.stats.total_dirs_processed = state.total_dirs_scanned;
        run.stats.num_of_sub_directories = state.total_sub_dirs;
        res_walk?;

        if run.stats.source_files_remaining == 0 && run.stats.num_of_sub_directories == 0 {
            match self.fs().remove_dir(desc_src.path()) {
                Ok(()) => run.stats.if_source_dir_deleted = true,
                Err(e) => run.add_error(
                    desc_src.path(),
                    EnumTreeOperation::Move,
                    format!("Failed to remove emptied source directory ({e})"),
                ),
            }
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Visitor

struct VisitorMove<'e, 'r> {
    engine: EngineDirTree<'e>,
    path_dir_dst: PathBuf,
    if_dst_ready: bool,
    run: &'r mut ReportRun<ReportMove>,
}

impl VisitorMove<'_, '_> {
    fn keep(&mut self, file: &SpecFileInfo) {
        self.run.stats.source_files_remaining += 1;
        self.run.stats.source_file_bytes_remaining += file.size;
    }
}

impl TraitTreeVisitor for VisitorMove<'_, '_> {
    fn on_directory_failed(&mut self, dir: &SpecDirDescriptor, exception: String) {
        self.run.add_error(dir.path(), EnumTreeOperation::Move, exception);
    }

    fn on_file_selected(
        &mut self,
        _dir: &SpecDirDescriptor,
        file: &SpecFileInfo,
    ) -> Result<(), DirTreeError> {
        if !self.if_dst_ready {
            self.engine
                .fs()
                .create_dir_all(&self.path_dir_dst)
                .map_err(|e| DirTreeError::io(&self.path_dir_dst, e))?;
            self.run.stats.dirs_created += 1;
            self.if_dst_ready = true;
        }

        let path_dst = self.path_dir_dst.join(&file.name);
        if let Err(e) = self.engine.copier().copy_file(&file.path, &path_dst) {
            self.keep(file);
            self.run.add_error(
                &file.path,
                EnumTreeOperation::Move,
                format!("Failed to copy to {} ({e})", path_dst.display()),
            );
            return Ok(());
        }

        // Bytes count as moved once the copy exists; undone if the source stays.
        self.run.stats.source_file_bytes_moved += file.size;
        match self.engine.fs().remove_file(&file.path) {
            Ok(()) => self.run.stats.source_files_moved += 1,
            Err(e) => {
                self.run.stats.source_file_bytes_moved -= file.size;
                self.keep(file);
                self.run.add_error(
                    &file.path,
                    EnumTreeOperation::Move,
                    format!("Copied but failed to remove source ({e})"),
                );
            }
        }
        Ok(())
    }

    fn on_file_rejected(&mut self, file: &SpecFileInfo) {
        self.keep(file);
    }

    fn on_file_failed(&mut self, file: &SpecFileInfo, exception: String) {
        self.keep(file);
        self.run.add_error(&file.path, EnumTreeOperation::Move, exception);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsys::{FileCopierNative, FsNative};
    use crate::testutil::{CopierFaulty, FsFaulty, write_tree};

    #[test]
    fn move_tree_relocates_everything() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_tree(&path_src, &["a.txt", "sub/b.txt"]);
        std::fs::create_dir_all(path_src.join("empty")).expect("mkdir");

        let run = move_directory_tree(&path_src, &path_dst, SpecTreeOptions::default())
            .expect("move");
        assert!(run.is_clean());
        assert!(!path_src.exists());
        assert!(path_dst.join("sub/b.txt").is_file());
        assert!(path_dst.join("empty").is_dir());
        assert_eq!(run.stats.total_src_files_processed, 2);
        assert_eq!(run.stats.source_files_moved, 2);
        assert_eq!(run.stats.source_files_remaining, 0);
        assert_eq!(run.stats.num_of_sub_directories, 2);
        assert!(run.stats.if_source_dir_deleted);
    }

    #[test]
    fn move_sub_tree_keeps_top_level_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_tree(&path_src, &["top.txt", "a/x.txt", "b/c/y.txt"]);

        let run = move_sub_directory_tree(&path_src, &path_dst).expect("move sub-tree");
        assert!(path_src.join("top.txt").is_file());
        assert!(!path_src.join("a").exists());
        assert!(!path_dst.join("top.txt").exists());
        assert!(path_dst.join("b/c/y.txt").is_file());
        assert_eq!(run.stats.source_files_moved, 2);
        assert_eq!(run.stats.num_of_sub_directories, 3);
        assert!(!run.stats.if_source_dir_deleted);
    }

    #[test]
    fn failed_copy_leaves_source_untouched() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_tree(&path_src, &["ok.txt", "sub/broken.txt"]);

        let copier = CopierFaulty::failing_names(["broken.txt"]);
        let engine = EngineDirTree::new(&FsNative, &copier);
        let failure = engine
            .move_directory_tree(&path_src, &path_dst, SpecTreeOptions::default())
            .expect_err("gate");

        assert!(matches!(
            failure.error,
            DirTreeError::CopyPhaseIncomplete {
                files_not_copied: 1,
                n_errors: 1,
                ..
            }
        ));
        assert!(path_src.join("ok.txt").is_file());
        assert!(path_src.join("sub/broken.txt").is_file());
        assert_eq!(failure.partial.stats.source_files_moved, 0);
        assert_eq!(failure.partial.stats.source_files_remaining, 2);
        assert!(!failure.partial.stats.if_source_dir_deleted);
    }

    #[test]
    fn move_directory_moves_selected_files_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_tree(&path_src, &["a.txt", "b.log"]);

        let run = move_directory(
            &path_src,
            &path_dst,
            SpecSelectionCriteria::with_patterns(["*.txt"]),
        )
        .expect("move");
        assert_eq!(run.stats.source_files_moved, 1);
        assert_eq!(run.stats.source_files_remaining, 1);
        assert_eq!(run.stats.dirs_created, 1);
        assert!(!run.stats.if_source_dir_deleted);
        assert!(path_dst.join("a.txt").is_file());
        assert!(path_src.join("b.log").is_file());
    }

    #[test]
    fn move_directory_removes_emptied_source() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_tree(&path_src, &["a.txt", "b.txt"]);

        let run = move_directory(&path_src, &path_dst, SpecSelectionCriteria::default())
            .expect("move");
        assert!(run.stats.if_source_dir_deleted);
        assert!(!path_src.exists());
        assert_eq!(run.stats.source_file_bytes_moved, 10);
    }

    #[test]
    fn move_directory_keeps_source_with_sub_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_tree(&path_src, &["a.txt", "sub/b.txt"]);

        let run = move_directory(&path_src, &path_dst, SpecSelectionCriteria::default())
            .expect("move");
        assert_eq!(run.stats.source_files_moved, 1);
        assert_eq!(run.stats.num_of_sub_directories, 1);
        assert!(!run.stats.if_source_dir_deleted);
        assert!(path_src.join("sub/b.txt").is_file());
    }

    #[test]
    fn remove_failure_reverses_moved_bytes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_tree(&path_src, &["stuck.txt", "free.txt"]);
        let fs_faulty = FsFaulty::failing_remove([path_src.join("stuck.txt")]);
        let engine = EngineDirTree::new(&fs_faulty, &FileCopierNative);

        let run = engine
            .move_directory(&path_src, &path_dst, SpecSelectionCriteria::default())
            .expect("move");
        assert_eq!(run.stats.source_files_moved, 1);
        assert_eq!(run.stats.source_file_bytes_moved, "free.txt".len() as u64);
        assert_eq!(run.stats.source_files_remaining, 1);
        assert_eq!(run.stats.source_file_bytes_remaining, "stuck.txt".len() as u64);
        assert_eq!(run.error_count(), 1);
        assert!(path_src.join("stuck.txt").is_file());
        assert!(!run.stats.if_source_dir_deleted);
    }
}
