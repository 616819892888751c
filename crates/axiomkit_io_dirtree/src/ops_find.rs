//! Read-only search strategies.

use std::path::Path;

use crate::collection::CollectionFiles;
use crate::descriptor::SpecDirDescriptor;
use crate::entry::SpecFileInfo;
use crate::report::{ReportDirectory, ReportFind, ReportRun, ResultRun};
use crate::spec::{DirTreeError, EnumTreeOperation, SpecSelectionCriteria, SpecTreeOptions};
use crate::traverse::{EngineDirTree, SpecWalkState, TraitTreeVisitor};

/// Collect the files below `dir` selected by `spec_options`, without mutating
/// anything.
pub fn find_directory_tree_files<P: AsRef<Path>>(
    dir: P,
    spec_options: SpecTreeOptions,
) -> ResultRun<ReportFind> {
    EngineDirTree::native().find_directory_tree_files(dir, spec_options)
}

/// Count directories, files and bytes below `dir`.
///
/// Selection criteria in `spec_options` are ignored; the traversal flags apply.
pub fn find_directory_tree_stats<P: AsRef<Path>>(
    dir: P,
    spec_options: SpecTreeOptions,
) -> ResultRun<ReportDirectory> {
    EngineDirTree::native().find_directory_tree_stats(dir, spec_options)
}

impl EngineDirTree<'_> {
    /// See [`find_directory_tree_files`].
    pub fn find_directory_tree_files<P: AsRef<Path>>(
        &self,
        dir: P,
        spec_options: SpecTreeOptions,
    ) -> ResultRun<ReportFind> {
        let mut run = ReportRun::new(ReportFind::default());
        let mut state = SpecWalkState::default();
        let res = spec_options.prepare().and_then(|matcher| {
            let desc_root = self.open_root(dir.as_ref())?;
            let mut visitor = VisitorFind {
                files: CollectionFiles::new(),
                n_bytes: 0,
                run: &mut run,
            };
            let res_walk = self.walk(&desc_root, &spec_options, &matcher, &mut visitor, &mut state);
            let files = std::mem::take(&mut visitor.files);
            let n_bytes = visitor.n_bytes;
            visitor.run.stats.files_matched = files.len() as u64;
            visitor.run.stats.file_bytes_matched = n_bytes;
            visitor.run.stats.files = files;
            res_walk
        });

        run.stats.total_dirs_scanned = state.total_dirs_scanned;
        run.stats.total_sub_dirs = state.total_sub_dirs;
        run.stats.total_files_processed = state.total_files_processed;
        run.stats.dirs = state.dirs_visited;
        match res {
            Ok(()) => {
                tracing::info!("{}", run.stats);
                Ok(run)
            }
            Err(e) => Err(run.into_failure(e)),
        }
    }

    /// See [`find_directory_tree_stats`].
    pub fn find_directory_tree_stats<P: AsRef<Path>>(
        &self,
        dir: P,
        spec_options: SpecTreeOptions,
    ) -> ResultRun<ReportDirectory> {
        let spec_options = SpecTreeOptions {
            spec_select: SpecSelectionCriteria::default(),
            ..spec_options
        };
        let mut run = ReportRun::new(ReportDirectory::default());
        let mut state = SpecWalkState::default();
        let res = spec_options.prepare().and_then(|matcher| {
            let desc_root = self.open_root(dir.as_ref())?;
            let mut visitor = VisitorStats { run: &mut run };
            self.walk(&desc_root, &spec_options, &matcher, &mut visitor, &mut state)
        });

        run.stats.total_dirs_scanned = state.total_dirs_scanned;
        run.stats.total_sub_dirs = state.total_sub_dirs;
        run.stats.num_files = state.total_files_processed;
        match res {
            Ok(()) => {
                tracing::info!("{}", run.stats);
                Ok(run)
            }
            Err(e) => Err(run.into_failure(e)),
        }
    }
}

struct VisitorFind<'r> {
    files: CollectionFiles,
    n_bytes: u64,
    run: &'r mut ReportRun<ReportFind>,
}

struct VisitorStats<'r> {
    run: &'r mut ReportRun<ReportDirectory>,
}

impl TraitTreeVisitor for VisitorStats<'_> {
    fn on_directory_failed(&mut self, dir: &SpecDirDescriptor, exception: String) {
        self.run.add_error(dir.path(), EnumTreeOperation::Find, exception);
    }

    fn on_file_processed(&mut self, file: &SpecFileInfo) {
        self.run.stats.num_bytes += file.size;
    }

    fn on_file_selected(
        &mut self,
        _dir: &SpecDirDescriptor,
        _file: &SpecFileInfo,
    ) -> Result<(), DirTreeError> {
        Ok(())
    }

    fn on_file_failed(&mut self, file: &SpecFileInfo, exception: String) {
        self.run.add_error(&file.path, EnumTreeOperation::Find, exception);
    }
}

impl TraitTreeVisitor for VisitorFind<'_> {
    fn on_directory_failed(&mut self, dir: &SpecDirDescriptor, exception: String) {
        self.run.add_error(dir.path(), EnumTreeOperation::Find, exception);
    }

    fn on_file_selected(
        &mut self,
        _dir: &SpecDirDescriptor,
        file: &SpecFileInfo,
    ) -> Result<(), DirTreeError> {
        self.n_bytes += file.size;
        self.files.push_back(file.clone());
        Ok(())
    }

    fn on_file_failed(&mut self, file: &SpecFileInfo, exception: String) {
        self.run.add_error(&file.path, EnumTreeOperation::Find, exception);
    }
}
