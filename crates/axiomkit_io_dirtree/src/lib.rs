//! `axiomkit_io_dirtree` v1:
//! Directory-tree traversal and bulk file operations.
//!
//! Every operation runs one breadth-first walk on the calling thread and
//! returns its statistics together with the items it had to skip, or a fatal
//! error carrying the partial statistics.
//!
//! Modules:
//! - `spec`       : options/selection criteria/errors
//! - `status`     : collection access status
//! - `entry`      : directory entry snapshots
//! - `descriptor` : validated directory paths
//! - `collection` : directory queue and file record collection
//! - `select`     : selection predicate
//! - `fsys`       : filesystem and file-copy collaborators
//! - `report`     : statistics and run results
//! - `traverse`   : traversal engine and visitor seam
//! - `ops_*`      : copy/move/delete/find/execute strategies

pub mod collection;
pub mod descriptor;
pub mod entry;
pub mod fsys;
pub mod ops_copy;
pub mod ops_delete;
pub mod ops_exec;
pub mod ops_find;
pub mod ops_move;
pub mod report;
pub mod select;
pub mod spec;
pub mod status;
pub mod traverse;

#[cfg(test)]
mod testutil;

pub use collection::{CollectionDirs, CollectionFiles, CollectionIndexed};
pub use descriptor::{SpecDirDescriptor, substitute_base_path};
pub use entry::{EnumEntryKind, SpecFileInfo};
pub use fsys::{FileCopierNative, FsNative, TraitFileCopier, TraitFsAccess};
pub use ops_copy::{copy_directory, copy_directory_tree};
pub use ops_delete::{
    delete_directory_all, delete_directory_files, delete_directory_tree_files,
    delete_files_by_name_pattern, delete_sub_directories,
};
pub use ops_exec::{execute_directory_file_ops, execute_directory_tree_ops};
pub use ops_find::{find_directory_tree_files, find_directory_tree_stats};
pub use ops_move::{move_directory, move_directory_tree, move_sub_directory_tree};
pub use report::{
    FailureRun, ReportCopyTree, ReportDelete, ReportDirectory, ReportExecute, ReportFind,
    ReportMove, ReportRun, ResultRun,
};
pub use select::{SpecSelectionMatcher, matches};
pub use spec::{
    DirTreeError, EnumFileOperation, EnumSelectCombineMode, EnumTreeOperation,
    SpecFileTypeFilters, SpecItemError, SpecSelectionCriteria, SpecTreeOptions,
};
pub use status::EnumErrorStatus;
pub use traverse::{EngineDirTree, SpecWalkState, TraitTreeVisitor};
