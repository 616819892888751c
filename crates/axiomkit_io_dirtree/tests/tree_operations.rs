use std::io;
use std::path::Path;

use axiomkit_io_dirtree::{
    DirTreeError, EngineDirTree, EnumFileOperation, FileCopierNative, FsNative,
    SpecSelectionCriteria, SpecTreeOptions, TraitFileCopier, copy_directory_tree,
    delete_directory_tree_files, delete_files_by_name_pattern, execute_directory_tree_ops,
    find_directory_tree_files, move_directory_tree,
};

struct CopierRejectingSuffix(&'static str);

impl TraitFileCopier for CopierRejectingSuffix {
    fn copy_file(&self, path_src: &Path, path_dst: &Path) -> io::Result<()> {
        if path_src.to_string_lossy().ends_with(self.0) {
            return Err(io::Error::other("rejected by test copier"));
        }
        FileCopierNative.copy_file(path_src, path_dst)
    }
}

fn write_text(path: &Path, txt: &str) {
    if let Some(path_parent) = path.parent() {
        std::fs::create_dir_all(path_parent).expect("create parent");
    }
    std::fs::write(path, txt).expect("write file");
}

fn txt_options() -> SpecTreeOptions {
    SpecTreeOptions {
        spec_select: SpecSelectionCriteria::with_patterns(["*.txt"]),
        ..SpecTreeOptions::default()
    }
}

#[test]
fn find_txt_files_in_small_tree() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_root = tmp.path().join("root");
    write_text(&path_root.join("a.txt"), "a");
    write_text(&path_root.join("b.log"), "b");
    write_text(&path_root.join("sub/c.txt"), "c");

    let run = find_directory_tree_files(&path_root, txt_options()).expect("find");
    let mut l_matched: Vec<String> = run
        .stats
        .files
        .iter()
        .map(|f| {
            f.path
                .strip_prefix(&path_root)
                .expect("under root")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    l_matched.sort();

    assert_eq!(l_matched, vec!["a.txt".to_string(), "sub/c.txt".to_string()]);
    assert_eq!(run.stats.total_files_processed, 3);
    assert_eq!(run.stats.total_dirs_scanned, 2);
    assert!(run.is_clean());
}

#[test]
fn delete_tmp_files_by_pattern() {
    let tmp = tempfile::tempdir().expect("tempdir");
    for c_name in ["x.tmp", "y.tmp", "z.log"] {
        write_text(&tmp.path().join(c_name), c_name);
    }

    let run = delete_files_by_name_pattern(tmp.path(), "*.tmp").expect("delete");
    assert_eq!(run.stats.files_deleted, 2);
    assert_eq!(run.stats.files_remaining, 1);
    assert_eq!(run.stats.total_files_processed, 3);
    assert!(tmp.path().join("z.log").is_file());
    assert!(!tmp.path().join("x.tmp").exists());
}

#[test]
fn copy_then_find_matches_source_minus_failures() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_src = tmp.path().join("src");
    let path_dst = tmp.path().join("dst");
    for c_rel in ["a.txt", "b.txt", "skip.log", "one/c.txt", "one/two/d.txt", "one/two/bad.txt"] {
        write_text(&path_src.join(c_rel), c_rel);
    }

    let run_src = find_directory_tree_files(&path_src, txt_options()).expect("find src");
    assert_eq!(run_src.stats.files_matched, 5);

    let copier = CopierRejectingSuffix("bad.txt");
    let engine = EngineDirTree::new(&FsNative, &copier);
    let run_copy = engine
        .copy_directory_tree(&path_src, &path_dst, txt_options())
        .expect("copy");
    assert_eq!(run_copy.error_count(), 1);
    assert_eq!(run_copy.stats.files_copied, 4);

    let run_dst = find_directory_tree_files(&path_dst, txt_options()).expect("find dst");
    assert_eq!(
        run_dst.stats.files_matched,
        run_src.stats.files_matched - run_copy.error_count() as u64
    );
}

#[test]
fn move_never_deletes_source_after_incomplete_copy() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_src = tmp.path().join("src");
    let path_dst = tmp.path().join("dst");
    write_text(&path_src.join("keep/a.dat"), "a");
    write_text(&path_src.join("keep/b.lock"), "b");

    let copier = CopierRejectingSuffix(".lock");
    let engine = EngineDirTree::new(&FsNative, &copier);
    let failure = engine
        .move_directory_tree(&path_src, &path_dst, SpecTreeOptions::default())
        .expect_err("incomplete copy");

    assert!(matches!(failure.error, DirTreeError::CopyPhaseIncomplete { .. }));
    assert!(path_src.join("keep/a.dat").is_file());
    assert!(path_src.join("keep/b.lock").is_file());
    assert_eq!(failure.partial.stats.source_files_moved, 0);
}

#[test]
fn move_with_native_collaborators_completes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_src = tmp.path().join("src");
    let path_dst = tmp.path().join("dst");
    write_text(&path_src.join("a/b/c.bin"), "c");

    let run = move_directory_tree(&path_src, &path_dst, SpecTreeOptions::default())
        .expect("move");
    assert!(run.stats.if_source_dir_deleted);
    assert!(path_dst.join("a/b/c.bin").is_file());
}

#[test]
fn skip_top_without_recursion_is_rejected_everywhere() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_text(&tmp.path().join("a.txt"), "a");
    let spec_options = SpecTreeOptions {
        if_skip_top_level_dir: true,
        if_scan_sub_dirs: false,
        ..SpecTreeOptions::default()
    };

    let failure = find_directory_tree_files(tmp.path(), spec_options.clone()).expect_err("find");
    assert!(failure.error.is_configuration());
    let failure =
        delete_directory_tree_files(tmp.path(), spec_options.clone()).expect_err("delete");
    assert!(failure.error.is_configuration());
    let failure = copy_directory_tree(tmp.path(), tmp.path().with_extension("out"), spec_options)
        .expect_err("copy");
    assert!(failure.error.is_configuration());
    assert!(tmp.path().join("a.txt").is_file());
}

#[test]
fn non_recursive_find_never_enqueues_descendants() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_text(&tmp.path().join("a.txt"), "a");
    write_text(&tmp.path().join("sub/b.txt"), "b");
    write_text(&tmp.path().join("sub/deeper/c.txt"), "c");

    let spec_options = SpecTreeOptions {
        if_scan_sub_dirs: false,
        ..SpecTreeOptions::default()
    };
    let run = find_directory_tree_files(tmp.path(), spec_options).expect("find");
    assert_eq!(run.stats.files_matched, 1);
    assert_eq!(run.stats.total_dirs_scanned, 1);
    assert_eq!(run.stats.dirs.len(), 1);
    assert_eq!(run.stats.total_sub_dirs, 1);
}

#[test]
fn execute_copy_then_find_in_target_then_clear_target() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_src = tmp.path().join("src");
    let path_dst = tmp.path().join("dst");
    write_text(&path_src.join("a.txt"), "a");
    write_text(&path_src.join("keep.log"), "k");
    write_text(&path_src.join("x/y/b.txt"), "bb");

    let run = execute_directory_tree_ops(
        &path_src,
        &path_dst,
        SpecSelectionCriteria::with_patterns(["*.txt"]),
        &[EnumFileOperation::CopyByStreamThenHardLink],
    )
    .expect("copy ops");
    assert_eq!(run.stats.files_selected, 2);
    assert_eq!(run.stats.file_bytes_selected, 3);
    assert_eq!(run.stats.operations_applied, 2);

    let found = find_directory_tree_files(&path_dst, SpecTreeOptions::default()).expect("find");
    assert_eq!(found.stats.files_matched, 2);

    let run = execute_directory_tree_ops(
        &path_src,
        &path_dst,
        SpecSelectionCriteria::default(),
        &[EnumFileOperation::DeleteDestinationFile],
    )
    .expect("delete ops");
    assert_eq!(run.stats.operations_applied, 3);
    assert!(run.is_clean());
    assert!(!path_dst.join("x/y/b.txt").exists());
    assert!(path_src.join("x/y/b.txt").exists());
}
