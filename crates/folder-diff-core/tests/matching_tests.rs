use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

use folder_diff_core::{compute_missing, snapshot, MatchOptions, ScannedTree, SilentReporter};

/// Builds a folder from `(relative path, contents)` pairs.
fn build_tree(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, contents) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn missing_paths(source: &Path, dest: &Path, options: MatchOptions) -> Vec<PathBuf> {
    let source = ScannedTree::open(source).unwrap();
    let dest = ScannedTree::open(dest).unwrap();
    let result = compute_missing(&source, &dest, options, &SilentReporter).unwrap();
    result
        .missing
        .iter()
        .map(|f| f.relative_path().to_path_buf())
        .collect()
}

const SIZE_ONLY: MatchOptions = MatchOptions {
    use_checksum: false,
    strict_renames: false,
};
const WITH_CRC: MatchOptions = MatchOptions {
    use_checksum: true,
    strict_renames: false,
};
const STRICT: MatchOptions = MatchOptions {
    use_checksum: true,
    strict_renames: true,
};

#[test]
fn test_same_file_same_path() {
    let source = build_tree(&[("a.jpg", &[1u8; 100])]);
    let dest = build_tree(&[("a.jpg", &[1u8; 100])]);

    assert!(missing_paths(source.path(), dest.path(), SIZE_ONLY).is_empty());
    assert!(missing_paths(source.path(), dest.path(), WITH_CRC).is_empty());
}

#[test]
fn test_size_mismatch_recovered_as_rename() {
    let source = build_tree(&[("a.jpg", &[1u8; 100])]);
    let dest = build_tree(&[("a.jpg", &[1u8; 50]), ("b.jpg", &[2u8; 100])]);

    let s = ScannedTree::open(source.path()).unwrap();
    let d = ScannedTree::open(dest.path()).unwrap();
    let result = compute_missing(&s, &d, SIZE_ONLY, &SilentReporter).unwrap();

    assert!(result.all_found());
    assert_eq!(result.renamed.len(), 1);
    assert_eq!(
        result.renamed[0].destination.relative_path(),
        Path::new("b.jpg")
    );
}

/// The rename search compares sizes only unless strict renames are asked
/// for, so a CRC mismatch at the same path is still resolved by it.
#[test]
fn test_checksum_mismatch_still_resolved_by_rename_search() {
    let source = build_tree(&[("a.jpg", &[1u8; 100])]);
    let dest = build_tree(&[("a.jpg", &[2u8; 100])]);

    assert!(missing_paths(source.path(), dest.path(), WITH_CRC).is_empty());
    assert_eq!(
        missing_paths(source.path(), dest.path(), STRICT),
        vec![PathBuf::from("a.jpg")]
    );
}

#[test]
fn test_unmatched_file_is_missing_with_absolute_path() {
    let source = build_tree(&[("a.jpg", &[1u8; 10]), ("c.jpg", &[3u8; 30])]);
    let dest = build_tree(&[("a.jpg", &[1u8; 10])]);

    let s = ScannedTree::open(source.path()).unwrap();
    let d = ScannedTree::open(dest.path()).unwrap();
    let result = compute_missing(&s, &d, SIZE_ONLY, &SilentReporter).unwrap();

    assert_eq!(result.total_scanned, 2);
    assert_eq!(result.missing.len(), 1);
    assert_eq!(
        result.missing[0].absolute_path().unwrap(),
        source.path().join("c.jpg")
    );
}

#[test]
fn test_moved_and_recased_files() {
    let source = build_tree(&[
        ("2020/Trip/IMG_1.JPG", &[1u8; 11]),
        ("2020/Trip/IMG_2.JPG", &[2u8; 22]),
    ]);
    let dest = build_tree(&[
        ("2020/trip/img_1.jpg", &[1u8; 11]),
        ("sorted/beach.jpg", &[2u8; 22]),
    ]);

    let s = ScannedTree::open(source.path()).unwrap();
    let d = ScannedTree::open(dest.path()).unwrap();
    let result = compute_missing(&s, &d, WITH_CRC, &SilentReporter).unwrap();

    assert!(result.all_found());
    // Only the moved file needed the rename search.
    assert_eq!(result.renamed.len(), 1);
    assert_eq!(
        result.renamed[0].source.relative_path(),
        Path::new("2020/Trip/IMG_2.JPG")
    );
}

#[test]
fn test_missing_keeps_source_order() {
    let source = build_tree(&[
        ("a/1.jpg", &[1u8; 1]),
        ("a/2.jpg", &[2u8; 2]),
        ("b/3.jpg", &[3u8; 3]),
        ("c/4.jpg", &[4u8; 4]),
    ]);
    let dest = build_tree(&[("x.jpg", &[2u8; 2])]);

    assert_eq!(
        missing_paths(source.path(), dest.path(), SIZE_ONLY),
        vec![
            PathBuf::from("a/1.jpg"),
            PathBuf::from("b/3.jpg"),
            PathBuf::from("c/4.jpg"),
        ]
    );
}

#[test]
fn test_first_destination_match_wins() {
    let source = build_tree(&[("new.jpg", &[1u8; 5])]);
    let dest = build_tree(&[("b.jpg", &[2u8; 5]), ("a.jpg", &[3u8; 5])]);

    let s = ScannedTree::open(source.path()).unwrap();
    let d = ScannedTree::open(dest.path()).unwrap();
    let result = compute_missing(&s, &d, SIZE_ONLY, &SilentReporter).unwrap();

    assert_eq!(
        result.renamed[0].destination.relative_path(),
        Path::new("a.jpg")
    );
}

#[test]
fn test_empty_trees() {
    let source = build_tree(&[]);
    let dest = build_tree(&[("a.jpg", b"x")]);

    assert!(missing_paths(source.path(), dest.path(), SIZE_ONLY).is_empty());
    assert_eq!(
        missing_paths(dest.path(), source.path(), SIZE_ONLY),
        vec![PathBuf::from("a.jpg")]
    );
}

#[test]
fn test_compare_against_snapshot_after_media_removed() {
    let source = build_tree(&[("a.jpg", &[1u8; 10]), ("b.jpg", &[2u8; 20])]);
    let card = build_tree(&[("DCIM/A.JPG", &[1u8; 10])]);
    let snap_dir = tempdir().unwrap();
    let snap_path = snap_dir.path().join("card.ifd");

    let card_tree = ScannedTree::open(card.path()).unwrap();
    snapshot::save(&card_tree, &snap_path).unwrap();
    drop(card);

    let s = ScannedTree::open(source.path()).unwrap();
    let d = ScannedTree::open(&snap_path).unwrap();
    let result = compute_missing(&s, &d, WITH_CRC, &SilentReporter).unwrap();

    let missing: Vec<_> = result.missing.iter().map(|f| f.relative_path()).collect();
    assert_eq!(missing, vec![Path::new("b.jpg")]);
    assert_eq!(
        result.renamed[0].destination.display_path(),
        Path::new("DCIM/A.JPG")
    );
}

#[test]
fn test_vanished_source_file_aborts() {
    let source = build_tree(&[("a.jpg", &[1u8; 10])]);
    let dest = build_tree(&[("a.jpg", &[1u8; 10])]);

    let s = ScannedTree::open(source.path()).unwrap();
    let d = ScannedTree::open(dest.path()).unwrap();
    s.scan(false).unwrap();
    fs::remove_file(source.path().join("a.jpg")).unwrap();

    let err = compute_missing(&s, &d, SIZE_ONLY, &SilentReporter).unwrap_err();
    assert!(matches!(err, folder_diff_core::Error::NotFound(_)));
}

#[test]
fn test_same_path_checks_every_colliding_destination_file() {
    let source = build_tree(&[("a.jpg", &[4u8; 100])]);
    let dest = build_tree(&[("A.JPG", &[4u8; 50]), ("a.jpg", &[4u8; 100])]);
    if fs::read_dir(dest.path()).unwrap().count() < 2 {
        // Case-insensitive filesystem: both names are the same file.
        return;
    }

    let s = ScannedTree::open(source.path()).unwrap();
    let d = ScannedTree::open(dest.path()).unwrap();
    assert_eq!(d.files_at_normalized_path("a.jpg").unwrap().len(), 2);

    let result = compute_missing(&s, &d, STRICT, &SilentReporter).unwrap();
    assert!(result.all_found());
    assert!(result.renamed.is_empty());
}

#[test]
fn test_first_failure_in_source_order_is_reported() {
    let source = build_tree(&[
        ("a.jpg", &[1u8; 10]),
        ("b.jpg", &[2u8; 10]),
        ("c.jpg", &[3u8; 10]),
    ]);
    let dest = build_tree(&[("z.jpg", &[9u8; 10])]);

    let s = ScannedTree::open(source.path()).unwrap();
    let d = ScannedTree::open(dest.path()).unwrap();
    s.scan(false).unwrap();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        fs::remove_file(source.path().join(name)).unwrap();
    }

    for _ in 0..8 {
        let err = compute_missing(&s, &d, SIZE_ONLY, &SilentReporter).unwrap_err();
        match err {
            folder_diff_core::Error::NotFound(path) => {
                assert_eq!(path, source.path().join("a.jpg"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
