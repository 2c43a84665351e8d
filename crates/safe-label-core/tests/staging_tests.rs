use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use safe_label_core::inventory::FileNaming;
use safe_label_core::staging::{prepare_batch, BatchStatus};
use safe_label_core::{ProgressReporter, SilentReporter};

fn naming() -> FileNaming {
    FileNaming::new(&["*.jpg".to_string()], "_keypoints.json").unwrap()
}

fn touch(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), format!("bytes of {}", name)).unwrap();
    }
}

fn dir_contents(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

struct Layout {
    _tmp: tempfile::TempDir,
    images: std::path::PathBuf,
    annotations: std::path::PathBuf,
    staging: std::path::PathBuf,
}

fn layout() -> Layout {
    let tmp = tempdir().unwrap();
    Layout {
        images: tmp.path().join("images"),
        annotations: tmp.path().join("annotations"),
        staging: tmp.path().join("workspace/current_batch"),
        _tmp: tmp,
    }
}

#[test]
fn test_stages_first_names_in_order() {
    let l = layout();
    touch(&l.images, &["d.jpg", "a.jpg", "c.jpg", "b.jpg"]);
    touch(&l.annotations, &["a_keypoints.json"]);

    let batch = prepare_batch(&l.images, &l.annotations, &l.staging, 2, &naming(), &SilentReporter)
        .unwrap();

    assert_eq!(batch.staged, vec!["b", "c"]);
    assert_eq!(batch.count(), 2);
    assert_eq!(batch.remaining_total, 3);
    assert_eq!(batch.status(), BatchStatus::Full);
    assert_eq!(
        dir_contents(&l.staging),
        ["b.jpg", "c.jpg"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
    );
    assert_eq!(
        fs::read(l.staging.join("b.jpg")).unwrap(),
        fs::read(l.images.join("b.jpg")).unwrap()
    );
}

#[test]
fn test_selection_is_deterministic() {
    let l = layout();
    touch(&l.images, &["x.jpg", "m.jpg", "q.jpg", "a.jpg", "k.jpg"]);

    let first = prepare_batch(&l.images, &l.annotations, &l.staging, 3, &naming(), &SilentReporter)
        .unwrap();
    let second = prepare_batch(&l.images, &l.annotations, &l.staging, 3, &naming(), &SilentReporter)
        .unwrap();

    assert_eq!(first.staged, vec!["a", "k", "m"]);
    assert_eq!(first.staged, second.staged);
}

#[test]
fn test_capacity_beyond_remaining_stages_all() {
    let l = layout();
    touch(&l.images, &["a.jpg", "b.jpg"]);

    let batch = prepare_batch(&l.images, &l.annotations, &l.staging, 50, &naming(), &SilentReporter)
        .unwrap();

    assert_eq!(batch.staged, vec!["a", "b"]);
    assert_eq!(batch.status(), BatchStatus::Partial);
    assert!(batch.failed.is_empty());
}

#[test]
fn test_nothing_remaining_is_exhausted() {
    let l = layout();
    touch(&l.images, &["a.jpg"]);
    touch(&l.annotations, &["a_keypoints.json"]);
    touch(&l.staging, &["old.jpg"]);

    let batch = prepare_batch(&l.images, &l.annotations, &l.staging, 10, &naming(), &SilentReporter)
        .unwrap();

    assert_eq!(batch.count(), 0);
    assert_eq!(batch.status(), BatchStatus::Exhausted);
    assert!(l.staging.is_dir());
    assert!(dir_contents(&l.staging).is_empty());
}

#[test]
fn test_restaging_replaces_previous_batch() {
    let l = layout();
    touch(&l.images, &["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);

    prepare_batch(&l.images, &l.annotations, &l.staging, 2, &naming(), &SilentReporter).unwrap();
    assert_eq!(dir_contents(&l.staging).len(), 2);

    // The tool annotated the first batch and left scratch files behind.
    touch(&l.annotations, &["a_keypoints.json", "b_keypoints.json"]);
    touch(&l.staging, &["a.jpg.tmp"]);
    fs::create_dir_all(l.staging.join("cache")).unwrap();

    let batch =
        prepare_batch(&l.images, &l.annotations, &l.staging, 2, &naming(), &SilentReporter).unwrap();

    assert_eq!(batch.staged, vec!["c", "d"]);
    assert_eq!(
        dir_contents(&l.staging),
        ["c.jpg", "d.jpg"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
    );
}

#[test]
fn test_staging_path_occupied_by_file_is_replaced() {
    let l = layout();
    touch(&l.images, &["a.jpg"]);
    fs::create_dir_all(l.staging.parent().unwrap()).unwrap();
    fs::write(&l.staging, "stray").unwrap();

    let batch = prepare_batch(&l.images, &l.annotations, &l.staging, 1, &naming(), &SilentReporter)
        .unwrap();
    assert_eq!(batch.staged, vec!["a"]);
    assert!(l.staging.is_dir());
}

/// Removes the next image from the store after each copy, as if it vanished mid-batch.
struct VanishingImage {
    victim: std::path::PathBuf,
}

impl ProgressReporter for VanishingImage {
    fn on_stage_progress(&self, copied: usize, _selected: usize) {
        if copied == 1 {
            let _ = fs::remove_file(&self.victim);
        }
    }
}

#[test]
fn test_copy_failure_is_recorded_and_batch_continues() {
    let l = layout();
    touch(&l.images, &["a.jpg", "b.jpg", "c.jpg"]);
    let reporter = VanishingImage {
        victim: l.images.join("b.jpg"),
    };

    let batch = prepare_batch(&l.images, &l.annotations, &l.staging, 3, &naming(), &reporter)
        .unwrap();

    assert_eq!(batch.staged, vec!["a", "c"]);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].name, "b");
    assert_eq!(batch.selected(), 3);
    assert!(!l.staging.join("b.jpg").exists());
}
