use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{Error, FailedCopy};
use crate::inventory::{self, FileNaming};
use crate::progress::ProgressReporter;

/// Outcome of folding a source directory into the canonical store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Newly copied into the canonical store.
    pub merged: Vec<String>,
    /// Already present in the canonical store; the canonical copy was kept.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedCopy>,
    pub source_total: usize,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.merged.is_empty() && self.failed.is_empty()
    }
}

/// What a merge would do, computed without touching the canonical store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub to_merge: Vec<String>,
    pub to_skip: Vec<String>,
}

pub fn plan_merge(
    source_dir: &Path,
    canonical_dir: &Path,
    naming: &FileNaming,
) -> Result<MergePlan, Error> {
    let source = inventory::annotation_files(source_dir, naming)?;
    let mut plan = MergePlan::default();

    for name in source.into_keys() {
        if target_path(canonical_dir, &name, naming).exists() {
            plan.to_skip.push(name);
        } else {
            plan.to_merge.push(name);
        }
    }

    Ok(plan)
}

/// The backup directory must exist before any merge touches the canonical store.
pub fn require_backup(backup_dir: &Path) -> Result<(), Error> {
    if backup_dir.is_dir() {
        Ok(())
    } else {
        Err(Error::NoBackupPresent(backup_dir.to_path_buf()))
    }
}

/// Copy annotation documents from `source_dir` into `canonical_dir`, never replacing one.
///
/// A name already present in the canonical store is skipped regardless of content or
/// age. Per-file copy failures are collected and do not stop the merge. Running it
/// again with the same source merges nothing.
pub fn merge(
    source_dir: &Path,
    canonical_dir: &Path,
    backup_dir: &Path,
    naming: &FileNaming,
    reporter: &dyn ProgressReporter,
) -> Result<MergeReport, Error> {
    require_backup(backup_dir)?;

    let source = inventory::annotation_files(source_dir, naming)?;
    let source_total = source.len();
    let mut report = MergeReport {
        source_total,
        ..MergeReport::default()
    };

    if source.is_empty() {
        info!("No annotations to merge in {}", source_dir.display());
        return Ok(report);
    }

    fs::create_dir_all(canonical_dir)?;

    let start = Instant::now();
    reporter.on_merge_start(source_total);

    for (index, (name, source_path)) in source.into_iter().enumerate() {
        let target = target_path(canonical_dir, &name, naming);

        match copy_new(&source_path, &target) {
            Ok(CopyOutcome::Copied(bytes)) => {
                debug!("Merged {} ({} bytes)", target.display(), bytes);
                report.merged.push(name);
            }
            Ok(CopyOutcome::AlreadyPresent) => {
                debug!("Skipped {}: canonical copy exists", name);
                report.skipped.push(name);
            }
            Err(e) => {
                error!("Failed to merge '{}': {}", source_path.display(), e);
                report.failed.push(FailedCopy::new(name, &e));
            }
        }
        reporter.on_merge_progress(index + 1, source_total);
    }

    reporter.on_merge_complete(
        report.merged.len(),
        report.skipped.len(),
        report.failed.len(),
        start.elapsed().as_secs_f64(),
    );
    info!(
        "Merge complete: {} merged, {} skipped, {} failed of {}",
        report.merged.len(),
        report.skipped.len(),
        report.failed.len(),
        source_total
    );

    Ok(report)
}

fn target_path(canonical_dir: &Path, name: &str, naming: &FileNaming) -> PathBuf {
    canonical_dir.join(naming.annotation_file_name(name))
}

enum CopyOutcome {
    Copied(u64),
    AlreadyPresent,
}

/// Copy `source` to `target` only if `target` does not exist yet.
///
/// The existence check and creation are one `create_new` open, so a target that
/// appears concurrently is never overwritten. A partially written target is removed.
fn copy_new(source: &Path, target: &Path) -> io::Result<CopyOutcome> {
    let mut reader = File::open(source)?;

    let mut writer = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Ok(CopyOutcome::AlreadyPresent)
        }
        Err(e) => return Err(e),
    };

    let copied = io::copy(&mut reader, &mut writer).and_then(|bytes| {
        writer.sync_all()?;
        Ok(bytes)
    });

    match copied {
        Ok(bytes) => Ok(CopyOutcome::Copied(bytes)),
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(target) {
                warn!(
                    "Could not remove partial copy {}: {}",
                    target.display(),
                    cleanup
                );
            }
            Err(e)
        }
    }
}
