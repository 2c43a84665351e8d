use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::error::{Error, FailedCopy};
use crate::inventory::{FileNaming, Inventory};
use crate::progress::ProgressReporter;

/// How a staging request compared to the work that was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Nothing remained; the staging directory is empty.
    Exhausted,
    /// Fewer images remained than the requested capacity; all of them were staged.
    Partial,
    Full,
}

#[derive(Debug, Clone)]
pub struct StagedBatch {
    /// Names copied into the staging directory, in selection order.
    pub staged: Vec<String>,
    pub failed: Vec<FailedCopy>,
    /// Unannotated images at the time of the request.
    pub remaining_total: usize,
    pub capacity: usize,
}

impl StagedBatch {
    pub fn count(&self) -> usize {
        self.staged.len()
    }

    pub fn selected(&self) -> usize {
        self.staged.len() + self.failed.len()
    }

    pub fn status(&self) -> BatchStatus {
        if self.remaining_total == 0 {
            BatchStatus::Exhausted
        } else if self.remaining_total < self.capacity {
            BatchStatus::Partial
        } else {
            BatchStatus::Full
        }
    }
}

/// Replace the contents of `staging_dir` with the next `capacity` unannotated images.
///
/// Selection is the first `capacity` remaining names in sorted order, so repeated
/// calls against unchanged directories stage the same batch. Whatever was in
/// `staging_dir` before, including leftovers from an interrupted run, is removed.
pub fn prepare_batch(
    images_dir: &Path,
    annotations_dir: &Path,
    staging_dir: &Path,
    capacity: usize,
    naming: &FileNaming,
    reporter: &dyn ProgressReporter,
) -> Result<StagedBatch, Error> {
    let inventory = Inventory::scan(images_dir, annotations_dir, naming)?;
    let remaining_total = inventory.remaining.len();
    let selected: Vec<&String> = inventory.remaining.iter().take(capacity).collect();
    info!(
        "Staging {} of {} unannotated images (capacity {})",
        selected.len(),
        remaining_total,
        capacity
    );

    reset_dir(staging_dir)?;

    let start = Instant::now();
    reporter.on_stage_start(selected.len());

    let mut staged = Vec::with_capacity(selected.len());
    let mut failed = Vec::new();

    for (index, name) in selected.iter().enumerate() {
        let source = &inventory.images[*name];
        let result = match source.file_name() {
            Some(file_name) => fs::copy(source, staging_dir.join(file_name)),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", source.display()),
            )),
        };

        match result {
            Ok(bytes) => {
                debug!("Staged {} ({} bytes)", source.display(), bytes);
                staged.push((*name).clone());
            }
            Err(e) => {
                error!("Failed to stage '{}': {}", source.display(), e);
                failed.push(FailedCopy::new(name.as_str(), &e));
            }
        }
        reporter.on_stage_progress(index + 1, selected.len());
    }

    reporter.on_stage_complete(staged.len(), failed.len(), start.elapsed().as_secs_f64());
    info!(
        "Batch staged: {} copied, {} failed into {}",
        staged.len(),
        failed.len(),
        staging_dir.display()
    );

    Ok(StagedBatch {
        staged,
        failed,
        remaining_total,
        capacity,
    })
}

/// Remove `dir` entirely, whatever state it is in, and recreate it empty.
fn reset_dir(dir: &Path) -> io::Result<()> {
    match fs::symlink_metadata(dir) {
        Ok(metadata) if metadata.is_dir() => {
            debug!("Clearing previous staging directory {}", dir.display());
            fs::remove_dir_all(dir)?;
        }
        Ok(_) => fs::remove_file(dir)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    fs::create_dir_all(dir)
}
