use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::backup;
use crate::config::AppConfig;
use crate::document::AnnotationDocument;
use crate::error::Error;
use crate::inventory::{self, FileNaming, Inventory};
use crate::merge::{self, MergePlan, MergeReport};
use crate::monitor::ProgressMonitor;
use crate::progress::ProgressReporter;
use crate::staging::{self, StagedBatch};
use crate::summary::{self, AnnotationSummary, StatusReport};

/// Binds one configuration to every workflow operation.
///
/// Holds no dataset state; each call scans the directories afresh.
pub struct AnnotationEngine {
    config: AppConfig,
    naming: FileNaming,
}

impl AnnotationEngine {
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        config.validate()?;
        let naming = FileNaming::from_config(&config)?;
        Ok(Self { config, naming })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn naming(&self) -> &FileNaming {
        &self.naming
    }

    pub fn inventory(&self) -> Result<Inventory, Error> {
        Ok(Inventory::scan(
            &self.config.image_dir,
            &self.config.annotation_dir,
            &self.naming,
        )?)
    }

    pub fn remaining(&self) -> Result<Vec<String>, Error> {
        Ok(inventory::remaining(
            &self.config.image_dir,
            &self.config.annotation_dir,
            &self.naming,
        )?)
    }

    /// Remaining images as file names, in name order.
    pub fn remaining_files(&self) -> Result<Vec<String>, Error> {
        Ok(self.inventory()?.remaining_file_names())
    }

    pub fn status(&self) -> Result<StatusReport, Error> {
        let inventory = self.inventory()?;
        let report = StatusReport {
            total_images: inventory.total_images(),
            annotated: inventory.annotated_images(),
            remaining: inventory.remaining.len(),
            backed_up: backup::count(&self.config.backup_dir, &self.naming)?,
            staged: inventory::scan_images(&self.config.staging_dir, &self.naming)?.len(),
            pending_output: inventory::scan_annotations(&self.config.output_dir, &self.naming)?
                .len(),
        };
        debug!("Status: {:?}", report);
        Ok(report)
    }

    /// Stage the next batch; `capacity` overrides the configured batch size.
    pub fn stage(
        &self,
        capacity: Option<usize>,
        reporter: &dyn ProgressReporter,
    ) -> Result<StagedBatch, Error> {
        let capacity = capacity.unwrap_or(self.config.batch_capacity);
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "batch capacity must be at least 1".to_string(),
            ));
        }
        staging::prepare_batch(
            &self.config.image_dir,
            &self.config.annotation_dir,
            &self.config.staging_dir,
            capacity,
            &self.naming,
            reporter,
        )
    }

    pub fn plan_merge(&self) -> Result<MergePlan, Error> {
        merge::plan_merge(
            &self.config.output_dir,
            &self.config.annotation_dir,
            &self.naming,
        )
    }

    /// Fails with `NoBackupPresent` unless the backup directory exists.
    pub fn require_backup(&self) -> Result<(), Error> {
        merge::require_backup(&self.config.backup_dir)
    }

    pub fn merge(&self, reporter: &dyn ProgressReporter) -> Result<MergeReport, Error> {
        merge::merge(
            &self.config.output_dir,
            &self.config.annotation_dir,
            &self.config.backup_dir,
            &self.naming,
            reporter,
        )
    }

    pub fn backup(&self) -> Result<usize, Error> {
        backup::snapshot(
            &self.config.annotation_dir,
            &self.config.backup_dir,
            &self.naming,
        )
    }

    /// Monitor the output directory; `interval` overrides the configured poll interval.
    pub fn monitor(&self, interval: Option<Duration>) -> Result<ProgressMonitor, Error> {
        let interval =
            interval.unwrap_or_else(|| Duration::from_secs(self.config.poll_interval_secs));
        if interval.is_zero() {
            return Err(Error::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(ProgressMonitor::new(
            self.config.output_dir.clone(),
            self.config.staging_dir.clone(),
            self.naming.clone(),
            interval,
        )?)
    }

    /// Write the summary document to `path`, or the configured summary path.
    pub fn export_summary(&self, path: Option<&Path>) -> Result<(PathBuf, AnnotationSummary), Error> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.summary_path.clone());
        let summary = AnnotationSummary::from_inventory(&self.inventory()?);
        summary::export_summary(&summary, &path)?;
        Ok((path, summary))
    }

    /// The last `n` canonical annotation names in sorted order.
    pub fn latest_annotations(&self, n: usize) -> Result<Vec<String>, Error> {
        let annotated = inventory::scan_annotations(&self.config.annotation_dir, &self.naming)?;
        let skip = annotated.len().saturating_sub(n);
        Ok(annotated.into_iter().skip(skip).collect())
    }

    /// Load the document for `name`, preferring the canonical store over tool output.
    pub fn load_document(&self, name: &str) -> Result<(PathBuf, AnnotationDocument), Error> {
        let file_name = self.naming.annotation_file_name(name);
        let candidates = [
            self.config.annotation_dir.join(&file_name),
            self.config.output_dir.join(&file_name),
        ];

        for path in candidates {
            if path.is_file() {
                info!("Loading {}", path.display());
                let document = AnnotationDocument::load(&path)?;
                return Ok((path, document));
            }
        }

        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no annotation named '{}'", name),
        )
        .into())
    }
}
