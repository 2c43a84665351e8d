use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::Error;
use crate::inventory::Inventory;

/// Annotation throughput presets, in images per minute.
pub const MANUAL_RATE: f64 = 1.0;
pub const SEMI_AUTO_RATE: f64 = 5.0;
pub const AUTO_RATE: f64 = 30.0;

/// Counts across every store the workflow touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub total_images: usize,
    pub annotated: usize,
    pub remaining: usize,
    pub backed_up: usize,
    pub staged: usize,
    pub pending_output: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimates {
    pub manual_hours: f64,
    pub semi_auto_hours: f64,
    pub auto_hours: f64,
}

impl StatusReport {
    pub fn progress_percent(&self) -> f64 {
        if self.total_images == 0 {
            return 0.0;
        }
        self.annotated as f64 / self.total_images as f64 * 100.0
    }

    pub fn estimates(&self) -> Estimates {
        let hours = |rate: f64| self.remaining as f64 / rate / 60.0;
        Estimates {
            manual_hours: hours(MANUAL_RATE),
            semi_auto_hours: hours(SEMI_AUTO_RATE),
            auto_hours: hours(AUTO_RATE),
        }
    }
}

/// Document written by `export-summary`. File lists hold image file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSummary {
    pub total_images: usize,
    pub annotated: usize,
    pub remaining: usize,
    pub annotated_files: Vec<String>,
    pub remaining_files: Vec<String>,
}

impl AnnotationSummary {
    pub fn from_inventory(inventory: &Inventory) -> Self {
        let annotated_files: Vec<String> = inventory
            .images
            .keys()
            .filter(|name| inventory.annotated.contains(*name))
            .map(|name| inventory.image_file_name(name))
            .collect();

        Self {
            total_images: inventory.total_images(),
            annotated: annotated_files.len(),
            remaining: inventory.remaining.len(),
            annotated_files,
            remaining_files: inventory.remaining_file_names(),
        }
    }
}

pub fn export_summary(summary: &AnnotationSummary, path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(
        "Summary exported to {} ({} annotated, {} remaining)",
        path.display(),
        summary.annotated,
        summary.remaining
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    #[test]
    fn test_progress_and_estimates() {
        let report = StatusReport {
            total_images: 200,
            annotated: 50,
            remaining: 150,
            ..StatusReport::default()
        };
        assert_eq!(report.progress_percent(), 25.0);
        let est = report.estimates();
        assert_eq!(est.manual_hours, 2.5);
        assert_eq!(est.semi_auto_hours, 0.5);
        assert!((est.auto_hours - 150.0 / 1800.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_dataset_has_zero_progress() {
        assert_eq!(StatusReport::default().progress_percent(), 0.0);
    }

    #[test]
    fn test_summary_excludes_orphaned_annotations() {
        let images: BTreeMap<String, PathBuf> = ["a", "b", "c"]
            .iter()
            .map(|n| (n.to_string(), PathBuf::from(format!("{}.jpg", n))))
            .collect();
        let annotated: BTreeSet<String> = ["a", "zz"].iter().map(|s| s.to_string()).collect();
        let inventory = Inventory {
            images,
            annotated,
            remaining: vec!["b".to_string(), "c".to_string()],
        };

        let summary = AnnotationSummary::from_inventory(&inventory);
        assert_eq!(summary.total_images, 3);
        assert_eq!(summary.annotated, 1);
        assert_eq!(summary.remaining, 2);
        assert_eq!(summary.annotated_files, vec!["a.jpg"]);
        assert_eq!(summary.remaining_files, vec!["b.jpg", "c.jpg"]);
        assert_eq!(inventory.orphaned(), vec!["zz"]);
    }
}
