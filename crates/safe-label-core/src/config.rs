use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::Error;

/// Every directory and tunable the workflow touches.
///
/// Components never read paths from anywhere else; the engine hands these
/// values to each operation explicitly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub image_dir: PathBuf,
    pub annotation_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub output_dir: PathBuf,
    pub summary_path: PathBuf,
    pub batch_capacity: usize,
    pub poll_interval_secs: u64,
    pub image_patterns: Vec<String>,
    pub annotation_suffix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("datasets/images"),
            annotation_dir: PathBuf::from("datasets/annotations"),
            backup_dir: PathBuf::from("datasets/annotations_backup"),
            staging_dir: PathBuf::from("workspace/current_batch"),
            output_dir: PathBuf::from("workspace/new_annotations"),
            summary_path: PathBuf::from("datasets/annotation_summary.json"),
            batch_capacity: 30,
            poll_interval_secs: 2,
            image_patterns: vec!["*.jpg".to_string()],
            annotation_suffix: "_keypoints.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load defaults, then `Config.*` (or `path`), then `SAFE_LABEL_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<AppConfig, Error> {
        let defaults = AppConfig::default();

        let file_source = match path {
            Some(p) => ConfigFile::from(p).required(true),
            None => ConfigFile::with_name("Config").required(false),
        };

        let builder = Config::builder()
            .set_default("image_dir", path_str(&defaults.image_dir))?
            .set_default("annotation_dir", path_str(&defaults.annotation_dir))?
            .set_default("backup_dir", path_str(&defaults.backup_dir))?
            .set_default("staging_dir", path_str(&defaults.staging_dir))?
            .set_default("output_dir", path_str(&defaults.output_dir))?
            .set_default("summary_path", path_str(&defaults.summary_path))?
            .set_default("batch_capacity", defaults.batch_capacity as u64)?
            .set_default("poll_interval_secs", defaults.poll_interval_secs)?
            .set_default("image_patterns", defaults.image_patterns.clone())?
            .set_default("annotation_suffix", defaults.annotation_suffix.clone())?
            .add_source(file_source)
            .add_source(
                Environment::with_prefix("SAFE_LABEL")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("image_patterns"),
            )
            .build()?;

        let config = builder.try_deserialize::<AppConfig>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.poll_interval_secs == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.image_patterns.is_empty() {
            return Err(Error::InvalidConfig(
                "image_patterns must name at least one pattern".to_string(),
            ));
        }
        for pattern in &self.image_patterns {
            glob::Pattern::new(pattern)?;
        }
        if self.annotation_suffix.is_empty() {
            return Err(Error::InvalidConfig(
                "annotation_suffix must not be empty".to_string(),
            ));
        }
        if self.batch_capacity == 0 {
            return Err(Error::InvalidConfig(
                "batch_capacity must be at least 1".to_string(),
            ));
        }
        self.check_directory_layout()
    }

    /// Reject layouts where one store's mutation would reach into another.
    ///
    /// Staging is wiped on every batch, so it may not contain any other store.
    /// The backup and the canonical store must be disjoint, and the tool's
    /// output directory must be distinct from the canonical store.
    fn check_directory_layout(&self) -> Result<(), Error> {
        let staging = absolute(&self.staging_dir);
        let protected = [
            ("image_dir", &self.image_dir),
            ("annotation_dir", &self.annotation_dir),
            ("backup_dir", &self.backup_dir),
            ("output_dir", &self.output_dir),
        ];
        for (field, dir) in protected {
            if absolute(dir).starts_with(&staging) {
                return Err(Error::InvalidConfig(format!(
                    "staging_dir {} would delete {} {} when a batch is staged",
                    self.staging_dir.display(),
                    field,
                    dir.display()
                )));
            }
        }

        let canonical = absolute(&self.annotation_dir);
        let backup = absolute(&self.backup_dir);
        if backup.starts_with(&canonical) || canonical.starts_with(&backup) {
            return Err(Error::InvalidConfig(format!(
                "backup_dir {} overlaps annotation_dir {}",
                self.backup_dir.display(),
                self.annotation_dir.display()
            )));
        }

        if absolute(&self.output_dir) == canonical {
            return Err(Error::InvalidConfig(format!(
                "output_dir and annotation_dir are both {}",
                self.annotation_dir.display()
            )));
        }

        Ok(())
    }
}

/// Lexically resolve `path` against the working directory, folding `.` and `..`.
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
