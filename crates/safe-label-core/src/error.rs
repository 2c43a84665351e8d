use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("No backup present at {}; refusing to merge into an unprotected store", .0.display())]
    NoBackupPresent(PathBuf),

    #[error("Backup already exists at {}; existing backups are never modified", .0.display())]
    BackupExists(PathBuf),
}

/// A single file that could not be copied during staging or merging.
///
/// Recorded against the image name and never aborts the surrounding operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCopy {
    pub name: String,
    pub reason: String,
}

impl FailedCopy {
    pub fn new(name: impl Into<String>, err: &std::io::Error) -> Self {
        Self {
            name: name.into(),
            reason: err.to_string(),
        }
    }
}
