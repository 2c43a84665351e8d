pub mod backup;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod merge;
pub mod monitor;
pub mod progress;
pub mod staging;
pub mod summary;

pub use config::AppConfig;
pub use engine::AnnotationEngine;
pub use error::{Error, FailedCopy};
pub use inventory::{FileNaming, Inventory};
pub use merge::{MergePlan, MergeReport};
pub use monitor::{MonitorSnapshot, ProgressMonitor};
pub use progress::{ProgressReporter, SilentReporter};
pub use staging::{BatchStatus, StagedBatch};
