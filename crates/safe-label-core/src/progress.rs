use crate::monitor::MonitorSnapshot;

/// Trait for reporting staging, merge and monitor progress.
///
/// The CLI implements it with indicatif bars. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_stage_start(&self, _selected: usize) {}
    fn on_stage_progress(&self, _copied: usize, _selected: usize) {}
    fn on_stage_complete(&self, _copied: usize, _failed: usize, _duration_secs: f64) {}
    fn on_merge_start(&self, _source_total: usize) {}
    fn on_merge_progress(&self, _processed: usize, _source_total: usize) {}
    fn on_merge_complete(&self, _merged: usize, _skipped: usize, _failed: usize, _duration_secs: f64) {}
    fn on_monitor_tick(&self, _snapshot: &MonitorSnapshot) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
