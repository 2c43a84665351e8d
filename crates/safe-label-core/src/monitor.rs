use chrono::{DateTime, Local};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

use crate::inventory::{self, FileNaming};
use crate::progress::ProgressReporter;

const CANCEL_CHECK: Duration = Duration::from_millis(100);

/// One observation of the labeling tool's output.
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub taken_at: DateTime<Local>,
    pub output_count: usize,
    pub staged_count: usize,
    pub elapsed: Duration,
    pub new_since_start: usize,
}

impl MonitorSnapshot {
    pub fn rate_per_minute(&self) -> f64 {
        rate_per_minute(self.new_since_start, self.elapsed)
    }
}

impl fmt::Display for MonitorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | new annotations: {} | batch progress: {}/{} | rate: {:.1}/min",
            self.taken_at.format("%H:%M:%S"),
            self.output_count,
            self.output_count,
            self.staged_count,
            self.rate_per_minute()
        )
    }
}

pub fn rate_per_minute(new_items: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        new_items as f64 / (secs / 60.0)
    } else {
        0.0
    }
}

/// Polls the output and staging directories. Never writes anything.
pub struct ProgressMonitor {
    output_dir: PathBuf,
    staging_dir: PathBuf,
    naming: FileNaming,
    interval: Duration,
    started: Instant,
    initial_count: usize,
}

impl ProgressMonitor {
    pub fn new(
        output_dir: PathBuf,
        staging_dir: PathBuf,
        naming: FileNaming,
        interval: Duration,
    ) -> io::Result<Self> {
        let initial_count = inventory::scan_annotations(&output_dir, &naming)?.len();
        Ok(Self {
            output_dir,
            staging_dir,
            naming,
            interval,
            started: Instant::now(),
            initial_count,
        })
    }

    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    pub fn snapshot(&self) -> io::Result<MonitorSnapshot> {
        let output_count = inventory::scan_annotations(&self.output_dir, &self.naming)?.len();
        let staged_count = inventory::scan_images(&self.staging_dir, &self.naming)?.len();

        Ok(MonitorSnapshot {
            taken_at: Local::now(),
            output_count,
            staged_count,
            elapsed: self.started.elapsed(),
            new_since_start: output_count.saturating_sub(self.initial_count),
        })
    }

    /// Tick until `cancel` is set, then return the last snapshot taken.
    pub fn run(
        &self,
        cancel: &AtomicBool,
        reporter: &dyn ProgressReporter,
    ) -> io::Result<MonitorSnapshot> {
        info!(
            "Monitoring {} every {:?} ({} annotations at start)",
            self.output_dir.display(),
            self.interval,
            self.initial_count
        );

        loop {
            let snapshot = self.snapshot()?;
            reporter.on_monitor_tick(&snapshot);

            if wait_or_cancel(self.interval, cancel) {
                info!("Monitoring stopped: {}", snapshot);
                return Ok(snapshot);
            }
        }
    }
}

/// Sleep for `interval` in short slices. Returns true once `cancel` is set.
fn wait_or_cancel(interval: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(CANCEL_CHECK.min(deadline - now));
    }
}
