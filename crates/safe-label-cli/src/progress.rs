use indicatif::{ProgressBar, ProgressStyle};
use safe_label_core::{MonitorSnapshot, ProgressReporter};
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Stage / merge: progress bar over the selected files
/// - Monitor: bar over the staged batch, position = annotations written so far
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }

    fn file_bar(label: &str, total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(&format!(
                "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} files",
                label
            ))
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

impl ProgressReporter for CliReporter {
    fn on_stage_start(&self, selected: usize) {
        self.set_bar(Self::file_bar("Staging", selected));
    }

    fn on_stage_progress(&self, copied: usize, _selected: usize) {
        self.with_bar(|pb| pb.set_position(copied as u64));
    }

    fn on_stage_complete(&self, copied: usize, failed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Staging complete: {} copied, {} failed in {:.2}s",
            copied, failed, duration_secs
        );
    }

    fn on_merge_start(&self, source_total: usize) {
        self.set_bar(Self::file_bar("Merging", source_total));
    }

    fn on_merge_progress(&self, processed: usize, _source_total: usize) {
        self.with_bar(|pb| pb.set_position(processed as u64));
    }

    fn on_merge_complete(&self, merged: usize, skipped: usize, failed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Merge complete: {} merged, {} skipped, {} failed in {:.2}s",
            merged, skipped, failed, duration_secs
        );
    }

    fn on_monitor_tick(&self, snapshot: &MonitorSnapshot) {
        let mut guard = self.bar.lock().unwrap();
        let pb = guard.get_or_insert_with(|| {
            let pb = ProgressBar::new(snapshot.staged_count as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "  {spinner:.cyan} Batch [{bar:30.green/dim}] {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("━╸─")
                .tick_chars(TICK_CHARS),
            );
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        });

        if pb.length() != Some(snapshot.staged_count as u64) {
            pb.set_length(snapshot.staged_count as u64);
        }
        pb.set_position(snapshot.output_count as u64);
        pb.set_message(format!(
            "| {} | {} new | {:.1}/min",
            snapshot.taken_at.format("%H:%M:%S"),
            snapshot.new_since_start,
            snapshot.rate_per_minute()
        ));
    }
}

impl Drop for CliReporter {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}
