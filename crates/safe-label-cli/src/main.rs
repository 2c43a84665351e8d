mod commands;
mod logging;
mod progress;
mod signal;

use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use safe_label_core::{AnnotationEngine, AppConfig, BatchStatus, FailedCopy};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let args = Cli::parse();

    let _guard = logging::init_logger(&logging::LogSettings::from_env(), args.verbose);

    if let Err(err) = run(args) {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(args: Cli) -> Result<()> {
    let Some(command) = args.command else {
        Cli::command().print_long_help()?;
        return Ok(());
    };

    let config = AppConfig::load(args.config.as_deref()).context("Error loading configuration")?;
    let engine = AnnotationEngine::new(config)?;

    match command {
        Commands::Status => run_status(&engine),
        Commands::Remaining { limit } => run_remaining(&engine, limit),
        Commands::Stage { capacity } => run_stage(&engine, capacity),
        Commands::Monitor { interval } => run_monitor(&engine, interval),
        Commands::Backup => run_backup(&engine),
        Commands::Merge { dry_run, yes } => run_merge(&engine, dry_run, yes),
        Commands::Stats { last } => run_stats(&engine, last),
        Commands::ExportSummary { output } => run_export_summary(&engine, output.as_deref()),
        Commands::Inspect { name } => run_inspect(&engine, &name),
        Commands::PrintConfig => {
            println!("Configuration: {:#?}", engine.config());
            Ok(())
        }
    }
}

fn run_status(engine: &AnnotationEngine) -> Result<()> {
    let status = engine.status().context("Error scanning annotation stores")?;
    let config = engine.config();

    println!("{}", "Annotation status".bold());
    println!("  Total images:        {:>6}", status.total_images);
    println!(
        "  Annotated:           {:>6} ({:.1}%)",
        format!("{}", status.annotated).green(),
        status.progress_percent()
    );
    println!("  Remaining:           {:>6}", format!("{}", status.remaining).yellow());
    println!("  Backed up:           {:>6}", format!("{}", status.backed_up).cyan());
    println!("  Staged for labeling: {:>6}", status.staged);
    println!("  Awaiting merge:      {:>6}", status.pending_output);

    if !config.backup_dir.is_dir() {
        println!(
            "  {} no backup at {}; run `safe-label backup` before merging",
            "!".red(),
            config.backup_dir.display()
        );
    }

    if status.remaining > 0 {
        let est = status.estimates();
        println!("{}", "Time estimates".bold());
        println!("  Manual (1 img/min):     {:.1} hours", est.manual_hours);
        println!("  Semi-auto (5 img/min):  {:.1} hours", est.semi_auto_hours);
        println!("  Auto (30 img/min):      {:.1} hours", est.auto_hours);
    } else {
        println!("{} All images have been annotated", "✓".green());
    }

    Ok(())
}

fn run_remaining(engine: &AnnotationEngine, limit: Option<usize>) -> Result<()> {
    let remaining = engine
        .remaining_files()
        .context("Error scanning annotation stores")?;
    let shown = limit.unwrap_or(remaining.len()).min(remaining.len());

    for name in &remaining[..shown] {
        println!("{}", name);
    }
    if shown < remaining.len() {
        println!("... and {} more", remaining.len() - shown);
    }
    info!("{} images remaining", remaining.len());
    Ok(())
}

fn run_stage(engine: &AnnotationEngine, capacity: Option<usize>) -> Result<()> {
    let reporter = CliReporter::new();
    let batch = engine
        .stage(capacity, &reporter)
        .context("Error staging batch")?;

    match batch.status() {
        BatchStatus::Exhausted => {
            info!("{}", "Nothing left to annotate; staging directory is empty".green());
            return Ok(());
        }
        BatchStatus::Partial => info!(
            "Only {} images remained (capacity {}); staged all of them",
            batch.remaining_total, batch.capacity
        ),
        BatchStatus::Full => {}
    }

    info!(
        "selected {}, copied {}, skipped 0, failed {}",
        batch.selected(),
        format!("{}", batch.count()).green(),
        format!("{}", batch.failed.len()).red(),
    );
    report_failures(&batch.failed);
    info!(
        "Open {} in the labeling tool and write output to {}",
        engine.config().staging_dir.display(),
        engine.config().output_dir.display()
    );
    Ok(())
}

fn run_monitor(engine: &AnnotationEngine, interval: Option<u64>) -> Result<()> {
    let monitor = engine.monitor(interval.map(Duration::from_secs))?;
    let cancel = signal::cancel_on_ctrl_c();
    let reporter = CliReporter::new();

    eprintln!("Monitoring annotation progress. Press Ctrl+C to stop.");
    let last = monitor
        .run(&cancel, &reporter)
        .context("Error while monitoring")?;
    drop(reporter);

    println!("{}", last);
    info!("{}", "Monitoring stopped".green());
    Ok(())
}

fn run_backup(engine: &AnnotationEngine) -> Result<()> {
    let copied = engine.backup().context("Error taking backup")?;
    info!(
        "{} annotations frozen in {}",
        format!("{}", copied).cyan(),
        engine.config().backup_dir.display()
    );
    Ok(())
}

fn run_merge(engine: &AnnotationEngine, dry_run: bool, yes: bool) -> Result<()> {
    let plan = engine.plan_merge().context("Error planning merge")?;

    if !dry_run {
        engine
            .require_backup()
            .context("Merge refused; run `safe-label backup` first")?;
    }

    if plan.to_merge.is_empty() {
        info!(
            "No new annotations to merge ({} already present)",
            plan.to_skip.len()
        );
        if dry_run {
            return Ok(());
        }
    }

    info!(
        "{} to merge, {} already in the canonical store",
        format!("{}", plan.to_merge.len()).green(),
        format!("{}", plan.to_skip.len()).yellow(),
    );

    if dry_run {
        for name in &plan.to_merge {
            println!("merge {}", name);
        }
        for name in &plan.to_skip {
            println!("skip  {}", name);
        }
        return Ok(());
    }

    if !yes
        && !plan.to_merge.is_empty()
        && !prompt_confirm("Merge these annotations into the canonical store?", Some(false))?
    {
        info!("Merge cancelled");
        return Ok(());
    }

    let reporter = CliReporter::new();
    let report = engine.merge(&reporter).context("Merge refused")?;

    for name in &report.merged {
        info!("Copied: {}", engine.naming().annotation_file_name(name));
    }
    info!(
        "selected {}, copied {}, skipped {}, failed {}",
        report.source_total,
        format!("{}", report.merged.len()).green(),
        format!("{}", report.skipped.len()).yellow(),
        format!("{}", report.failed.len()).red(),
    );
    report_failures(&report.failed);
    Ok(())
}

fn run_stats(engine: &AnnotationEngine, last: usize) -> Result<()> {
    let latest = engine
        .latest_annotations(last)
        .context("Error scanning annotation store")?;
    println!("Last {} annotated files:", latest.len());
    for name in latest {
        println!("  - {}", engine.naming().annotation_file_name(&name));
    }
    Ok(())
}

fn run_export_summary(engine: &AnnotationEngine, output: Option<&Path>) -> Result<()> {
    let (path, summary) = engine
        .export_summary(output)
        .context("Error exporting summary")?;
    info!(
        "Summary exported to {} ({} of {} annotated)",
        path.display(),
        summary.annotated,
        summary.total_images
    );
    Ok(())
}

fn run_inspect(engine: &AnnotationEngine, name: &str) -> Result<()> {
    let (path, doc) = engine
        .load_document(name)
        .with_context(|| format!("Error loading annotation '{}'", name))?;

    println!("{}", path.display().to_string().bold());
    println!("Image: {}", doc.image_id);
    println!("Source: {} at {}", doc.source, doc.timestamp);
    println!("BBox: {:?}", doc.bbox);
    println!(
        "Keypoints: {} ({} visible)",
        doc.keypoints.len(),
        doc.visible_count()
    );
    for kp in doc.keypoints.iter().take(3) {
        println!("  - {}: ({}, {}) visible={}", kp.name, kp.x, kp.y, kp.visible);
    }
    if !doc.follows_vocabulary() {
        warn!("Keypoints do not follow the standard landmark order");
    }
    Ok(())
}

fn report_failures(failed: &[FailedCopy]) {
    for failure in failed {
        warn!("{}: {}", failure.name.red(), failure.reason);
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
