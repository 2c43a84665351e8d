use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "safe-label")]
#[command(about = "Stage, monitor and safely merge keypoint annotations", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./Config.* when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of TRACING_LEVEL
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show annotation counts across all stores
    Status,
    /// List images that still need annotation
    Remaining {
        /// Only print the first N names
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Replace the staging directory with the next batch of unannotated images
    Stage {
        /// Override the configured batch capacity
        #[arg(long)]
        capacity: Option<usize>,
    },
    /// Watch the labeling tool's output until Ctrl-C
    Monitor {
        /// Poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Snapshot the canonical annotations into the backup directory
    Backup,
    /// Merge new annotations into the canonical store without overwriting
    Merge {
        /// Show what would be merged and skipped, then stop
        #[arg(long)]
        dry_run: bool,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Show the most recent canonical annotations
    Stats {
        #[arg(long, default_value_t = 5)]
        last: usize,
    },
    /// Write the annotation summary document
    ExportSummary {
        /// Override the configured summary path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print one annotation document
    Inspect {
        /// Image name (file stem)
        name: String,
    },
    /// Print configuration values
    PrintConfig,
}
