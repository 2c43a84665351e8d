use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/safe-label.log";

/// Where and how much to log, read from `TRACING_LEVEL`, `LOG_FILE_PATH` and `LOG_ROTATION`.
///
/// `LOG_FILE_PATH=-` turns the file log off.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub filter: String,
    pub file: Option<PathBuf>,
    pub rotation: Rotation,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let filter = var("TRACING_LEVEL").unwrap_or_else(|| "info".to_string());

        let file = match var("LOG_FILE_PATH") {
            Some(path) if path.trim() == "-" => None,
            Some(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            _ => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };

        let rotation = match var("LOG_ROTATION").as_deref().map(str::to_lowercase).as_deref() {
            Some("daily") => Rotation::DAILY,
            Some("hourly") => Rotation::HOURLY,
            _ => Rotation::NEVER,
        };

        Self {
            filter,
            file,
            rotation,
        }
    }
}

/// Install stderr logging plus an optional non-blocking file log.
///
/// The returned guard flushes the file log when dropped; hold it for the life of `main`.
pub fn init_logger(settings: &LogSettings, verbose: bool) -> Option<WorkerGuard> {
    let filter = if verbose { "debug" } else { settings.filter.as_str() };
    let filter_layer = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match settings.file.as_deref().and_then(|p| file_writer(p, &settings.rotation)) {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    debug!("Logging initialized with filter '{}'", filter);
    guard
}

fn file_writer(path: &Path, rotation: &Rotation) -> Option<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name()?;

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Cannot create log directory {}: {}", dir.display(), e);
        return None;
    }
    Some(RollingFileAppender::new(rotation.clone(), dir, file_name))
}
