use std::path::{Path, PathBuf};

use runpad::kernel::services::adapters::ensure_log_dir;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "runpad.log";
const DEFAULT_DIRECTIVE: &str = "runpad=info";

/// Keeps the non-blocking file writer alive; dropping it flushes pending records.
pub struct LoggingGuard {
    _file: WorkerGuard,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

fn resolve_log_dir() -> Option<PathBuf> {
    match ensure_log_dir() {
        Ok(dir) => Some(dir),
        Err(_) => {
            let dir = std::env::temp_dir().join("runpad").join("logs");
            std::fs::create_dir_all(&dir).ok()?;
            Some(dir)
        }
    }
}

/// Daily rolling file log, plus a compact stderr copy when `verbose`.
///
/// Returns `None` when no log directory is usable or a subscriber is
/// already installed; the program runs without logs in that case.
pub fn init(verbose: bool) -> Option<LoggingGuard> {
    let log_dir = resolve_log_dir()?;
    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);
    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .ok()?;

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));
    tracing::info!(log_dir = %log_dir.display(), verbose, "tracing initialized");

    Some(LoggingGuard {
        _file: file_guard,
        log_dir,
    })
}
