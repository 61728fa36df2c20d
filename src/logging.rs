use crate::app_dirs::AppDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "POLYGLOT_LOG";
pub const FILE_LOGS_ENV: &str = "POLYGLOT_FILE_LOGS";

/// Keeps the file writer alive; drop it last
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var(FILE_LOGS_ENV)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Logs go to stderr so command output on stdout stays clean
pub fn init_tracing() -> Option<FileLogGuard> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    if file_logging_enabled() {
        if let Some(log_dir) = AppDirs::log_dir() {
            if let Err(err) = std::fs::create_dir_all(&log_dir) {
                eprintln!("failed to create log directory {}: {err}", log_dir.display());
            } else {
                let file_appender =
                    RollingFileAppender::new(Rotation::DAILY, &log_dir, "polyglot.log");
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(stderr_layer)
                    .with(file_layer)
                    .init();

                return Some(FileLogGuard { _guard: guard });
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    None
}
