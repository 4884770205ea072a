use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "STARTPAGE_LOG";

/// Keeps the background log writer alive; drop it last.
pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("startpage=info"))
}

fn log_dir() -> std::io::Result<PathBuf> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("startpage")
        .join("logs");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// File logging for the full-screen UI, which owns the terminal.
pub fn init() -> Option<LoggingGuard> {
    let log_dir = log_dir().ok()?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "startpage.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(env_filter()).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");

    Some(LoggingGuard {
        _guard: Some(guard),
    })
}

/// Logs panics and runs `before` ahead of the previously installed hook,
/// so the default message still reaches the user.
pub fn install_panic_hook<F>(before: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        before();
        tracing::error!(panic = %panic_info, "panic");
        previous(panic_info);
    }));
}

/// Stderr logging for `--print`, where stdout carries the page.
pub fn init_stderr() -> Option<LoggingGuard> {
    let subscriber = tracing_subscriber::registry().with(env_filter()).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    Some(LoggingGuard {
        _guard: None,
    })
}
