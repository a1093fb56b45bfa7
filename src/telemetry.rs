//! Logging setup, command timing and span constructors.

use crate::config::{LogFormat, LoggingConfig};
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level`. When `logging.directory` is set a
/// daily-rolling file receives the same events; the returned guard must be
/// held until exit so buffered lines are flushed.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_writer, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "yunshen.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => {
            let file = file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w));
            registry
                .with(fmt::layer().json().with_target(true))
                .with(file)
                .try_init()
        }
        LogFormat::Text => {
            let file = file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w));
            registry
                .with(fmt::layer().with_target(true))
                .with(file)
                .try_init()
        }
    };
    if let Err(e) = installed {
        eprintln!("tracing subscriber already installed: {e}");
    }

    guard
}

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Span for one connected session.
    pub fn session(username: &str, session: u64) -> Span {
        info_span!("session", username = %username, session)
    }

    /// Span for delivering one event to its handlers.
    pub fn dispatch(event: &str) -> Span {
        debug_span!("dispatch", event = %event)
    }

    /// Span for a command execution.
    pub fn command(name: &str, invoker: &str) -> Span {
        info_span!("command", command = %name, invoker = %invoker)
    }

    /// Span for a lifecycle transition.
    pub fn transition(unit: &str, transition: &'static str) -> Span {
        debug_span!("unit", unit = %unit, transition)
    }
}
