// Copyright 2026 xfercore contributors.

//! Structured logging setup for the `xfer` CLI binary.
//!
//! Library code never installs a global subscriber itself, so it
//! composes inside a host process; only the binary entry point calls
//! [`init`].

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Options controlling where and how logs are written.
#[derive(Clone, Debug, Default)]
pub struct LoggingOptions {
    pub log_file: Option<PathBuf>,
    pub json: bool,
    pub debug: bool,
}

/// Holds the non-blocking writer's flush guard; drop at the end of
/// `main` to ensure buffered log lines are flushed.
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

/// Initialize the global tracing subscriber for the CLI process.
///
/// The filter defaults to `info`, or `debug` when [`LoggingOptions::debug`]
/// is set; either is overridden by the `RUST_LOG` environment variable
/// when present.
pub fn init(options: &LoggingOptions) -> Result<LogGuard, String> {
    let default_directive = if options.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = fmt::Subscriber::builder().with_env_filter(filter).with_target(true);

    if let Some(path) = &options.log_file {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let file_name = path
            .file_name()
            .ok_or_else(|| format!("invalid log file path {path:?}"))?;
        let appender = tracing_appender::rolling::never(dir.unwrap_or_else(|| std::path::Path::new(".")), file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let subscriber = builder.with_writer(non_blocking).with_ansi(false);
        if options.json {
            subscriber
                .json()
                .try_init()
                .map_err(|e| format!("failed to install logger: {e}"))?;
        } else {
            subscriber
                .try_init()
                .map_err(|e| format!("failed to install logger: {e}"))?;
        }
        Ok(LogGuard(Some(guard)))
    } else {
        if options.json {
            builder
                .json()
                .try_init()
                .map_err(|e| format!("failed to install logger: {e}"))?;
        } else {
            builder
                .try_init()
                .map_err(|e| format!("failed to install logger: {e}"))?;
        }
        Ok(LogGuard(None))
    }
}
