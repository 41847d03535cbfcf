// Copyright 2026 xfercore contributors.

//! Command-line entry point driving the traversal/enumeration core
//! against a null execution engine: enough to plan a job end to end
//! without a real data-plane worker pool.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use xfercore::logging::{self, LoggingOptions};

mod backend;
mod cmd;

#[derive(Debug, Parser)]
#[clap(name = "xfer", about = "Plan cross-cloud bulk copy and sync jobs", author, version)]
struct CliArgs {
    #[clap(subcommand)]
    command: Command,

    /// Disable progress reporting.
    #[clap(long, short = 'P', global = true)]
    no_progress: bool,

    /// Raise the log level to debug.
    #[clap(long, short = 'D', global = true)]
    debug: bool,

    /// Write logs to this file instead of stderr.
    #[clap(long, global = true)]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy objects from source to destination.
    Copy(cmd::CopyArgs),
    /// Reconcile a destination to match a source, reporting (but not
    /// removing, absent a real execution engine) destination-only objects.
    Sync(cmd::SyncArgs),
    /// Enumerate objects matching a target, reporting (but not removing)
    /// what would be deleted.
    Remove(cmd::RemoveArgs),
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let _log_guard = match logging::init(&LoggingOptions {
        log_file: args.log_file.clone(),
        json: false,
        debug: args.debug,
    }) {
        Ok(guard) => guard,
        Err(message) => {
            eprintln!("failed to initialize logging: {message}");
            return ExitCode::FAILURE;
        }
    };
    let _ = args.no_progress;

    let result = match &args.command {
        Command::Copy(copy_args) => cmd::run_copy(copy_args),
        Command::Sync(sync_args) => cmd::run_sync(sync_args),
        Command::Remove(remove_args) => cmd::run_remove(remove_args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
