//! `libris`
//!
//! Command-line front-end for the Libris library manager. It wires the core components to the
//! terminal: notifications are logged, results are printed to stdout.
use crate::cli::Cli;
use crate::state::AppState;
use anyhow::{Error, anyhow};
use clap::Parser as _;
use std::io;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
/// Command-line arguments
mod cli;
/// One handler per subcommand
mod commands;
/// Error types
mod errors;
/// Database and configuration shared by the commands
mod state;

#[allow(
    clippy::missing_inline_in_public_items,
    reason = "Executed once per run, never across crate boundaries"
)]
#[allow(
    clippy::print_stderr,
    reason = "Tracing might not be available here if run_safe() failed before its initialization"
)]
#[must_use]
pub fn run() -> ExitCode {
    match run_safe() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("libris failed: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Encapsulated run function that allows returning errors instead of panicking on `Err` or `None`
/// variants.
fn run_safe() -> Result<(), Error> {
    let Cli {
        database,
        log_level,
        command,
    } = Cli::parse();
    init_tracing(log_level.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let state = AppState::open(&database).await?;
        let result = commands::dispatch(&state, command).await;
        state.close().await;
        info!("Closed catalog database");
        result
    })?;
    Ok(())
}

/// Log to stderr so that stdout only carries command output. `log` records from the core library
/// are forwarded into the same subscriber.
fn init_tracing(level: Option<&str>) -> Result<(), Error> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
}
