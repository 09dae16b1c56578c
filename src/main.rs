//! Binary entry point for the `labelsweep` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

use labelsweep::config::ConfigError;
use labelsweep::label::{DeleteMarker, LabelError};
use labelsweep::{DockerCli, Janitor, JanitorConfig, JanitorError, SweepReport};

mod cli;

use cli::{Cli, Command, LabelCommand, RunArgs, SweepCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid label: {0}")]
    Label(#[from] LabelError),
    #[error("janitor failed: {0}")]
    Janitor(#[from] JanitorError),
    #[error("a test run id is required: pass --run-id or set LABELSWEEP_RUN_ID")]
    MissingRunId,
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match dispatch(cli.command) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };
    process::exit(exit_code);
}

/// Filter used when `RUST_LOG` is unset or unparsable.
const fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "labelsweep=debug"
    } else {
        "labelsweep=info"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn dispatch(command: Command) -> Result<(), CliError> {
    match command {
        Command::Label(args) => print_label(args),
        Command::Sweep(args) => sweep(args),
    }
}

/// Merges file/env configuration with CLI overrides and insists on a run id.
fn resolve_config(run: RunArgs) -> Result<JanitorConfig, CliError> {
    let mut config = JanitorConfig::load_without_cli_args()?;
    if let Some(run_id) = run.run_id {
        config.run_id = Some(run_id);
    }
    if let Some(key) = run.run_label_key {
        config.run_label_key = key;
    }
    if config.run_id.is_none() {
        return Err(CliError::MissingRunId);
    }
    Ok(config)
}

fn print_label(args: LabelCommand) -> Result<(), CliError> {
    let config = resolve_config(args.run)?;
    config.validate()?;
    let label = config.run_label()?;
    writeln!(io::stdout().lock(), "{label}")?;
    Ok(())
}

fn sweep(args: SweepCommand) -> Result<(), CliError> {
    let mut config = resolve_config(args.run)?;
    if let Some(key) = args.delete_marker_key {
        config.delete_marker_key = key;
    }
    if let Some(bin) = args.runtime_bin {
        config.runtime_bin = bin;
    }
    config.validate()?;

    let label = config.run_label()?;
    let marker = DeleteMarker::new(config.delete_marker_key.as_str())?;
    let janitor = Janitor::new(
        DockerCli::with_process_runner(config.runtime_bin.as_str()),
        label,
        marker,
    );
    let report = if args.verify {
        janitor.sweep_and_verify()?
    } else {
        janitor.sweep()?
    };
    write_report(io::stdout().lock(), &report)?;
    Ok(())
}

fn write_report(mut target: impl Write, report: &SweepReport) -> io::Result<()> {
    for outcome in &report.outcomes {
        writeln!(target, "{outcome}")?;
    }
    writeln!(
        target,
        "sweep complete: deleted={}, failed={}, skipped={}",
        report.deleted(),
        report.failed(),
        report.skipped()
    )
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "labelsweep: {err}").ok();
}
