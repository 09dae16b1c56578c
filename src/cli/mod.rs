//! Command-line interface definitions for the `labelsweep` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `labelsweep` binary.
#[derive(Debug, Parser)]
#[command(
    name = "labelsweep",
    about = "Reclaim containers and images left behind by labelled test runs",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Also log runtime commands at debug level (overridden by `RUST_LOG`).
    #[arg(long, short = 'v', global = true)]
    pub(crate) verbose: bool,
    /// Subcommand to run.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Subcommands of `labelsweep`.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print the `key=value` run label for a test run.
    #[command(name = "label", about = "Print the run label for a test run")]
    Label(LabelCommand),
    /// Remove every container and image labelled for a test run.
    #[command(name = "sweep", about = "Remove containers and images left by a test run")]
    Sweep(SweepCommand),
}

/// Options identifying the run whose resources are targeted.
#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Test run identifier; becomes the value of the run label.
    #[arg(long, env = "LABELSWEEP_RUN_ID", value_name = "ID")]
    pub(crate) run_id: Option<String>,
    /// Override the run label key.
    #[arg(long, value_name = "KEY")]
    pub(crate) run_label_key: Option<String>,
}

/// Arguments for `labelsweep label`.
#[derive(Debug, Args)]
pub(crate) struct LabelCommand {
    /// Run selection.
    #[command(flatten)]
    pub(crate) run: RunArgs,
}

/// Arguments for `labelsweep sweep`.
#[derive(Debug, Args)]
pub(crate) struct SweepCommand {
    /// Run selection.
    #[command(flatten)]
    pub(crate) run: RunArgs,
    /// Override the delete-me marker key.
    #[arg(long, value_name = "KEY")]
    pub(crate) delete_marker_key: Option<String>,
    /// Container runtime CLI to invoke (`docker` or `podman`).
    #[arg(long, value_name = "BIN")]
    pub(crate) runtime_bin: Option<String>,
    /// Fail when eligible resources are still listed after the sweep.
    #[arg(long)]
    pub(crate) verify: bool,
}
