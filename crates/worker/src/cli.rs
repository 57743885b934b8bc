use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Outbox worker CLI.
#[derive(Parser)]
#[command(about, version)]
pub(crate) struct Cli {
    /// Path to the configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start processing pending outbox tasks.
    Serve,
}
