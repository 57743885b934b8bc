//! # Outbox worker
//!
//! Patent filings enqueue follow-up work as outbox tasks, written in the same
//! transaction as the patent itself. The worker picks these tasks up and runs
//! them against external services:
//!
//! - anchoring of the patent content hash on a distributed ledger,
//! - AI classification and prior art search of the patent description.
//!
//! Every outcome is recorded in the ledger transaction and AI analysis audit
//! tables. Failed tasks are retried with a linearly growing delay until they
//! run out of attempts.
//!
//! # CLI subcommands
//!
//! Currently, the worker provides just one command - [`serve`], which starts
//! processing pending tasks from the database.
//!
//! [`serve`]: commands::serve

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

/// CLI configuration and available subcommands.
mod cli;

/// Subcommand implementations.
mod commands;

/// Outbox task processing.
mod process;

/// Test utilities.
#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Command};
use common::{ai::Analyst, config::Config, ledger::Anchor, logging};
use db::{ledger::DatabaseLedger, Database};
use tracing::info;

/// Outbox worker entrypoint.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let config = Config::new(cli.config)?;

    logging::init(&config);

    let analyst = Analyst::from_config(config.ai.as_ref())?;

    info!("connecting to database");
    let database = Database::connect(&config.database.url).await?;
    info!("database connection established");

    let ledger = Arc::new(DatabaseLedger::new(database.clone()));
    let anchor = Anchor::from_config(&config.ledger, ledger)?;

    match cli.command {
        Command::Serve => commands::serve(config.worker, analyst, anchor, database).await,
    }

    Ok(())
}
