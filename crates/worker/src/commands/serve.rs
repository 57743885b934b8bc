use std::sync::Arc;

use common::{ai::Analyst, config, ledger::Anchor};
use db::DatabaseConnection;
use futures_util::{stream::FuturesUnordered, FutureExt, StreamExt};
use tracing::{info, instrument};

use crate::process::worker::{self, Processor};

/// Spawn outbox workers and wait for them to finish.
#[instrument(skip_all)]
pub(crate) async fn serve(
    config: config::Worker,
    analyst: Analyst,
    anchor: Anchor,
    database: DatabaseConnection,
) {
    let worker_count = config.worker_count;
    let processor = Arc::new(Processor::new(config, analyst, anchor));
    let database = Arc::new(database);

    info!(worker_count, "started outbox task processing");

    (0..worker_count)
        .map(|_| tokio::spawn(worker::spawn(processor.clone(), database.clone())).map(|_| ()))
        .collect::<FuturesUnordered<_>>()
        .collect::<()>()
        .await;
}
