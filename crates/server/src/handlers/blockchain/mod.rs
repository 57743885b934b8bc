/// Patent token minting route.
mod mint;

/// Anchored hash verification route.
mod verify;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use db::DatabaseConnection;

/// Create a router with ledger routes.
pub(crate) fn routes() -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/verify/:patentId", get(verify::verify))
        .route("/mint-nft/:patentId", post(mint::mint))
}
