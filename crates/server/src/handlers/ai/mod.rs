/// Innovation classification route.
mod classify;

/// Patent application drafting route.
mod draft;

/// Prior art search route.
mod prior_art;

/// Description similarity route.
mod similarity;

/// Patent valuation route.
mod valuation;

use std::sync::Arc;

use axum::{routing::post, Router};
use db::DatabaseConnection;

/// Create a router with AI analysis routes.
///
/// Every route responds with a well-formed result even when the language model
/// is unavailable. Such fallback results have their `available` flag unset.
pub(crate) fn routes() -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/prior-art-search", post(prior_art::search))
        .route("/patent-valuation", post(valuation::valuation))
        .route("/similarity", post(similarity::similarity))
        .route("/draft", post(draft::draft))
        .route("/classify", post(classify::classify))
}
