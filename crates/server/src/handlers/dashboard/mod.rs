/// Portfolio activity feed route.
mod activities;

/// Portfolio statistics routes.
mod stats;

use std::sync::Arc;

use axum::{routing::get, Router};
use db::DatabaseConnection;

/// Create a router with portfolio dashboard routes.
pub(crate) fn routes() -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/stats", get(stats::stats))
        .route("/category-stats", get(stats::category_stats))
        .route("/activities", get(activities::activities))
}
