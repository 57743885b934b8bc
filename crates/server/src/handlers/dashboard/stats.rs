use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use axum_derive_error::ErrorResponse;
use db::{
    stats::{self, CategoryStat, DashboardStats},
    DatabaseConnection, DbErr,
};
use derive_more::{Display, Error, From};

use crate::auth::AuthenticatedUserId;

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum DashboardStatsError {
    DatabaseError(DbErr),
}

/// Get a summary of the current user's patent portfolio.
pub(super) async fn stats(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<DashboardStats>, DashboardStatsError> {
    Ok(Json(stats::dashboard_stats(&*db, current_user.id()).await?))
}

/// Get per-category patent counts of the current user's portfolio.
pub(super) async fn category_stats(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<Vec<CategoryStat>>, DashboardStatsError> {
    Ok(Json(stats::category_stats(&*db, current_user.id()).await?))
}
