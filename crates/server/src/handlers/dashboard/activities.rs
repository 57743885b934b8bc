use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    patent_activity, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;

use crate::{auth::AuthenticatedUserId, handlers::patents::ActivityData};

/// Number of activity records returned when no limit is requested.
const DEFAULT_LIMIT: u64 = 20;

/// Largest number of activity records returned at once.
const MAX_LIMIT: u64 = 100;

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum DashboardActivitiesError {
    DatabaseError(DbErr),
}

#[derive(Deserialize)]
pub(super) struct ActivitiesQuery {
    limit: Option<u64>,
}

/// Get the most recent lifecycle events across the current user's patents.
pub(super) async fn activities(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(query): Query<ActivitiesQuery>,
) -> Result<Json<Vec<ActivityData>>, DashboardActivitiesError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let activities = patent_activity::Entity::find()
        .filter(patent_activity::Column::UserId.eq(current_user.id()))
        .order_by_desc(patent_activity::Column::CreatedAt)
        .order_by_desc(patent_activity::Column::Id)
        .limit(limit)
        .all(&*db)
        .await?;

    Ok(Json(activities.into_iter().map(ActivityData::from).collect()))
}
