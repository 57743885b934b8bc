use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    patent_activity, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use derive_more::{Display, Error, From};

use super::ActivityData;
use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
};

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentActivitiesError {
    DatabaseError(DbErr),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,
}

patent_access_error!(PatentActivitiesError);

/// Get lifecycle events of a single patent, newest first.
pub(super) async fn activities(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ActivityData>>, PatentActivitiesError> {
    let patent = access::owned_patent(&*db, id, current_user).await?;

    let activities = patent_activity::Entity::find()
        .filter(patent_activity::Column::PatentId.eq(patent.id))
        .order_by_desc(patent_activity::Column::CreatedAt)
        .order_by_desc(patent_activity::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(activities.into_iter().map(ActivityData::from).collect()))
}
