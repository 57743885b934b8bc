use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    prior_art_result, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use derive_more::{Display, Error, From};
use serde::Serialize;

use super::unix_timestamp;
use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
};

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PriorArtListError {
    DatabaseError(DbErr),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,
}

patent_access_error!(PriorArtListError);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PriorArtData {
    pub id: i64,
    pub patent_id: i64,

    /// Identifier of the existing patent in its source database.
    pub external_patent_id: String,

    pub title: String,
    pub description: String,
    pub similarity_score: f64,
    pub source: String,
    pub created_at: i64,
}

impl From<prior_art_result::Model> for PriorArtData {
    fn from(model: prior_art_result::Model) -> Self {
        Self {
            id: model.id,
            patent_id: model.patent_id,
            external_patent_id: model.external_patent_id,
            title: model.title,
            description: model.description,
            similarity_score: model.similarity_score,
            source: model.source,
            created_at: unix_timestamp(model.created_at),
        }
    }
}

/// List prior art found for a patent, most similar first.
pub(super) async fn prior_art(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PriorArtData>>, PriorArtListError> {
    let patent = access::owned_patent(&*db, id, current_user).await?;

    let results = prior_art_result::Entity::find()
        .filter(prior_art_result::Column::PatentId.eq(patent.id))
        .order_by_desc(prior_art_result::Column::SimilarityScore)
        .order_by_asc(prior_art_result::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(results.into_iter().map(PriorArtData::from).collect()))
}
