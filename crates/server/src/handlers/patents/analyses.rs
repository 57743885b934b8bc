use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    ai_analysis, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::unix_timestamp;
use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
};

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentAnalysesError {
    DatabaseError(DbErr),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,
}

patent_access_error!(PatentAnalysesError);

#[derive(Deserialize)]
pub(super) struct AnalysesQuery {
    /// Only return analyses of the provided type.
    #[serde(rename = "type")]
    analysis_type: Option<ai_analysis::AnalysisType>,
}

/// Stored AI analysis.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalysisData {
    pub id: i64,
    pub patent_id: i64,
    pub analysis_type: ai_analysis::AnalysisType,

    /// Analysis result, as returned by the analysis adapter.
    pub result: Value,

    pub confidence: f64,
    pub error: Option<String>,
    pub created_at: i64,
}

impl From<ai_analysis::Model> for AnalysisData {
    fn from(model: ai_analysis::Model) -> Self {
        Self {
            id: model.id,
            patent_id: model.patent_id,
            analysis_type: model.analysis_type,
            result: serde_json::from_str(&model.result).unwrap_or(Value::String(model.result)),
            confidence: model.confidence,
            error: model.error,
            created_at: unix_timestamp(model.created_at),
        }
    }
}

/// List AI analyses recorded for a patent, newest first.
pub(super) async fn analyses(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    Query(query): Query<AnalysesQuery>,
) -> Result<Json<Vec<AnalysisData>>, PatentAnalysesError> {
    let patent = access::owned_patent(&*db, id, current_user).await?;

    let mut select =
        ai_analysis::Entity::find().filter(ai_analysis::Column::PatentId.eq(patent.id));

    if let Some(analysis_type) = query.analysis_type {
        select = select.filter(ai_analysis::Column::AnalysisType.eq(analysis_type));
    }

    let analyses = select
        .order_by_desc(ai_analysis::Column::CreatedAt)
        .order_by_desc(ai_analysis::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(analyses.into_iter().map(AnalysisData::from).collect()))
}
