use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_derive_error::ErrorResponse;
use common::ai::{Analyst, PriorArt};
use db::{
    ai_analysis, prior_art_result, ActiveValue, DatabaseConnection, DbErr, EntityTrait,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
    validation::ValidatedJson,
};

/// Errors that may occur during the prior art search.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PriorArtSearchError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Unable to serialize search results for storage.
    SerializationError(serde_json::Error),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,
}

patent_access_error!(PriorArtSearchError);

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(super) struct PriorArtSearchRequest {
    /// Patent to attach search results to.
    patent_id: Option<i64>,

    #[validate(length(min = 1, message = "description is required"))]
    description: String,
}

/// Search for prior art of an invention description.
///
/// When a patent identifier is provided, results of a successful search are
/// stored as the patent's prior art together with an analysis record.
/// Unavailable searches return an empty list and store nothing.
pub(super) async fn search(
    Extension(current_user): Extension<AuthenticatedUserId>,
    Extension(analyst): Extension<Analyst>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<PriorArtSearchRequest>,
) -> Result<Json<Vec<PriorArt>>, PriorArtSearchError> {
    let patent = match request.patent_id {
        Some(id) => Some(access::owned_patent(&*db, id, current_user).await?),
        None => None,
    };

    let results = match analyst.try_search_prior_art(&request.description).await {
        Ok(results) => results,
        Err(err) => {
            warn!(%err, "prior art search unavailable");
            return Ok(Json(Vec::new()));
        }
    };

    let Some(patent) = patent else {
        return Ok(Json(results));
    };

    let analysis = ai_analysis::ActiveModel {
        patent_id: ActiveValue::Set(patent.id),
        analysis_type: ActiveValue::Set(ai_analysis::AnalysisType::PriorArt),
        result: ActiveValue::Set(serde_json::to_string(&results)?),
        confidence: ActiveValue::Set(
            results
                .iter()
                .map(|result| result.similarity_score)
                .fold(0.0, f64::max),
        ),
        ..Default::default()
    };

    let rows: Vec<_> = results
        .iter()
        .map(|result| prior_art_result::ActiveModel {
            patent_id: ActiveValue::Set(patent.id),
            external_patent_id: ActiveValue::Set(result.patent_id.clone()),
            title: ActiveValue::Set(result.title.clone()),
            description: ActiveValue::Set(result.description.clone()),
            similarity_score: ActiveValue::Set(result.similarity_score),
            source: ActiveValue::Set(result.source.clone()),
            ..Default::default()
        })
        .collect();

    db.transaction::<_, _, PriorArtSearchError>(|txn| {
        Box::pin(async move {
            for row in rows {
                prior_art_result::Entity::insert(row)
                    .exec_without_returning(txn)
                    .await?;
            }

            ai_analysis::Entity::insert(analysis)
                .exec_without_returning(txn)
                .await?;

            Ok(())
        })
    })
    .await
    .into_raw_result()?;

    info!(
        patent_id = patent.id,
        results = results.len(),
        "prior art search results stored"
    );

    Ok(Json(results))
}
