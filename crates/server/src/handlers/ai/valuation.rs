use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_derive_error::ErrorResponse;
use common::ai::{Analyst, PatentSummary, Valuation};
use db::{
    ai_analysis, patent, patent_activity, ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
    validation::ValidatedJson,
};

/// Errors that may occur during the patent valuation.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentValuationError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Unable to serialize valuation for storage.
    SerializationError(serde_json::Error),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,
}

patent_access_error!(PatentValuationError);

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(super) struct ValuationRequest {
    patent_id: i64,
}

/// Estimate commercial value of a patent owned by the current user.
///
/// An available valuation is stored as an analysis record and replaces the
/// patent's estimated value. Unavailable valuations leave the patent untouched.
pub(super) async fn valuation(
    Extension(current_user): Extension<AuthenticatedUserId>,
    Extension(analyst): Extension<Analyst>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<ValuationRequest>,
) -> Result<Json<Valuation>, PatentValuationError> {
    let patent = access::owned_patent(&*db, request.patent_id, current_user).await?;

    let category = patent
        .category
        .and_then(|category| serde_plain::to_string(&category).ok())
        .unwrap_or_else(|| String::from("other"));

    let status = serde_plain::to_string(&patent.status).unwrap_or_default();

    let valuation = analyst
        .evaluate_value(&PatentSummary {
            title: &patent.title,
            description: &patent.description,
            category: &category,
            status: &status,
        })
        .await;

    if !valuation.available {
        return Ok(Json(valuation));
    }

    let estimated_value = valuation
        .estimated_value
        .clamp(0.0, patent::MAX_ESTIMATED_VALUE as f64)
        .round() as i64;

    let analysis = ai_analysis::ActiveModel {
        patent_id: ActiveValue::Set(patent.id),
        analysis_type: ActiveValue::Set(ai_analysis::AnalysisType::Valuation),
        result: ActiveValue::Set(serde_json::to_string(&valuation)?),
        confidence: ActiveValue::Set(valuation.confidence),
        ..Default::default()
    };

    db.transaction::<_, _, PatentValuationError>(|txn| {
        Box::pin(async move {
            ai_analysis::Entity::insert(analysis)
                .exec_without_returning(txn)
                .await?;

            let mut active = patent.into_active_model();
            active.estimated_value = ActiveValue::Set(Some(estimated_value));
            active.updated_at = ActiveValue::Set(db::now());

            let patent = active.update(txn).await?;

            patent_activity::Entity::insert(patent_activity::record(
                &patent,
                patent_activity::ActivityType::ValuationUpdated,
                format!("Estimated value updated to ${estimated_value}"),
            ))
            .exec_without_returning(txn)
            .await?;

            info!(patent_id = patent.id, estimated_value, "patent valuation stored");

            Ok(())
        })
    })
    .await
    .into_raw_result()?;

    Ok(Json(valuation))
}
