use common::ai::{self, Analyst};
use db::{
    ai_analysis, patent, prior_art_result, task, ActiveValue, ConnectionTrait, DatabaseConnection,
    EntityTrait, TransactionErrorExt, TransactionTrait,
};
use tracing::info;

use super::worker::TaskError;

/// Classify the patent and search for conflicting prior art.
///
/// Results are recorded only when both steps succeed. A failed step is
/// recorded on its own, with an empty result and the failure reason.
pub(crate) async fn run(
    db: &DatabaseConnection,
    analyst: &Analyst,
    task: &task::Model,
) -> Result<(), TaskError> {
    let payload: task::AnalyzePayload = serde_json::from_str(&task.payload)?;

    let patent = patent::Entity::find_by_id(task.patent_id)
        .one(db)
        .await?
        .ok_or(TaskError::MissingPatent)?;

    let classification = match analyst.try_classify(&payload.description).await {
        Ok(classification) => classification,
        Err(err) => {
            return Err(
                record_failure(db, &patent, ai_analysis::AnalysisType::Classification, err).await,
            );
        }
    };

    let results = match analyst.try_search_prior_art(&payload.description).await {
        Ok(results) => results,
        Err(err) => {
            return Err(
                record_failure(db, &patent, ai_analysis::AnalysisType::PriorArt, err).await,
            );
        }
    };

    let patent_id = patent.id;
    let category = classification.category.clone();
    let prior_art = results.len();

    db.transaction::<_, _, TaskError>(|txn| {
        Box::pin(async move {
            ai_analysis::Entity::insert(ai_analysis::ActiveModel {
                patent_id: ActiveValue::Set(patent_id),
                analysis_type: ActiveValue::Set(ai_analysis::AnalysisType::Classification),
                result: ActiveValue::Set(serde_json::to_string(&classification)?),
                confidence: ActiveValue::Set(classification.confidence),
                ..Default::default()
            })
            .exec_without_returning(txn)
            .await?;

            for result in &results {
                prior_art_result::Entity::insert(prior_art_result::ActiveModel {
                    patent_id: ActiveValue::Set(patent_id),
                    external_patent_id: ActiveValue::Set(result.patent_id.clone()),
                    title: ActiveValue::Set(result.title.clone()),
                    description: ActiveValue::Set(result.description.clone()),
                    similarity_score: ActiveValue::Set(result.similarity_score),
                    source: ActiveValue::Set(result.source.clone()),
                    ..Default::default()
                })
                .exec_without_returning(txn)
                .await?;
            }

            ai_analysis::Entity::insert(ai_analysis::ActiveModel {
                patent_id: ActiveValue::Set(patent_id),
                analysis_type: ActiveValue::Set(ai_analysis::AnalysisType::PriorArt),
                result: ActiveValue::Set(serde_json::to_string(&results)?),
                confidence: ActiveValue::Set(
                    results
                        .iter()
                        .map(|result| result.similarity_score)
                        .fold(0.0, f64::max),
                ),
                ..Default::default()
            })
            .exec_without_returning(txn)
            .await?;

            Ok(())
        })
    })
    .await
    .into_raw_result()?;

    info!(patent_id, %category, prior_art, "patent analyzed");

    Ok(())
}

/// Record a failed analysis attempt and return the matching task error.
async fn record_failure<C: ConnectionTrait>(
    db: &C,
    patent: &patent::Model,
    analysis_type: ai_analysis::AnalysisType,
    err: ai::Error,
) -> TaskError {
    let inserted = ai_analysis::Entity::insert(ai_analysis::ActiveModel {
        patent_id: ActiveValue::Set(patent.id),
        analysis_type: ActiveValue::Set(analysis_type),
        result: ActiveValue::Set(String::from("{}")),
        confidence: ActiveValue::Set(0.0),
        error: ActiveValue::Set(Some(err.to_string())),
        ..Default::default()
    })
    .exec_without_returning(db)
    .await;

    match inserted {
        Ok(_) => err.into(),
        Err(db_err) => db_err.into(),
    }
}
