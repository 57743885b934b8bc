use axum::{Extension, Json};
use common::ai::{Analyst, Similarity};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::ValidatedJson;

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(super) struct SimilarityRequest {
    #[serde(rename = "description1")]
    #[validate(length(min = 1, message = "both descriptions are required"))]
    first: String,

    #[serde(rename = "description2")]
    #[validate(length(min = 1, message = "both descriptions are required"))]
    second: String,
}

#[derive(Serialize)]
pub(super) struct SimilarityResponse {
    similarity: Similarity,
}

/// Compare two invention descriptions for overlap and infringement risk.
pub(super) async fn similarity(
    Extension(analyst): Extension<Analyst>,
    ValidatedJson(request): ValidatedJson<SimilarityRequest>,
) -> Json<SimilarityResponse> {
    let similarity = analyst
        .detect_similarity(&request.first, &request.second)
        .await;

    Json(SimilarityResponse { similarity })
}
