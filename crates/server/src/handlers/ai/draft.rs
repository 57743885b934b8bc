use axum::{Extension, Json};
use common::ai::{Analyst, Draft, DraftInput};
use serde::Deserialize;
use validator::Validate;

use crate::validation::ValidatedJson;

#[derive(Deserialize, Validate)]
pub(super) struct DraftRequest {
    #[validate(length(min = 1, message = "title is required"))]
    title: String,

    #[validate(length(min = 1, message = "description is required"))]
    description: String,

    #[validate(length(min = 1, message = "category is required"))]
    category: String,
}

/// Generate a patent application draft.
pub(super) async fn draft(
    Extension(analyst): Extension<Analyst>,
    ValidatedJson(request): ValidatedJson<DraftRequest>,
) -> Json<Draft> {
    let draft = analyst
        .generate_draft(&DraftInput {
            title: request.title,
            description: request.description,
            category: request.category,
        })
        .await;

    Json(draft)
}
