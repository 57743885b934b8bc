use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    patent, patent_activity, ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, OffsetDateTime, PrimitiveDateTime, TransactionErrorExt,
    TransactionTrait,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::PatentData;
use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
    validation::ValidatedJson,
};

/// Errors that may occur during the patent update.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentUpdateError {
    /// Database-related error.
    DatabaseError(DbErr),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,

    /// Requested status can't be reached from the current one.
    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "invalid status transition")]
    InvalidStatusTransition,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "invalid expiration timestamp")]
    InvalidExpirationDate,
}

patent_access_error!(PatentUpdateError);

/// Patent update request.
///
/// Fields that are not provided are left unchanged.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(super) struct PatentUpdateRequest {
    #[validate(length(min = 1, message = "title can't be empty"))]
    title: Option<String>,

    #[validate(length(min = 1, message = "description can't be empty"))]
    description: Option<String>,

    category: Option<patent::Category>,

    status: Option<patent::Status>,

    #[validate(length(min = 1, message = "patent number can't be empty"))]
    patent_number: Option<String>,

    #[validate(range(
        min = 0,
        max = 1_000_000_000_000_000,
        message = "estimated value must be between 0 and 10^15"
    ))]
    estimated_value: Option<i64>,

    /// Expiration date, as a UNIX timestamp.
    expires_at: Option<i64>,
}

/// Update patent owned by the current user.
///
/// Status changes must follow the patent lifecycle. Moving a patent into
/// the approved status records the approval time.
pub(super) async fn update(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<PatentUpdateRequest>,
) -> Result<Json<PatentData>, PatentUpdateError> {
    let expires_at = request
        .expires_at
        .map(|timestamp| {
            OffsetDateTime::from_unix_timestamp(timestamp)
                .map(|date| PrimitiveDateTime::new(date.date(), date.time()))
                .map_err(|_| PatentUpdateError::InvalidExpirationDate)
        })
        .transpose()?;

    db.transaction(|txn| {
        Box::pin(async move {
            let current = access::owned_patent(txn, id, current_user).await?;
            let previous_status = current.status;

            let mut patent = current.into_active_model();
            let now = db::now();

            if let Some(status) = request.status {
                if !previous_status.can_transition_to(status) {
                    return Err(PatentUpdateError::InvalidStatusTransition);
                }

                if status == patent::Status::Approved && previous_status != status {
                    patent.approved_at = ActiveValue::Set(Some(now));
                }

                patent.status = ActiveValue::Set(status);
            }

            if let Some(title) = request.title {
                patent.title = ActiveValue::Set(title);
            }

            if let Some(description) = request.description {
                patent.description = ActiveValue::Set(description);
            }

            if let Some(category) = request.category {
                patent.category = ActiveValue::Set(Some(category));
            }

            if let Some(patent_number) = request.patent_number {
                patent.patent_number = ActiveValue::Set(Some(patent_number));
            }

            if let Some(estimated_value) = request.estimated_value {
                patent.estimated_value = ActiveValue::Set(Some(estimated_value));
            }

            if let Some(expires_at) = expires_at {
                patent.expires_at = ActiveValue::Set(Some(expires_at));
            }

            patent.updated_at = ActiveValue::Set(now);

            let patent = patent.update(txn).await?;

            let description = if patent.status != previous_status {
                format!(
                    "Patent \"{}\" was updated, status changed to {}",
                    patent.title,
                    serde_plain::to_string(&patent.status).unwrap_or_default()
                )
            } else {
                format!("Patent \"{}\" was updated", patent.title)
            };

            patent_activity::Entity::insert(patent_activity::record(
                &patent,
                patent_activity::ActivityType::Updated,
                description,
            ))
            .exec_without_returning(txn)
            .await?;

            info!(patent_id = patent.id, status = ?patent.status, "patent updated");

            Ok(Json(patent.into()))
        })
    })
    .await
    .into_raw_result()
}
