use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use common::ledger::{self, Anchor};
use db::{DatabaseConnection, DbErr};
use derive_more::{Display, Error, From};
use serde::Serialize;
use tracing::warn;

use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
};

/// Errors that may occur during the anchored hash verification.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum VerificationError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Ledger request failed.
    #[status(StatusCode::BAD_GATEWAY)]
    #[display(fmt = "ledger request failed")]
    LedgerError(ledger::Error),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "patent is not anchored on the ledger")]
    NotAnchored,
}

patent_access_error!(VerificationError);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VerificationData {
    verified: bool,
    topic_id: String,
    message_id: String,
    hash: String,
}

/// Check that the hash anchored for a patent still matches the recorded one.
pub(super) async fn verify(
    Extension(current_user): Extension<AuthenticatedUserId>,
    Extension(anchor): Extension<Anchor>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(patent_id): Path<i64>,
) -> Result<Json<VerificationData>, VerificationError> {
    let patent = access::owned_patent(&*db, patent_id, current_user).await?;

    let (Some(topic_id), Some(message_id), Some(hash)) = (
        patent.ledger_topic_id,
        patent.ledger_message_id,
        patent.content_hash,
    ) else {
        return Err(VerificationError::NotAnchored);
    };

    let verified = anchor
        .verify_hash(&topic_id, &message_id, &hash)
        .await
        .map_err(|err| {
            warn!(%err, patent_id, "unable to verify anchored hash");
            err
        })?;

    Ok(Json(VerificationData {
        verified,
        topic_id,
        message_id,
        hash,
    }))
}
