use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    blockchain_transaction, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
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
pub(super) enum PatentTransactionsError {
    DatabaseError(DbErr),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,
}

patent_access_error!(PatentTransactionsError);

/// Ledger operation performed for a patent.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TransactionData {
    pub id: i64,
    pub patent_id: i64,
    pub transaction_type: blockchain_transaction::TransactionType,
    pub status: blockchain_transaction::Status,
    pub topic_id: Option<String>,
    pub message_id: Option<String>,
    pub token_id: Option<String>,
    pub transaction_id: Option<String>,
    pub hash: Option<String>,
    pub error: Option<String>,
    pub created_at: i64,
}

impl From<blockchain_transaction::Model> for TransactionData {
    fn from(model: blockchain_transaction::Model) -> Self {
        Self {
            id: model.id,
            patent_id: model.patent_id,
            transaction_type: model.transaction_type,
            status: model.status,
            topic_id: model.topic_id,
            message_id: model.message_id,
            token_id: model.token_id,
            transaction_id: model.transaction_id,
            hash: model.hash,
            error: model.error,
            created_at: unix_timestamp(model.created_at),
        }
    }
}

/// List ledger transactions recorded for a patent, newest first.
pub(super) async fn transactions(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TransactionData>>, PatentTransactionsError> {
    let patent = access::owned_patent(&*db, id, current_user).await?;

    let transactions = blockchain_transaction::Entity::find()
        .filter(blockchain_transaction::Column::PatentId.eq(patent.id))
        .order_by_desc(blockchain_transaction::Column::CreatedAt)
        .order_by_desc(blockchain_transaction::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(
        transactions.into_iter().map(TransactionData::from).collect(),
    ))
}
