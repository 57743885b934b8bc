use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use axum_derive_error::ErrorResponse;
use common::config::Config;
use db::{
    ai_analysis, blockchain_transaction, patent_activity, patent_document, prior_art_result,
    task, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use tracing::info;

use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
    storage::{DocumentStorage, StoredDocument},
};

/// Errors that may occur during the patent deletion.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentDeletionError {
    /// Database-related error.
    DatabaseError(DbErr),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,
}

patent_access_error!(PatentDeletionError);

/// Delete a patent owned by the current user together with all of its records.
///
/// Stored document files are removed once no other document refers to them.
pub(super) async fn delete(
    Extension(current_user): Extension<AuthenticatedUserId>,
    Extension(config): Extension<Arc<Config>>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, PatentDeletionError> {
    let documents = db
        .transaction(|txn| {
            Box::pin(async move {
                let patent = access::owned_patent(txn, id, current_user).await?;

                let documents = patent_document::Entity::find()
                    .filter(patent_document::Column::PatentId.eq(patent.id))
                    .all(txn)
                    .await?;

                patent_document::Entity::delete_many()
                    .filter(patent_document::Column::PatentId.eq(patent.id))
                    .exec(txn)
                    .await?;

                ai_analysis::Entity::delete_many()
                    .filter(ai_analysis::Column::PatentId.eq(patent.id))
                    .exec(txn)
                    .await?;

                prior_art_result::Entity::delete_many()
                    .filter(prior_art_result::Column::PatentId.eq(patent.id))
                    .exec(txn)
                    .await?;

                blockchain_transaction::Entity::delete_many()
                    .filter(blockchain_transaction::Column::PatentId.eq(patent.id))
                    .exec(txn)
                    .await?;

                patent_activity::Entity::delete_many()
                    .filter(patent_activity::Column::PatentId.eq(patent.id))
                    .exec(txn)
                    .await?;

                task::Entity::delete_many()
                    .filter(task::Column::PatentId.eq(patent.id))
                    .exec(txn)
                    .await?;

                patent.delete(txn).await?;

                Ok::<_, PatentDeletionError>(documents)
            })
        })
        .await
        .into_raw_result()?;

    info!(patent_id = id, "patent deleted");

    remove_unreferenced(
        &*db,
        &DocumentStorage::new(&config.storage),
        documents.into_iter().map(StoredDocument::from).collect(),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove files of the provided documents that are no longer referenced.
pub(super) async fn remove_unreferenced(
    db: &DatabaseConnection,
    storage: &DocumentStorage<'_>,
    documents: Vec<StoredDocument>,
) -> Result<(), DbErr> {
    for document in documents {
        let referenced = patent_document::Entity::find()
            .select_only()
            .filter(patent_document::Column::ContentHash.eq(&document.content_hash))
            .exists(db)
            .await?;

        if !referenced {
            storage.remove(&document.path).await;
        }
    }

    Ok(())
}
