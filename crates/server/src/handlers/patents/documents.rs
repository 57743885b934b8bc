use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use common::config::Config;
use db::{
    patent_activity, patent_document, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use serde::Serialize;

use super::{delete::remove_unreferenced, unix_timestamp};
use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
    storage::DocumentStorage,
};

/// Errors that may occur during the patent document request handling.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentDocumentError {
    /// Database-related error.
    DatabaseError(DbErr),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "document not found")]
    DocumentNotFound,
}

patent_access_error!(PatentDocumentError);

/// Patent document information.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DocumentData {
    pub id: i64,
    pub patent_id: i64,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: String,
    pub content_hash: String,

    /// Upload timestamp, as a UNIX timestamp.
    pub created_at: i64,
}

impl From<patent_document::Model> for DocumentData {
    fn from(model: patent_document::Model) -> Self {
        Self {
            id: model.id,
            patent_id: model.patent_id,
            filename: model.filename,
            file_size: model.file_size,
            mime_type: model.mime_type,
            content_hash: model.content_hash,
            created_at: unix_timestamp(model.created_at),
        }
    }
}

/// List documents attached to a patent.
pub(super) async fn list(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<DocumentData>>, PatentDocumentError> {
    let patent = access::owned_patent(&*db, id, current_user).await?;

    let documents = patent_document::Entity::find()
        .filter(patent_document::Column::PatentId.eq(patent.id))
        .order_by_asc(patent_document::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(documents.into_iter().map(DocumentData::from).collect()))
}

/// Remove a single document from a patent.
pub(super) async fn delete(
    Extension(current_user): Extension<AuthenticatedUserId>,
    Extension(config): Extension<Arc<Config>>,
    State(db): State<Arc<DatabaseConnection>>,
    Path((id, document_id)): Path<(i64, i64)>,
) -> Result<StatusCode, PatentDocumentError> {
    let document = db
        .transaction(|txn| {
            Box::pin(async move {
                let patent = access::owned_patent(txn, id, current_user).await?;

                let document = patent_document::Entity::find_by_id(document_id)
                    .filter(patent_document::Column::PatentId.eq(patent.id))
                    .one(txn)
                    .await?
                    .ok_or(PatentDocumentError::DocumentNotFound)?;

                document.clone().delete(txn).await?;

                patent_activity::Entity::insert(patent_activity::record(
                    &patent,
                    patent_activity::ActivityType::DocumentRemoved,
                    format!("Document \"{}\" was removed", document.filename),
                ))
                .exec_without_returning(txn)
                .await?;

                Ok::<_, PatentDocumentError>(document)
            })
        })
        .await
        .into_raw_result()?;

    remove_unreferenced(
        &*db,
        &DocumentStorage::new(&config.storage),
        vec![document.into()],
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use db::{patent_activity, patent_document, ActiveValue, DatabaseConnection, EntityTrait};
    use tower::{Service, ServiceExt};

    use crate::testing::{
        app, create_database, create_patent, create_user, login, patent_model, ResponseBodyExt,
    };

    async fn attach_document(db: &DatabaseConnection, patent_id: i64, filename: &str) -> i64 {
        patent_document::Entity::insert(patent_document::ActiveModel {
            patent_id: ActiveValue::Set(patent_id),
            filename: ActiveValue::Set(filename.to_string()),
            storage_path: ActiveValue::Set(format!("/nonexistent/{filename}")),
            file_size: ActiveValue::Set(128),
            mime_type: ActiveValue::Set(String::from("image/png")),
            content_hash: ActiveValue::Set(format!("{filename:0>64}")),
            ..Default::default()
        })
        .exec(db)
        .await
        .unwrap()
        .last_insert_id
    }

    #[tokio::test]
    async fn list_and_delete() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let patent = create_patent(&db, user_id, patent_model("Wind turbine", None)).await;
        let drawing = attach_document(&db, patent.id, "drawing.png").await;
        attach_document(&db, patent.id, "schema.png").await;

        let mut service = app(db.clone());

        let response = service
            .call(
                Request::builder()
                    .uri(format!("/api/patents/{}/documents", patent.id))
                    .header("Cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = response.json().await;

        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["filename"], "drawing.png");
        assert_eq!(body[0]["mimeType"], "image/png");
        assert!(body[0].get("storagePath").is_none());

        let response = service
            .call(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/patents/{}/documents/{drawing}", patent.id))
                    .header("Cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let documents = patent_document::Entity::find().all(&db).await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].filename, "schema.png");

        let activities = patent_activity::Entity::find().all(&db).await.unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(
            activities[0].activity_type,
            patent_activity::ActivityType::DocumentRemoved
        );
    }

    #[tokio::test]
    async fn document_of_another_patent() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let first = create_patent(&db, user_id, patent_model("Wind turbine", None)).await;
        let second = create_patent(&db, user_id, patent_model("Solar panel", None)).await;
        let document = attach_document(&db, second.id, "drawing.png").await;

        let response = app(db.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/patents/{}/documents/{document}", first.id))
                    .header("Cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(patent_document::Entity::find_by_id(document)
            .one(&db)
            .await
            .unwrap()
            .is_some());
    }
}
