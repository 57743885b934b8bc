use std::{io, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use common::config::Config;
use db::{
    patent, patent_activity, patent_document, task, ActiveValue, DatabaseConnection, DbErr,
    EntityTrait, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

use super::{delete::remove_unreferenced, PatentData};
use crate::{
    auth::AuthenticatedUserId,
    storage::{DocumentStorage, StoredDocument},
};

/// MIME types of documents accepted alongside a patent filing.
pub(crate) const ALLOWED_MIME_TYPES: [&str; 6] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/png",
    "image/jpeg",
    "image/jpg",
];

/// Errors that may occur during the patent filing process.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentCreationError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Document storage error.
    StorageError(io::Error),

    /// Outbox task payload serialization error.
    PayloadError(serde_json::Error),

    /// `multipart/form-data` request handling error.
    #[status(StatusCode::BAD_REQUEST)]
    MultipartError(MultipartError),

    /// Required patent fields are missing.
    #[status(StatusCode::BAD_REQUEST)]
    ValidationError(ValidationErrors),

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "unknown patent category")]
    InvalidCategory,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "invalid file type")]
    InvalidFileType,

    #[status(StatusCode::PAYLOAD_TOO_LARGE)]
    #[display(fmt = "document exceeds the maximum file size")]
    DocumentTooLarge,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "too many documents were attached")]
    TooManyDocuments,
}

/// Text fields of a filing form.
#[derive(Default, Validate)]
struct PatentFilingForm {
    #[validate(length(min = 1, message = "title is required"))]
    title: String,

    #[validate(length(min = 1, message = "description is required"))]
    description: String,

    #[validate(length(min = 1, message = "category is required"))]
    category: String,
}

/// Document attached to a filing form.
struct Upload {
    filename: String,
    mime_type: String,
    contents: Vec<u8>,
}

/// File a new patent.
///
/// This route accepts a `multipart/form-data` form with `title`, `description`
/// and `category` text fields and any number of `documents` file fields, up to
/// the configured limit. Documents of unsupported types or exceeding the size
/// limit are rejected before anything is stored.
///
/// Ledger anchoring and AI analysis of the new patent are enqueued as outbox
/// tasks in the same transaction as the patent itself.
pub(super) async fn create(
    Extension(current_user): Extension<AuthenticatedUserId>,
    Extension(config): Extension<Arc<Config>>,
    State(db): State<Arc<DatabaseConnection>>,
    mut data: Multipart,
) -> Result<(StatusCode, Json<PatentData>), PatentCreationError> {
    let mut form = PatentFilingForm::default();
    let mut uploads = Vec::new();

    while let Some(mut field) = data.next_field().await? {
        let name = field.name().map(str::to_string);

        match name.as_deref() {
            Some("title") => form.title = field.text().await?.trim().to_string(),
            Some("description") => form.description = field.text().await?.trim().to_string(),
            Some("category") => form.category = field.text().await?.trim().to_string(),
            Some("documents") => {
                if uploads.len() >= config.storage.max_files {
                    return Err(PatentCreationError::TooManyDocuments);
                }

                let mime_type = field.content_type().unwrap_or_default().to_string();

                if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
                    return Err(PatentCreationError::InvalidFileType);
                }

                let filename = field.file_name().unwrap_or("document").to_string();

                let mut contents = Vec::new();

                while let Some(chunk) = field.chunk().await? {
                    if contents.len() + chunk.len() > config.storage.max_file_size {
                        return Err(PatentCreationError::DocumentTooLarge);
                    }

                    contents.extend_from_slice(&chunk);
                }

                uploads.push(Upload {
                    filename,
                    mime_type,
                    contents,
                });
            }
            _ => {}
        }
    }

    form.validate()?;

    let category: patent::Category = serde_plain::from_str(&form.category)
        .map_err(|_| PatentCreationError::InvalidCategory)?;

    let storage = DocumentStorage::new(&config.storage);
    let mut stored = Vec::with_capacity(uploads.len());

    let patent = match file_patent(
        &db,
        &storage,
        current_user.id(),
        form,
        category,
        &uploads,
        &mut stored,
    )
    .await
    {
        Ok(patent) => patent,
        Err(err) => {
            remove_unreferenced(&db, &storage, stored).await?;
            return Err(err);
        }
    };

    // Identical unreferenced files may be removed concurrently until the
    // patent is committed, so the files are written again if missing.
    for upload in &uploads {
        if let Err(err) = storage.store(&upload.contents).await {
            warn!(%err, patent_id = patent.id, "unable to restore stored document");
        }
    }

    let document_count = uploads.len();

    info!(
        patent_id = patent.id,
        user_id = patent.user_id,
        documents = document_count,
        "patent filed"
    );

    Ok((StatusCode::CREATED, Json(patent.into())))
}

/// Store uploaded documents and insert the patent with its documents,
/// activity and outbox tasks.
///
/// Every written document is pushed to `stored`, so that a caller can clean
/// them up if the filing fails.
async fn file_patent(
    db: &DatabaseConnection,
    storage: &DocumentStorage<'_>,
    user_id: i64,
    form: PatentFilingForm,
    category: patent::Category,
    uploads: &[Upload],
    stored: &mut Vec<StoredDocument>,
) -> Result<patent::Model, PatentCreationError> {
    let mut documents = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let document = storage.store(&upload.contents).await?;

        documents.push(patent_document::ActiveModel {
            filename: ActiveValue::Set(upload.filename.clone()),
            storage_path: ActiveValue::Set(document.path.to_string_lossy().into_owned()),
            file_size: ActiveValue::Set(upload.contents.len() as i64),
            mime_type: ActiveValue::Set(upload.mime_type.clone()),
            content_hash: ActiveValue::Set(document.content_hash.clone()),
            ..Default::default()
        });

        stored.push(document);
    }

    let mut content = format!("{}\n{}", form.title, form.description);

    for document in stored.iter() {
        content.push('\n');
        content.push_str(&document.content_hash);
    }

    let anchor_payload = serde_json::to_string(&task::AnchorPayload { content })?;
    let analyze_payload = serde_json::to_string(&task::AnalyzePayload {
        description: form.description.clone(),
    })?;

    db.transaction::<_, _, PatentCreationError>(|txn| {
        Box::pin(async move {
            let now = db::now();

            let patent = patent::Entity::insert(patent::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                title: ActiveValue::Set(form.title),
                description: ActiveValue::Set(form.description),
                category: ActiveValue::Set(Some(category)),
                status: ActiveValue::Set(patent::Status::INITIAL),
                filed_at: ActiveValue::Set(Some(now)),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            })
            .exec_with_returning(txn)
            .await?;

            for mut document in documents {
                document.patent_id = ActiveValue::Set(patent.id);

                patent_document::Entity::insert(document)
                    .exec_without_returning(txn)
                    .await?;
            }

            patent_activity::Entity::insert(patent_activity::record(
                &patent,
                patent_activity::ActivityType::Created,
                format!("Patent \"{}\" was filed", patent.title),
            ))
            .exec_without_returning(txn)
            .await?;

            for (kind, payload) in [
                (task::Kind::AnchorHash, anchor_payload),
                (task::Kind::AnalyzePatent, analyze_payload),
            ] {
                task::Entity::insert(task::ActiveModel {
                    patent_id: ActiveValue::Set(patent.id),
                    kind: ActiveValue::Set(kind),
                    payload: ActiveValue::Set(payload),
                    status: ActiveValue::Set(task::Status::Pending),
                    attempts: ActiveValue::Set(0),
                    scheduled_at: ActiveValue::Set(now),
                    ..Default::default()
                })
                .exec_without_returning(txn)
                .await?;
            }

            Ok(patent)
        })
    })
    .await
    .into_raw_result()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use common::{config::Config, hash};
    use common_multipart_rfc7578::client::multipart;
    use db::{
        patent, patent_activity, patent_document, task, ColumnTrait, ConnectionTrait, EntityTrait,
        PaginatorTrait, QueryFilter,
    };
    use tower::{Service, ServiceExt};

    use crate::testing::{app, create_database, create_user, login, ResponseBodyExt};

    fn filing_form(category: &str) -> multipart::Form<'static> {
        let mut form = multipart::Form::default();

        form.add_text("title", "Self-cleaning solar panel");
        form.add_text("description", "A panel coating that sheds dust");
        form.add_text("category", category);

        form
    }

    fn filing_request(cookie: &str, form: multipart::Form<'static>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/patents")
            .header("Cookie", cookie)
            .header("Content-Type", form.content_type())
            .body(Body::wrap_stream(multipart::Body::from(form)))
            .unwrap()
    }

    #[tokio::test]
    async fn create() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let mut form = filing_form("renewable_energy");
        form.add_reader_file_with_mime(
            "documents",
            Cursor::new(b"%PDF-1.4 patent filing test"),
            "claims.pdf",
            mime::APPLICATION_PDF,
        );

        let response = app(db.clone())
            .oneshot(filing_request(&cookie, form))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.json().await;

        assert_eq!(body["title"], "Self-cleaning solar panel");
        assert_eq!(body["category"], "renewable_energy");
        assert_eq!(body["status"], "pending");
        assert_eq!(body["userId"], user_id);
        assert!(body["filedAt"].is_i64());
        assert!(body["ledgerTopicId"].is_null());

        let patent_id = body["id"].as_i64().unwrap();

        let activities = patent_activity::Entity::find()
            .filter(patent_activity::Column::PatentId.eq(patent_id))
            .all(&db)
            .await
            .unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(
            activities[0].activity_type,
            patent_activity::ActivityType::Created
        );

        let documents = patent_document::Entity::find().all(&db).await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].filename, "claims.pdf");
        assert_eq!(documents[0].mime_type, "application/pdf");
        assert_eq!(documents[0].content_hash.len(), 64);

        let tasks = task::Entity::find()
            .filter(task::Column::PatentId.eq(patent_id))
            .all(&db)
            .await
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|task| task.status == task::Status::Pending));
    }

    #[tokio::test]
    async fn failed_filing_removes_documents() {
        const CONTENTS: &[u8] = b"%PDF-1.4 failed filing test";

        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        db.execute_unprepared("DROP TABLE tasks").await.unwrap();

        let mut form = filing_form("renewable_energy");
        form.add_reader_file_with_mime(
            "documents",
            Cursor::new(CONTENTS),
            "claims.pdf",
            mime::APPLICATION_PDF,
        );

        let response = app(db.clone())
            .oneshot(filing_request(&cookie, form))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(patent::Entity::find().count(&db).await.unwrap(), 0);

        let path = Config::for_tests()
            .storage
            .uploads_path
            .join(hash::blake2_hex(CONTENTS));

        assert!(tokio::fs::metadata(&path).await.is_err());
    }

    #[tokio::test]
    async fn unsupported_document_type() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let mut form = filing_form("software_ai");
        form.add_reader_file_with_mime(
            "documents",
            Cursor::new(b"PK\x03\x04"),
            "sources.zip",
            "application/zip".parse().unwrap(),
        );

        let response = app(db.clone())
            .oneshot(filing_request(&cookie, form))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(patent::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(patent_document::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_fields() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let mut form = multipart::Form::default();
        form.add_text("title", "Self-cleaning solar panel");

        let response = app(db.clone())
            .oneshot(filing_request(&cookie, form))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(patent::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_category() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let response = app(db.clone())
            .oneshot(filing_request(&cookie, filing_form("time_travel")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(patent::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn category_stats_after_filing() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let mut service = app(db);

        let response = service
            .call(filing_request(&cookie, filing_form("software_ai")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);

        let response = service
            .call(
                Request::builder()
                    .uri("/api/dashboard/category-stats")
                    .header("Cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.json().await,
            serde_json::json!([
                {
                    "category": "software_ai",
                    "count": 1,
                    "percentage": 100,
                }
            ])
        );
    }
}
