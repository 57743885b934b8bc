use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{DatabaseConnection, DbErr};
use derive_more::{Display, Error, From};

use super::PatentData;
use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
};

/// Errors that may occur during the patent details request handling.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentDetailsError {
    /// Database-related error.
    DatabaseError(DbErr),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    /// Patent is owned by another user.
    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,
}

patent_access_error!(PatentDetailsError);

/// Get details of a single patent owned by the current user.
pub(super) async fn details(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<PatentData>, PatentDetailsError> {
    let patent = access::owned_patent(&*db, id, current_user).await?;

    Ok(Json(patent.into()))
}

#[cfg(test)]
mod tests {
    use assert_json::assert_json;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use db::patent::Category;
    use tower::ServiceExt;

    use crate::testing::{
        app, create_database, create_patent, create_user, login, patent_model, ResponseBodyExt,
    };

    #[tokio::test]
    async fn details() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let patent = create_patent(
            &db,
            user_id,
            patent_model("Gene editing kit", Some(Category::Biotechnology)),
        )
        .await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri(format!("/api/patents/{}", patent.id))
                    .header("Cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;

        assert_eq!(body["id"], patent.id);
        assert_eq!(body["title"], "Gene editing kit");
        assert_eq!(body["category"], "biotechnology");
        assert_eq!(body["status"], "pending");
        assert!(body["createdAt"].is_i64());
    }

    #[tokio::test]
    async fn foreign_patent() {
        let db = create_database().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let cookie = login(&db, bob).await;

        let patent = create_patent(&db, alice, patent_model("Gene editing kit", None)).await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri(format!("/api/patents/{}", patent.id))
                    .header("Cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_patent() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri("/api/patents/404")
                    .header("Cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert_json!(response.json().await, {
            "code": 404,
            "error": "patent not found",
        });
    }
}
