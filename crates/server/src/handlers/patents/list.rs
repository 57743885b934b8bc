use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use axum_derive_error::ErrorResponse;
use db::{patent, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use derive_more::{Display, Error, From};

use super::PatentData;
use crate::auth::AuthenticatedUserId;

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentListError {
    DatabaseError(DbErr),
}

/// List patents of the current user, newest first.
pub(super) async fn list(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<Vec<PatentData>>, PatentListError> {
    let patents = patent::Entity::find()
        .filter(patent::Column::UserId.eq(current_user.id()))
        .order_by_desc(patent::Column::CreatedAt)
        .order_by_desc(patent::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(patents.into_iter().map(PatentData::from).collect()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::testing::{
        app, create_database, create_patent, create_user, login, patent_model, ResponseBodyExt,
    };

    #[tokio::test]
    async fn list_own_patents() {
        let db = create_database().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let cookie = login(&db, alice).await;

        create_patent(&db, alice, patent_model("First", None)).await;
        create_patent(&db, alice, patent_model("Second", None)).await;
        create_patent(&db, bob, patent_model("Foreign", None)).await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri("/api/patents")
                    .header("Cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        let titles: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|patent| patent["title"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(titles, ["Second", "First"]);
    }

    #[tokio::test]
    async fn unauthenticated() {
        let db = create_database().await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri("/api/patents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
