use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    patent,
    sea_query::{Expr, Func, LikeExpr},
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;

use super::PatentData;
use crate::auth::AuthenticatedUserId;

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum PatentSearchError {
    DatabaseError(DbErr),
}

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    /// Text to look for in patent titles and descriptions.
    q: String,
}

/// Escape `LIKE` pattern metacharacters of user input.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }

        escaped.push(ch);
    }

    escaped
}

/// Search patents of the current user by title and description.
///
/// Matching is case-insensitive and results are ordered newest first.
pub(super) async fn search(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PatentData>>, PatentSearchError> {
    let needle = query.q.trim();

    // SQLite's LOWER() only folds ASCII letters.
    let needle = match db.get_database_backend() {
        DbBackend::Sqlite => needle.to_ascii_lowercase(),
        _ => needle.to_lowercase(),
    };

    let pattern = format!("%{}%", escape_like(&needle));

    let patents = patent::Entity::find()
        .filter(patent::Column::UserId.eq(current_user.id()))
        .filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(patent::Column::Title)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(patent::Column::Description)))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        )
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
    use db::{patent, ActiveValue};
    use tower::ServiceExt;

    use super::escape_like;
    use crate::testing::{
        app, create_database, create_patent, create_user, login, patent_model, ResponseBodyExt,
    };

    #[test]
    fn escaping() {
        assert_eq!(escape_like("100%_\\"), "100\\%\\_\\\\");
        assert_eq!(escape_like("solar"), "solar");
    }

    #[tokio::test]
    async fn search() {
        let db = create_database().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let cookie = login(&db, alice).await;

        create_patent(&db, alice, patent_model("Solar Panel", None)).await;
        create_patent(
            &db,
            alice,
            patent::ActiveModel {
                description: ActiveValue::Set(String::from("Tracks the SOLAR position")),
                ..patent_model("Heliostat", None)
            },
        )
        .await;
        create_patent(&db, alice, patent_model("Wind turbine", None)).await;
        create_patent(&db, bob, patent_model("Solar roof", None)).await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri("/api/patents/search?q=solar")
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

        assert_eq!(titles, ["Heliostat", "Solar Panel"]);
    }

    #[tokio::test]
    async fn non_ascii_title() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        create_patent(&db, user_id, patent_model("Éclairage solaire", None)).await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri("/api/patents/search?q=%C3%89CLAIRAGE")
                    .header("Cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;

        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "Éclairage solaire");
    }

    #[tokio::test]
    async fn wildcards_are_literal() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        create_patent(&db, user_id, patent_model("Solar Panel", None)).await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri("/api/patents/search?q=%25")
                    .header("Cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.json().await, serde_json::json!([]));
    }
}
