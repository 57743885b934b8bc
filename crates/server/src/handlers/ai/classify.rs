use axum::{Extension, Json};
use common::ai::{Analyst, Classification};
use serde::Deserialize;
use validator::Validate;

use crate::validation::ValidatedJson;

#[derive(Deserialize, Validate)]
pub(super) struct ClassificationRequest {
    #[validate(length(min = 1, message = "description is required"))]
    description: String,
}

/// Classify an innovation into one of the patent categories.
pub(super) async fn classify(
    Extension(analyst): Extension<Analyst>,
    ValidatedJson(request): ValidatedJson<ClassificationRequest>,
) -> Json<Classification> {
    Json(analyst.classify(&request.description).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::testing::{
        app_with_model, create_database, create_user, login, RequestBodyExt, ResponseBodyExt,
    };

    async fn classify(reply: &'static str) -> serde_json::Value {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let response = app_with_model(db, Some(reply))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ai/classify")
                    .header("Cookie", cookie)
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!({ "description": "Cloud GPU scheduler" })))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        response.json().await
    }

    #[tokio::test]
    async fn known_category() {
        let body = classify(r#"{"category": "software_ai", "confidence": 0.92}"#).await;

        assert_eq!(body["category"], "software_ai");
        assert_eq!(body["available"], true);
    }

    #[tokio::test]
    async fn unknown_category() {
        let body = classify(r#"{"category": "quantum_cooking", "confidence": 0.5}"#).await;

        assert_eq!(body["category"], "other");
    }

    #[tokio::test]
    async fn malformed_reply() {
        let body = classify("not json").await;

        assert_eq!(body["category"], "other");
        assert_eq!(body["confidence"], 0.0);
        assert_eq!(body["available"], false);
    }
}
