use axum::{
    extract::State,
    headers::Cookie,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    TypedHeader,
};
use axum_derive_error::ErrorResponse;
use db::DbErr;
use derive_more::{Display, Error, From};

use crate::session::Sessions;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "sid";

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AuthenticatedUserId(i64);

impl AuthenticatedUserId {
    /// Get raw user identifier value.
    pub fn id(&self) -> i64 {
        self.0
    }
}

/// Token of the session used to authenticate the current request.
#[derive(Clone, Debug)]
pub struct SessionToken(pub String);

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum AuthenticationError {
    DatabaseError(DbErr),

    #[status(StatusCode::UNAUTHORIZED)]
    #[display(fmt = "unauthorized")]
    Unauthorized,
}

pub(super) async fn require_authentication<B>(
    State(sessions): State<Sessions>,
    cookies: Option<TypedHeader<Cookie>>,
    mut req: Request<B>,
    next: Next<B>,
) -> Result<Response, AuthenticationError> {
    let token = cookies
        .as_ref()
        .and_then(|TypedHeader(cookies)| cookies.get(SESSION_COOKIE))
        .ok_or(AuthenticationError::Unauthorized)?
        .to_string();

    let user_id = sessions
        .resolve(&token)
        .await?
        .ok_or(AuthenticationError::Unauthorized)?;

    req.extensions_mut().insert(AuthenticatedUserId(user_id));
    req.extensions_mut().insert(SessionToken(token));

    Ok(next.run(req).await)
}

/// Build a `Set-Cookie` header value for the provided session token.
pub fn session_cookie(token: &str, max_age: u64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}")
}

/// Build a `Set-Cookie` header value that removes the session cookie.
pub fn expired_session_cookie() -> String {
    session_cookie("", 0)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::testing::{app, create_database, create_user, login};

    #[tokio::test]
    async fn missing_cookie() {
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

    #[tokio::test]
    async fn unknown_session() {
        let db = create_database().await;

        let response = app(db)
            .oneshot(
                Request::builder()
                    .uri("/api/patents")
                    .header("Cookie", "sid=unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_session() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

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
    }
}
