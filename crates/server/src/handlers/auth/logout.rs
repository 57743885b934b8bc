use axum::{
    http::{header::SET_COOKIE, HeaderName},
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::DbErr;
use derive_more::{Display, Error, From};
use serde_json::{json, Value};

use crate::{
    auth::{expired_session_cookie, SessionToken},
    session::Sessions,
};

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum LogoutError {
    DatabaseError(DbErr),
}

/// Destroy the current session.
pub(super) async fn logout(
    Extension(sessions): Extension<Sessions>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<([(HeaderName, String); 1], Json<Value>), LogoutError> {
    sessions.destroy(&token).await?;

    Ok((
        [(SET_COOKIE, expired_session_cookie())],
        Json(json!({ "message": "logged out successfully" })),
    ))
}
