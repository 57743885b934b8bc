use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderName, StatusCode},
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{user, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use validator::Validate;

use super::UserData;
use crate::{auth::session_cookie, password, session::Sessions, validation::ValidatedJson};

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum UserAuthenticationError {
    DatabaseError(DbErr),

    #[status(StatusCode::UNAUTHORIZED)]
    #[display(fmt = "invalid email or password")]
    InvalidCredentials,
}

#[derive(Deserialize, Validate)]
pub(super) struct UserAuthenticationRequest {
    #[validate(length(min = 1, message = "email is required"))]
    email: String,

    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

/// Authenticate a user with an email and a password.
pub(super) async fn login(
    Extension(sessions): Extension<Sessions>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<UserAuthenticationRequest>,
) -> Result<([(HeaderName, String); 1], Json<UserData>), UserAuthenticationError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&request.email))
        .one(&*db)
        .await?
        .ok_or(UserAuthenticationError::InvalidCredentials)?;

    if !password::verify(&request.password, &user.password_hash) {
        return Err(UserAuthenticationError::InvalidCredentials);
    }

    let token = sessions.create(user.id).await?;

    Ok((
        [(SET_COOKIE, session_cookie(&token, sessions.lifespan()))],
        Json(user.into()),
    ))
}
