use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderName, StatusCode},
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    user, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QuerySelect, SelectExt,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::UserData;
use crate::{auth::session_cookie, password, session::Sessions, validation::ValidatedJson};

/// Errors that may occur during the user registration process.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum UserRegistrationError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Password hashing error.
    PasswordHashError(argon2::password_hash::Error),

    /// Provided email is used by another account.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "user with this email already exists")]
    EmailTaken,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserRegistrationRequest {
    #[validate(length(min = 1, message = "first name is required"))]
    first_name: String,

    #[validate(length(min = 1, message = "last name is required"))]
    last_name: String,

    #[validate(email(message = "invalid email address"))]
    email: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    password: String,
}

/// User registration handler.
///
/// A session is started for a newly registered user right away.
pub(super) async fn register(
    Extension(sessions): Extension<Sessions>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<UserRegistrationRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<UserData>), UserRegistrationError> {
    let email_taken = user::Entity::find()
        .select_only()
        .filter(user::Column::Email.eq(&request.email))
        .exists(&*db)
        .await?;

    if email_taken {
        return Err(UserRegistrationError::EmailTaken);
    }

    let password_hash = password::hash(&request.password)?;

    let user = user::Entity::insert(user::ActiveModel {
        email: ActiveValue::Set(request.email),
        first_name: ActiveValue::Set(request.first_name),
        last_name: ActiveValue::Set(request.last_name),
        password_hash: ActiveValue::Set(password_hash),
        ..Default::default()
    })
    .exec_with_returning(&*db)
    .await
    .map_err(|err| {
        if db::is_unique_violation(&err) {
            UserRegistrationError::EmailTaken
        } else {
            err.into()
        }
    })?;

    info!(user_id = user.id, "registered new user");

    let token = sessions.create(user.id).await?;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, session_cookie(&token, sessions.lifespan()))],
        Json(user.into()),
    ))
}
