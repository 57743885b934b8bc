use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_derive_error::ErrorResponse;
use db::{
    user, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use validator::Validate;

use super::UserData;
use crate::{auth::AuthenticatedUserId, validation::ValidatedJson};

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum UserProfileError {
    DatabaseError(DbErr),

    /// Session refers to a user that no longer exists.
    #[status(StatusCode::UNAUTHORIZED)]
    #[display(fmt = "user not found")]
    UserNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "user with this email already exists")]
    EmailTaken,
}

/// Get information about the current user.
pub(super) async fn details(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<UserData>, UserProfileError> {
    user::Entity::find_by_id(current_user.id())
        .one(&*db)
        .await?
        .map(|user| Json(user.into()))
        .ok_or(UserProfileError::UserNotFound)
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserUpdateRequest {
    #[validate(length(min = 1, message = "first name can't be empty"))]
    first_name: Option<String>,

    #[validate(length(min = 1, message = "last name can't be empty"))]
    last_name: Option<String>,

    #[validate(email(message = "invalid email address"))]
    email: Option<String>,
}

/// Update profile of the current user.
pub(super) async fn update(
    Extension(current_user): Extension<AuthenticatedUserId>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<UserUpdateRequest>,
) -> Result<Json<UserData>, UserProfileError> {
    db.transaction(|txn| {
        Box::pin(async move {
            let mut user = user::Entity::find_by_id(current_user.id())
                .one(txn)
                .await?
                .ok_or(UserProfileError::UserNotFound)?
                .into_active_model();

            if let Some(email) = request.email {
                let email_taken = user::Entity::find()
                    .select_only()
                    .filter(user::Column::Email.eq(&email))
                    .filter(user::Column::Id.ne(current_user.id()))
                    .exists(txn)
                    .await?;

                if email_taken {
                    return Err(UserProfileError::EmailTaken);
                }

                user.email = ActiveValue::Set(email);
            }

            if let Some(first_name) = request.first_name {
                user.first_name = ActiveValue::Set(first_name);
            }

            if let Some(last_name) = request.last_name {
                user.last_name = ActiveValue::Set(last_name);
            }

            user.updated_at = ActiveValue::Set(db::now());

            let user = user.update(txn).await.map_err(|err| {
                if db::is_unique_violation(&err) {
                    UserProfileError::EmailTaken
                } else {
                    err.into()
                }
            })?;

            Ok(Json(user.into()))
        })
    })
    .await
    .into_raw_result()
}
