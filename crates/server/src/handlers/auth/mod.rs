/// User authentication route.
mod login;

/// Session termination route.
mod logout;

/// User registration route.
mod register;

/// Current user profile routes.
mod user;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use db::{user as user_entity, DatabaseConnection};
use serde::Serialize;

/// Create a router with public authentication routes.
pub(crate) fn routes() -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/login", post(login::login))
        .route("/register", post(register::register))
}

/// Create a router with authentication routes that require an active session.
pub(crate) fn protected_routes() -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/logout", post(logout::logout))
        .route("/user", get(user::details).put(user::update))
}

/// User information, without the password hash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserData {
    id: i64,
    email: String,
    first_name: String,
    last_name: String,

    /// Registration time, as a UNIX timestamp.
    created_at: i64,
}

impl From<user_entity::Model> for UserData {
    fn from(model: user_entity::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            created_at: model.created_at.assume_utc().unix_timestamp(),
        }
    }
}
