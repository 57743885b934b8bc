//! User session.
//!
//! Session tokens are handed to browsers as cookies. Only a keyed hash of a
//! token is stored, so a leaked table can't be used to impersonate users.
//!
//! Sessions stay valid for a configured lifespan counted from their creation,
//! after which they are rejected and removed.

use rand::{
    distributions::{Alphanumeric, DistString},
    thread_rng,
};
use sea_orm::entity::prelude::*;

pub const TOKEN_LENGTH: usize = 64;

/// Session model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Unique session identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Related user identifier.
    pub user_id: i64,

    /// Keyed hash of the session token.
    #[sea_orm(unique)]
    pub token_hash: String,

    /// Session creation timestamp.
    pub created_at: TimeDateTime,
}

/// Session model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Generate new random session token.
///
/// ## Example
///
/// ```
/// use db::session::{TOKEN_LENGTH, generate_token};
///
/// assert_eq!(generate_token().len(), TOKEN_LENGTH);
/// ```
pub fn generate_token() -> String {
    Alphanumeric.sample_string(&mut thread_rng(), TOKEN_LENGTH)
}
