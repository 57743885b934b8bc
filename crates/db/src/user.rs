//! Registered user.
//!
//! Users register with an email address and a password. Only an Argon2
//! hash of the password is stored, and it never leaves the API server.

use sea_orm::entity::prelude::*;

/// User model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub created_at: TimeDateTime,
    pub updated_at: TimeDateTime,
}

/// User model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,

    #[sea_orm(has_many = "super::patent::Entity")]
    Patents,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::patent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
