//! Patent activity feed.
//!
//! A single activity row is appended for each lifecycle event of a patent.
//! Activity rows are never updated.

use sea_orm::{entity::prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};

/// Patent activity model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "patent_activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub patent_id: i64,

    /// User whose patent the event happened to.
    pub user_id: i64,

    pub activity_type: ActivityType,

    /// Human-readable event description.
    pub description: String,

    pub created_at: TimeDateTime,
}

/// Lifecycle event kind.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(num_value = 0)]
    Created,
    #[sea_orm(num_value = 1)]
    Updated,
    #[sea_orm(num_value = 2)]
    ValuationUpdated,
    #[sea_orm(num_value = 3)]
    Anchored,
    #[sea_orm(num_value = 4)]
    NftMinted,
    #[sea_orm(num_value = 5)]
    DocumentRemoved,
}

/// Patent activity model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patent::Entity",
        from = "Column::PatentId",
        to = "super::patent::Column::Id"
    )]
    Patent,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::patent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patent.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Create an activity row describing an event of the provided patent.
pub fn record(
    patent: &super::patent::Model,
    activity_type: ActivityType,
    description: String,
) -> ActiveModel {
    ActiveModel {
        patent_id: ActiveValue::Set(patent.id),
        user_id: ActiveValue::Set(patent.user_id),
        activity_type: ActiveValue::Set(activity_type),
        description: ActiveValue::Set(description),
        ..Default::default()
    }
}
