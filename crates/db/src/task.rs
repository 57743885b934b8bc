//! Outbox task.
//!
//! Tasks are enqueued in the same transaction as the patent write they
//! originate from, and are later picked up by the worker. A failed task is
//! rescheduled until it runs out of attempts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outbox task model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub patent_id: i64,
    pub kind: Kind,

    /// JSON-encoded task payload.
    #[sea_orm(column_type = "Text")]
    pub payload: String,

    pub status: Status,

    /// Count of started processing attempts.
    pub attempts: i32,

    pub last_error: Option<String>,

    /// Earliest time the task may be processed at.
    pub scheduled_at: TimeDateTime,

    pub created_at: TimeDateTime,
    pub processed_at: Option<TimeDateTime>,
}

/// Task kind.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Anchor the patent content hash on the ledger.
    #[sea_orm(num_value = 0)]
    AnchorHash,

    /// Classify the patent and search for prior art.
    #[sea_orm(num_value = 1)]
    AnalyzePatent,
}

/// Task status.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(num_value = 0)]
    Pending,
    #[sea_orm(num_value = 1)]
    Completed,
    #[sea_orm(num_value = 2)]
    Failed,
}

/// Payload of an [`Kind::AnchorHash`] task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPayload {
    /// Data whose hash is anchored: title, description and document hashes.
    pub content: String,
}

/// Payload of an [`Kind::AnalyzePatent`] task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzePayload {
    pub description: String,
}

/// Task model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patent::Entity",
        from = "Column::PatentId",
        to = "super::patent::Column::Id"
    )]
    Patent,
}

impl Related<super::patent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
