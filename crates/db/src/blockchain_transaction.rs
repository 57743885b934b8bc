//! Ledger interaction audit trail.
//!
//! Every attempt to anchor a patent hash or to mint a patent token is
//! recorded, including the failed ones.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Blockchain transaction model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blockchain_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub patent_id: i64,
    pub transaction_type: TransactionType,
    pub status: Status,
    pub topic_id: Option<String>,
    pub message_id: Option<String>,
    pub token_id: Option<String>,
    pub transaction_id: Option<String>,

    /// Hex-encoded hash submitted to the ledger.
    pub hash: Option<String>,

    /// Failure reason for failed transactions.
    pub error: Option<String>,

    pub created_at: TimeDateTime,
}

/// Ledger interaction kind.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[sea_orm(num_value = 0)]
    HashStorage,
    #[sea_orm(num_value = 1)]
    NftMint,
}

/// Ledger interaction outcome.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(num_value = 0)]
    Pending,
    #[sea_orm(num_value = 1)]
    Confirmed,
    #[sea_orm(num_value = 2)]
    Failed,
}

/// Blockchain transaction model relations.
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
