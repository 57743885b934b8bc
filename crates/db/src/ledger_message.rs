//! Message stored by the database-backed development ledger.

use sea_orm::entity::prelude::*;

/// Ledger message model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_messages")]
pub struct Model {
    /// Message identifier, unique across all topics.
    #[sea_orm(primary_key)]
    pub id: i64,

    pub topic_id: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
