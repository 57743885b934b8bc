//! Recorded AI analysis.
//!
//! Analyses are append-only: a new row is recorded for every analysis attempt
//! and existing rows are never updated. Failed attempts made by the outbox
//! worker are recorded too, with an empty result and the failure reason.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// AI analysis model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ai_analyses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub patent_id: i64,
    pub analysis_type: AnalysisType,

    /// JSON-encoded analysis result.
    #[sea_orm(column_type = "Text")]
    pub result: String,

    /// Confidence of the analysis result, between 0 and 1.
    pub confidence: f64,

    /// Failure reason, if the analysis attempt failed.
    pub error: Option<String>,

    pub created_at: TimeDateTime,
}

/// Analysis type.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[sea_orm(num_value = 0)]
    PriorArt,
    #[sea_orm(num_value = 1)]
    Valuation,
    #[sea_orm(num_value = 2)]
    Similarity,
    #[sea_orm(num_value = 3)]
    Classification,
}

/// AI analysis model relations.
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
