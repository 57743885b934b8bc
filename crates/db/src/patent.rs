//! Filed patent.
//!
//! Every patent is owned by exactly one user. Documents, analyses, prior art
//! results, ledger transactions, activity records and outbox tasks are all
//! owned by their patent and are removed together with it.
//!
//! # Status lifecycle
//!
//! Patents move through the following statuses:
//!
//! ```text
//! draft -> pending -> under_review -> approved -> expired
//!                                  \-> rejected
//! ```
//!
//! Any other transition is rejected by [`Status::can_transition_to`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Upper bound of a patent's estimated value, in whole US dollars.
pub const MAX_ESTIMATED_VALUE: i64 = 1_000_000_000_000_000;

/// Placeholder token id held by a patent while its token is being minted.
pub const NFT_MINT_PENDING: &str = "pending";

/// Patent model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "patents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: Option<Category>,
    pub status: Status,
    pub patent_number: Option<String>,

    /// Estimated value, in whole US dollars.
    pub estimated_value: Option<i64>,

    pub filed_at: Option<TimeDateTime>,
    pub approved_at: Option<TimeDateTime>,
    pub expires_at: Option<TimeDateTime>,

    /// Ledger topic the content hash was anchored to.
    pub ledger_topic_id: Option<String>,

    /// Ledger message containing the anchored content hash.
    pub ledger_message_id: Option<String>,

    /// Identifier of the minted patent token.
    pub nft_token_id: Option<String>,

    /// Hex-encoded hash anchored on the ledger.
    pub content_hash: Option<String>,

    pub created_at: TimeDateTime,
    pub updated_at: TimeDateTime,
}

/// Patent status.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(num_value = 0)]
    Draft,
    #[sea_orm(num_value = 1)]
    Pending,
    #[sea_orm(num_value = 2)]
    UnderReview,
    #[sea_orm(num_value = 3)]
    Approved,
    #[sea_orm(num_value = 4)]
    Rejected,
    #[sea_orm(num_value = 5)]
    Expired,
}

impl Status {
    /// Status assigned to newly filed patents.
    pub const INITIAL: Status = Status::Pending;

    /// Check if a patent in the current status may be moved into the `next` one.
    ///
    /// Keeping the current status is always allowed.
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;

        self == next
            || matches!(
                (self, next),
                (Draft, Pending)
                    | (Pending, UnderReview)
                    | (UnderReview, Approved)
                    | (UnderReview, Rejected)
                    | (Approved, Expired)
            )
    }
}

/// Patent technology category.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[sea_orm(num_value = 0)]
    MedicalTechnology,
    #[sea_orm(num_value = 1)]
    SoftwareAi,
    #[sea_orm(num_value = 2)]
    RenewableEnergy,
    #[sea_orm(num_value = 3)]
    Manufacturing,
    #[sea_orm(num_value = 4)]
    Biotechnology,
    #[sea_orm(num_value = 5)]
    Automotive,
    #[sea_orm(num_value = 6)]
    Telecommunications,
    #[sea_orm(num_value = 7)]
    Other,
}

/// Patent model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(has_many = "super::patent_document::Entity")]
    Documents,

    #[sea_orm(has_many = "super::ai_analysis::Entity")]
    Analyses,

    #[sea_orm(has_many = "super::prior_art_result::Entity")]
    PriorArtResults,

    #[sea_orm(has_many = "super::blockchain_transaction::Entity")]
    BlockchainTransactions,

    #[sea_orm(has_many = "super::patent_activity::Entity")]
    Activities,

    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::patent_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::ai_analysis::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Analyses.def()
    }
}

impl Related<super::prior_art_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriorArtResults.def()
    }
}

impl Related<super::blockchain_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BlockchainTransactions.def()
    }
}

impl Related<super::patent_activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
