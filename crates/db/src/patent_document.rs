//! Document uploaded alongside a patent filing.
//!
//! Document contents are stored outside of the database, keyed by their
//! content hash, so identical uploads share a single stored file.

use sea_orm::entity::prelude::*;

/// Patent document model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "patent_documents")]
pub struct Model {
    /// Unique document identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Related patent identifier.
    pub patent_id: i64,

    /// Original file name, as provided by the client.
    pub filename: String,

    /// Path of the stored file.
    pub storage_path: String,

    /// File size, in bytes.
    pub file_size: i64,

    /// MIME type provided by the client.
    pub mime_type: String,

    /// Hex-encoded blake2 hash of the file contents.
    pub content_hash: String,

    pub created_at: TimeDateTime,
}

/// Patent document model relations.
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
