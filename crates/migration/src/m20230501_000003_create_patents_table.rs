use db::patent::Status;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Patents::Table)
                    .col(
                        ColumnDef::new(Patents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Patents::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Patents::Title).string().not_null())
                    .col(ColumnDef::new(Patents::Description).text().not_null())
                    .col(ColumnDef::new(Patents::Category).small_integer())
                    .col(
                        ColumnDef::new(Patents::Status)
                            .small_integer()
                            .not_null()
                            .default(Status::INITIAL),
                    )
                    .col(ColumnDef::new(Patents::PatentNumber).string())
                    .col(ColumnDef::new(Patents::EstimatedValue).big_integer())
                    .col(ColumnDef::new(Patents::FiledAt).timestamp())
                    .col(ColumnDef::new(Patents::ApprovedAt).timestamp())
                    .col(ColumnDef::new(Patents::ExpiresAt).timestamp())
                    .col(ColumnDef::new(Patents::LedgerTopicId).string())
                    .col(ColumnDef::new(Patents::LedgerMessageId).string())
                    .col(ColumnDef::new(Patents::NftTokenId).string())
                    .col(ColumnDef::new(Patents::ContentHash).string())
                    .col(
                        ColumnDef::new(Patents::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(Patents::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Patents::Table, Patents::UserId)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("user_id_patents_idx")
                    .table(Patents::Table)
                    .col(Patents::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Patents::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum Patents {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Category,
    Status,
    PatentNumber,
    EstimatedValue,
    FiledAt,
    ApprovedAt,
    ExpiresAt,
    LedgerTopicId,
    LedgerMessageId,
    NftTokenId,
    ContentHash,
    CreatedAt,
    UpdatedAt,
}
