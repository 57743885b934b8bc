use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PatentDocuments::Table)
                    .col(
                        ColumnDef::new(PatentDocuments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PatentDocuments::PatentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PatentDocuments::Filename).string().not_null())
                    .col(
                        ColumnDef::new(PatentDocuments::StoragePath)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PatentDocuments::FileSize)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PatentDocuments::MimeType).string().not_null())
                    .col(
                        ColumnDef::new(PatentDocuments::ContentHash)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PatentDocuments::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PatentDocuments::Table, PatentDocuments::PatentId)
                            .to(crate::Patents::Table, crate::Patents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PatentDocuments::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum PatentDocuments {
    Table,
    Id,
    PatentId,
    Filename,
    StoragePath,
    FileSize,
    MimeType,
    ContentHash,
    CreatedAt,
}
