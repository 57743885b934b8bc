use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PriorArtResults::Table)
                    .col(
                        ColumnDef::new(PriorArtResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PriorArtResults::PatentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PriorArtResults::ExternalPatentId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PriorArtResults::Title).string().not_null())
                    .col(ColumnDef::new(PriorArtResults::Description).text().not_null())
                    .col(
                        ColumnDef::new(PriorArtResults::SimilarityScore)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PriorArtResults::Source).string().not_null())
                    .col(
                        ColumnDef::new(PriorArtResults::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PriorArtResults::Table, PriorArtResults::PatentId)
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
            .drop_table(Table::drop().table(PriorArtResults::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum PriorArtResults {
    Table,
    Id,
    PatentId,
    ExternalPatentId,
    Title,
    Description,
    SimilarityScore,
    Source,
    CreatedAt,
}
