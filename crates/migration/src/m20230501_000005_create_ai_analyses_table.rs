use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AiAnalyses::Table)
                    .col(
                        ColumnDef::new(AiAnalyses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AiAnalyses::PatentId).big_integer().not_null())
                    .col(
                        ColumnDef::new(AiAnalyses::AnalysisType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AiAnalyses::Result).text().not_null())
                    .col(
                        ColumnDef::new(AiAnalyses::Confidence)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(AiAnalyses::Error).text())
                    .col(
                        ColumnDef::new(AiAnalyses::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AiAnalyses::Table, AiAnalyses::PatentId)
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
            .drop_table(Table::drop().table(AiAnalyses::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum AiAnalyses {
    Table,
    Id,
    PatentId,
    AnalysisType,
    Result,
    Confidence,
    Error,
    CreatedAt,
}
