use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LedgerMessages::Table)
                    .col(
                        ColumnDef::new(LedgerMessages::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerMessages::TopicId).string().not_null())
                    .col(ColumnDef::new(LedgerMessages::Message).text().not_null())
                    .col(
                        ColumnDef::new(LedgerMessages::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("topic_id_ledger_messages_idx")
                    .table(LedgerMessages::Table)
                    .col(LedgerMessages::TopicId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerMessages::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum LedgerMessages {
    Table,
    Id,
    TopicId,
    Message,
    CreatedAt,
}
