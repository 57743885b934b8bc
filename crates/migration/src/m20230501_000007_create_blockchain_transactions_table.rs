use db::blockchain_transaction::Status;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlockchainTransactions::Table)
                    .col(
                        ColumnDef::new(BlockchainTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BlockchainTransactions::PatentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BlockchainTransactions::TransactionType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BlockchainTransactions::Status)
                            .small_integer()
                            .not_null()
                            .default(Status::Pending),
                    )
                    .col(ColumnDef::new(BlockchainTransactions::TopicId).string())
                    .col(ColumnDef::new(BlockchainTransactions::MessageId).string())
                    .col(ColumnDef::new(BlockchainTransactions::TokenId).string())
                    .col(ColumnDef::new(BlockchainTransactions::TransactionId).string())
                    .col(ColumnDef::new(BlockchainTransactions::Hash).string())
                    .col(ColumnDef::new(BlockchainTransactions::Error).text())
                    .col(
                        ColumnDef::new(BlockchainTransactions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                BlockchainTransactions::Table,
                                BlockchainTransactions::PatentId,
                            )
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
            .drop_table(Table::drop().table(BlockchainTransactions::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum BlockchainTransactions {
    Table,
    Id,
    PatentId,
    TransactionType,
    Status,
    TopicId,
    MessageId,
    TokenId,
    TransactionId,
    Hash,
    Error,
    CreatedAt,
}
