use db::task::Status;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .col(
                        ColumnDef::new(Tasks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tasks::PatentId).big_integer().not_null())
                    .col(ColumnDef::new(Tasks::Kind).small_integer().not_null())
                    .col(ColumnDef::new(Tasks::Payload).text().not_null())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .small_integer()
                            .not_null()
                            .default(Status::Pending),
                    )
                    .col(
                        ColumnDef::new(Tasks::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Tasks::LastError).text())
                    .col(
                        ColumnDef::new(Tasks::ScheduledAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(Tasks::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(ColumnDef::new(Tasks::ProcessedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Tasks::Table, Tasks::PatentId)
                            .to(crate::Patents::Table, crate::Patents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("status_scheduled_at_tasks_idx")
                    .table(Tasks::Table)
                    .col(Tasks::Status)
                    .col(Tasks::ScheduledAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    PatentId,
    Kind,
    Payload,
    Status,
    Attempts,
    LastError,
    ScheduledAt,
    CreatedAt,
    ProcessedAt,
}
