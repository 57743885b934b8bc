use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PatentActivities::Table)
                    .col(
                        ColumnDef::new(PatentActivities::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PatentActivities::PatentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PatentActivities::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PatentActivities::ActivityType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PatentActivities::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PatentActivities::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PatentActivities::Table, PatentActivities::PatentId)
                            .to(crate::Patents::Table, crate::Patents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PatentActivities::Table, PatentActivities::UserId)
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
                    .name("user_id_created_at_patent_activities_idx")
                    .table(PatentActivities::Table)
                    .col(PatentActivities::UserId)
                    .col(PatentActivities::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PatentActivities::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum PatentActivities {
    Table,
    Id,
    PatentId,
    UserId,
    ActivityType,
    Description,
    CreatedAt,
}
