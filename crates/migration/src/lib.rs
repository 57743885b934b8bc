pub use sea_orm_migration::prelude::*;

mod m20230501_000001_create_users_table;
mod m20230501_000002_create_sessions_table;
mod m20230501_000003_create_patents_table;
mod m20230501_000004_create_patent_documents_table;
mod m20230501_000005_create_ai_analyses_table;
mod m20230501_000006_create_prior_art_results_table;
mod m20230501_000007_create_blockchain_transactions_table;
mod m20230501_000008_create_patent_activities_table;
mod m20230501_000009_create_tasks_table;
mod m20230501_000010_create_ledger_messages_table;

pub(crate) use m20230501_000001_create_users_table::Users;
pub(crate) use m20230501_000003_create_patents_table::Patents;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230501_000001_create_users_table::Migration),
            Box::new(m20230501_000002_create_sessions_table::Migration),
            Box::new(m20230501_000003_create_patents_table::Migration),
            Box::new(m20230501_000004_create_patent_documents_table::Migration),
            Box::new(m20230501_000005_create_ai_analyses_table::Migration),
            Box::new(m20230501_000006_create_prior_art_results_table::Migration),
            Box::new(m20230501_000007_create_blockchain_transactions_table::Migration),
            Box::new(m20230501_000008_create_patent_activities_table::Migration),
            Box::new(m20230501_000009_create_tasks_table::Migration),
            Box::new(m20230501_000010_create_ledger_messages_table::Migration),
        ]
    }
}
