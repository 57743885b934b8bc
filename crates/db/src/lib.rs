pub mod ai_analysis;
pub mod blockchain_transaction;
#[cfg(feature = "ledger")]
pub mod ledger;
pub mod ledger_message;
pub mod patent;
pub mod patent_activity;
pub mod patent_document;
pub mod prior_art_result;
pub mod session;
pub mod stats;
pub mod task;
pub mod user;

use std::error::Error;

use async_trait::async_trait;
use sea_orm::RuntimeErr;
pub use sea_orm::{
    sea_query, ActiveEnum, ActiveModelTrait, ActiveValue, ColumnTrait, Condition,
    ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, FromQueryResult, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, StatementBuilder, TransactionError, TransactionTrait,
    TryGetableMany,
};
pub use time::{OffsetDateTime, PrimitiveDateTime};

/// Get current UTC time in a form suitable for timestamp columns.
pub fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();

    PrimitiveDateTime::new(now.date(), now.time())
}

/// Check if a query failed because of a unique constraint violation.
pub fn is_unique_violation(err: &DbErr) -> bool {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(err)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(err))) => {
            // PostgreSQL `unique_violation`, SQLite `SQLITE_CONSTRAINT_UNIQUE`
            // and `SQLITE_CONSTRAINT_PRIMARYKEY`.
            matches!(err.code().as_deref(), Some("23505" | "2067" | "1555"))
        }
        _ => false,
    }
}

pub trait TransactionErrorExt<T, E> {
    /// Convert transaction [`Result`] into a [`Result`] with
    /// a custom error.
    fn into_raw_result(self) -> Result<T, E>;
}

impl<T, E> TransactionErrorExt<T, E> for Result<T, TransactionError<E>>
where
    E: Error + From<DbErr>,
{
    fn into_raw_result(self) -> Result<T, E> {
        match self {
            Ok(val) => Ok(val),
            Err(TransactionError::Connection(err)) => Err(err.into()),
            Err(TransactionError::Transaction(err)) => Err(err),
        }
    }
}

#[async_trait]
pub trait SelectExt {
    /// Check if at least one record that satisfies a query.
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr>;
}

#[async_trait]
impl<T> SelectExt for T
where
    T: QueryTrait<QueryStatement = sea_query::SelectStatement> + Send,
{
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr> {
        use sea_query::{Expr, Query};

        let mut query = self.into_query();

        // Fix failing tests with SQLite by returning at least some expr
        query.expr(1);

        let stmt = StatementBuilder::build(
            Query::select().expr(Expr::exists(query)),
            &db.get_database_backend(),
        );

        db.query_one(stmt).await?.unwrap().try_get_by_index(0)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{
        prelude::*,
        sea_query::{self, ColumnDef, Iden, Table},
        Database, QuerySelect,
    };

    use crate::{is_unique_violation, SelectExt};

    #[derive(Iden)]
    enum TestVals {
        Table,
        Id,
    }

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "test_vals")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    #[tokio::test]
    async fn exists() {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("unable to create test database");

        let table = Table::create()
            .table(TestVals::Table)
            .col(
                ColumnDef::new(TestVals::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .to_owned();

        let builder = db.get_database_backend();
        db.execute(builder.build(&table)).await.unwrap();

        let exists = Entity::find().select_only().exists(&db).await.unwrap();

        assert!(!exists);

        Entity::insert(<ActiveModel as std::default::Default>::default())
            .exec_without_returning(&db)
            .await
            .unwrap();

        let exists = Entity::find().select_only().exists(&db).await.unwrap();

        assert!(exists);
    }

    #[tokio::test]
    async fn unique_violation() {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("unable to create test database");

        let table = Table::create()
            .table(TestVals::Table)
            .col(ColumnDef::new(TestVals::Id).integer().not_null().primary_key())
            .to_owned();

        let builder = db.get_database_backend();
        db.execute(builder.build(&table)).await.unwrap();

        let row = ActiveModel {
            id: sea_orm::ActiveValue::Set(1),
        };

        Entity::insert(row.clone())
            .exec_without_returning(&db)
            .await
            .unwrap();

        let err = Entity::insert(row)
            .exec_without_returning(&db)
            .await
            .unwrap_err();

        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&DbErr::RecordNotFound(String::from(
            "test_vals"
        ))));
    }
}
