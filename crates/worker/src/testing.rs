use async_trait::async_trait;
use common::{
    ai::{ChatModel, Error as ModelError, Prompt},
    ledger::{self, Ledger, Nft, Receipt},
};
use db::{patent, task, user, ActiveValue, Database, DatabaseConnection, EntityTrait};
use migration::MigratorTrait;

/// Create an in-memory database with all migrations applied.
pub(crate) async fn create_database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("unable to create test database");

    migration::Migrator::up(&db, None)
        .await
        .expect("unable to run migrations");

    db
}

/// Language model that replies with a fixed message, or fails if none is provided.
pub(crate) struct StubModel(pub Option<&'static str>);

#[async_trait]
impl ChatModel for StubModel {
    async fn complete(&self, _: &Prompt<'_>) -> Result<String, ModelError> {
        self.0.map(String::from).ok_or(ModelError::EmptyResponse)
    }
}

/// Ledger that rejects every request.
pub(crate) struct FailingLedger;

#[async_trait]
impl Ledger for FailingLedger {
    async fn submit_message(&self, _: Option<&str>, _: &str) -> Result<Receipt, ledger::Error> {
        Err(ledger::Error::MissingGatewayUrl)
    }

    async fn message(&self, _: &str, _: &str) -> Result<Option<String>, ledger::Error> {
        Err(ledger::Error::MissingGatewayUrl)
    }

    async fn mint_token(&self, _: &str) -> Result<Nft, ledger::Error> {
        Err(ledger::Error::MissingGatewayUrl)
    }
}

/// Create a user with a single pending patent.
pub(crate) async fn create_patent(db: &DatabaseConnection) -> patent::Model {
    let user_id = user::Entity::insert(user::ActiveModel {
        email: ActiveValue::Set(String::from("alice@example.com")),
        first_name: ActiveValue::Set(String::from("Test")),
        last_name: ActiveValue::Set(String::from("User")),
        password_hash: ActiveValue::Set(String::new()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create user")
    .id;

    patent::Entity::insert(patent::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        title: ActiveValue::Set(String::from("Wind turbine")),
        description: ActiveValue::Set(String::from("Silent blades")),
        status: ActiveValue::Set(patent::Status::Pending),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create patent")
}

/// Enqueue a task that is due immediately.
pub(crate) async fn enqueue(
    db: &DatabaseConnection,
    patent_id: i64,
    kind: task::Kind,
    payload: &str,
) -> i64 {
    let now = db::now();

    task::Entity::insert(task::ActiveModel {
        patent_id: ActiveValue::Set(patent_id),
        kind: ActiveValue::Set(kind),
        payload: ActiveValue::Set(payload.to_string()),
        status: ActiveValue::Set(task::Status::Pending),
        attempts: ActiveValue::Set(0),
        scheduled_at: ActiveValue::Set(now),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    })
    .exec(db)
    .await
    .expect("unable to enqueue task")
    .last_insert_id
}
