use std::{error::Error, sync::Arc};

use axum::{async_trait, Router};
use common::{
    ai::{Analyst, ChatModel, Error as ModelError, Prompt},
    config::Config,
    ledger::{self, Anchor, Ledger, LocalLedger, Nft, Receipt},
};
use db::{patent, user, ActiveValue, Database, DatabaseConnection, EntityTrait};
use hyper::body::{self, Bytes, HttpBody};
use migration::MigratorTrait;
use serde::Serialize;

use crate::{
    auth::session_cookie,
    session::{DatabaseSessionStore, SessionStore},
};

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

/// Create an application router with an unconfigured language model and a local ledger.
pub(crate) fn app(db: DatabaseConnection) -> Router {
    app_with_model(db, None)
}

/// Create an application router with a stub language model.
pub(crate) fn app_with_model(db: DatabaseConnection, reply: Option<&'static str>) -> Router {
    build_app(db, reply, Arc::new(LocalLedger::new()))
}

/// Create an application router backed by the provided ledger.
pub(crate) fn app_with_ledger(db: DatabaseConnection, ledger: Arc<dyn Ledger>) -> Router {
    build_app(db, None, ledger)
}

fn build_app(
    db: DatabaseConnection,
    reply: Option<&'static str>,
    ledger: Arc<dyn Ledger>,
) -> Router {
    crate::app_router(
        Arc::new(db),
        Arc::new(Config::for_tests()),
        Analyst::new(Arc::new(StubModel(reply))),
        Anchor::new(ledger, None),
    )
}

pub(crate) async fn create_user(db: &DatabaseConnection, email: &str) -> i64 {
    user::Entity::insert(user::ActiveModel {
        email: ActiveValue::Set(email.to_string()),
        first_name: ActiveValue::Set(String::from("Test")),
        last_name: ActiveValue::Set(String::from("User")),
        password_hash: ActiveValue::Set(String::new()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create user")
    .id
}

/// Start a session of the provided user and return a matching `Cookie` header value.
pub(crate) async fn login(db: &DatabaseConnection, user_id: i64) -> String {
    let config = Config::for_tests();

    let store = DatabaseSessionStore::new(Arc::new(db.clone()), &config.session);

    let token = store
        .create(user_id)
        .await
        .expect("unable to create session");

    let cookie = session_cookie(&token, config.session.lifespan);

    cookie
        .split(';')
        .next()
        .expect("empty cookie")
        .to_string()
}

pub(crate) async fn create_patent(
    db: &DatabaseConnection,
    user_id: i64,
    model: patent::ActiveModel,
) -> patent::Model {
    patent::Entity::insert(patent::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        ..model
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create patent")
}

/// Patent fields used by most tests.
pub(crate) fn patent_model(title: &str, category: Option<patent::Category>) -> patent::ActiveModel {
    patent::ActiveModel {
        title: ActiveValue::Set(title.to_string()),
        description: ActiveValue::Set(format!("{title} description")),
        category: ActiveValue::Set(category),
        status: ActiveValue::Set(patent::Status::Pending),
        ..Default::default()
    }
}

pub(crate) trait RequestBodyExt: Sized {
    fn from_json<B: Serialize>(val: B) -> Self;
}

impl<T> RequestBodyExt for T
where
    T: HttpBody + From<Vec<u8>>,
{
    fn from_json<B: Serialize>(val: B) -> Self {
        T::from(serde_json::to_vec(&val).expect("unable to serialize"))
    }
}

#[async_trait(?Send)]
pub(crate) trait ResponseBodyExt {
    async fn bytes(self) -> Bytes;

    async fn text(self) -> String;

    async fn json(self) -> serde_json::Value;
}

#[async_trait(?Send)]
impl<T> ResponseBodyExt for T
where
    T: HttpBody,
    T::Error: Error,
{
    async fn bytes(self) -> Bytes {
        body::to_bytes(self)
            .await
            .expect("unable to convert to bytes")
    }

    async fn text(self) -> String {
        String::from_utf8(self.bytes().await.to_vec()).expect("unable to convert to text")
    }

    async fn json(self) -> serde_json::Value {
        serde_json::from_slice(&self.bytes().await).expect("unable to convert to json")
    }
}
