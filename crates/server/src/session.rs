//! Server-side session storage.
//!
//! Browsers receive a random session token in a cookie. The token itself is
//! never stored: sessions are looked up by a keyed hash of the token.

use std::sync::Arc;

use async_trait::async_trait;
use common::{config, hash};
use db::{
    session, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter,
};
use time::Duration;
use tracing::debug;

/// Session storage used by the authentication layer.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a new session of the provided user, returning its token.
    async fn create(&self, user_id: i64) -> Result<String, DbErr>;

    /// Find user identifier of a valid session with the provided token.
    async fn resolve(&self, token: &str) -> Result<Option<i64>, DbErr>;

    /// Destroy session with the provided token.
    async fn destroy(&self, token: &str) -> Result<(), DbErr>;

    /// Session lifespan, in seconds.
    fn lifespan(&self) -> u64;
}

/// Shared session storage handle.
pub type Sessions = Arc<dyn SessionStore>;

/// Session storage backed by the `sessions` table.
pub struct DatabaseSessionStore {
    db: Arc<DatabaseConnection>,
    secret: String,
    lifespan: u64,
}

impl DatabaseSessionStore {
    pub fn new(db: Arc<DatabaseConnection>, config: &config::Session) -> Self {
        Self {
            db,
            secret: config.secret.clone(),
            lifespan: config.lifespan,
        }
    }

    fn token_hash(&self, token: &str) -> String {
        hash::keyed_blake2_hex(self.secret.as_bytes(), token.as_bytes())
    }
}

#[async_trait]
impl SessionStore for DatabaseSessionStore {
    async fn create(&self, user_id: i64) -> Result<String, DbErr> {
        let token = session::generate_token();

        session::Entity::insert(session::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            token_hash: ActiveValue::Set(self.token_hash(&token)),
            created_at: ActiveValue::Set(db::now()),
            ..Default::default()
        })
        .exec_without_returning(&*self.db)
        .await?;

        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<i64>, DbErr> {
        let Some(model) = session::Entity::find()
            .filter(session::Column::TokenHash.eq(self.token_hash(token)))
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let lifespan = Duration::seconds(self.lifespan.try_into().unwrap_or(i64::MAX));

        if model.created_at.saturating_add(lifespan) < db::now() {
            debug!(session_id = model.id, "removing expired session");
            model.delete(&*self.db).await?;
            return Ok(None);
        }

        Ok(Some(model.user_id))
    }

    async fn destroy(&self, token: &str) -> Result<(), DbErr> {
        session::Entity::delete_many()
            .filter(session::Column::TokenHash.eq(self.token_hash(token)))
            .exec(&*self.db)
            .await?;

        Ok(())
    }

    fn lifespan(&self) -> u64 {
        self.lifespan
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::config::Session;
    use db::{session, ActiveValue, EntityTrait, PaginatorTrait, PrimitiveDateTime};
    use time::macros::datetime;

    use super::{DatabaseSessionStore, SessionStore};
    use crate::testing::{create_database, create_user};

    #[tokio::test]
    async fn create_resolve_destroy() {
        let db = Arc::new(create_database().await);
        let user_id = create_user(&db, "alice@example.com").await;

        let store = DatabaseSessionStore::new(
            db.clone(),
            &Session {
                secret: String::from("secret"),
                lifespan: 3600,
            },
        );

        let token = store.create(user_id).await.unwrap();

        assert_eq!(store.resolve(&token).await.unwrap(), Some(user_id));
        assert_eq!(store.resolve("unknown").await.unwrap(), None);

        let stored = session::Entity::find().one(&*db).await.unwrap().unwrap();
        assert_ne!(stored.token_hash, token);

        store.destroy(&token).await.unwrap();

        assert_eq!(store.resolve(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_session() {
        let db = Arc::new(create_database().await);
        let user_id = create_user(&db, "alice@example.com").await;

        let store = DatabaseSessionStore::new(
            db.clone(),
            &Session {
                secret: String::from("secret"),
                lifespan: 60,
            },
        );

        let token = store.create(user_id).await.unwrap();

        let created_at: PrimitiveDateTime = datetime!(2020-01-01 00:00);

        session::Entity::update_many()
            .set(session::ActiveModel {
                created_at: ActiveValue::Set(created_at),
                ..Default::default()
            })
            .exec(&*db)
            .await
            .unwrap();

        assert_eq!(store.resolve(&token).await.unwrap(), None);
        assert_eq!(session::Entity::find().count(&*db).await.unwrap(), 0);
    }
}
