//! Development ledger stored in the application database.
//!
//! Messages are kept in the `ledger_messages` table, so every process
//! connected to the same database sees the same ledger. Message identifiers
//! are row identifiers and are unique across topics.

use async_trait::async_trait;
use common::ledger::{Error, Ledger, Nft, Receipt};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, TransactionTrait,
};

use crate::{ledger_message, TransactionErrorExt};

/// Topic holding minted token metadata.
pub const TOKEN_ID: &str = "0.0.5000";

/// Ledger backed by the `ledger_messages` table.
pub struct DatabaseLedger {
    db: DatabaseConnection,
}

impl DatabaseLedger {
    /// Create new [`DatabaseLedger`] using the provided connection.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn append<C: ConnectionTrait>(
    db: &C,
    topic_id: &str,
    message: &str,
) -> Result<ledger_message::Model, DbErr> {
    ledger_message::ActiveModel {
        topic_id: ActiveValue::Set(topic_id.to_string()),
        message: ActiveValue::Set(message.to_string()),
        created_at: ActiveValue::Set(crate::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

fn storage_error(err: DbErr) -> Error {
    Error::Storage(err.to_string())
}

#[async_trait]
impl Ledger for DatabaseLedger {
    async fn submit_message(
        &self,
        topic_id: Option<&str>,
        message: &str,
    ) -> Result<Receipt, Error> {
        let stored = match topic_id {
            Some(topic_id) => append(&self.db, topic_id, message)
                .await
                .map_err(storage_error)?,
            None => {
                let message = message.to_string();

                self.db
                    .transaction::<_, _, DbErr>(|txn| {
                        Box::pin(async move {
                            let stored = append(txn, "", &message).await?;
                            let topic_id = format!("0.0.{}", 1000 + stored.id);

                            let mut stored = stored.into_active_model();
                            stored.topic_id = ActiveValue::Set(topic_id);
                            stored.update(txn).await
                        })
                    })
                    .await
                    .into_raw_result()
                    .map_err(storage_error)?
            }
        };

        Ok(Receipt {
            topic_id: stored.topic_id,
            message_id: stored.id.to_string(),
        })
    }

    async fn message(&self, topic_id: &str, message_id: &str) -> Result<Option<String>, Error> {
        let Ok(id) = message_id.parse::<i64>() else {
            return Ok(None);
        };

        let message = ledger_message::Entity::find_by_id(id)
            .filter(ledger_message::Column::TopicId.eq(topic_id))
            .one(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(message.map(|message| message.message))
    }

    async fn mint_token(&self, metadata: &str) -> Result<Nft, Error> {
        let stored = append(&self.db, TOKEN_ID, metadata)
            .await
            .map_err(storage_error)?;

        Ok(Nft {
            token_id: TOKEN_ID.to_string(),
            serial_number: stored.id,
            transaction_id: format!("{TOKEN_ID}@{}", stored.id),
        })
    }
}
