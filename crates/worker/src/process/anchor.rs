use common::{
    hash,
    ledger::{Anchor, AnchoredHash},
};
use db::{
    blockchain_transaction, patent, patent_activity, task, ActiveModelTrait, ActiveValue,
    ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    TransactionErrorExt, TransactionTrait,
};
use tracing::info;

use super::worker::TaskError;

/// Anchor the patent content hash on the ledger.
///
/// Both successful and failed ledger submissions are recorded as blockchain
/// transactions. On success, ledger identifiers and the anchored hash are
/// stored on the patent.
///
/// A confirmed submission of the same hash is reused instead of being
/// submitted again.
pub(crate) async fn run(
    db: &DatabaseConnection,
    anchor: &Anchor,
    task: &task::Model,
) -> Result<(), TaskError> {
    let payload: task::AnchorPayload = serde_json::from_str(&task.payload)?;

    let patent = patent::Entity::find_by_id(task.patent_id)
        .one(db)
        .await?
        .ok_or(TaskError::MissingPatent)?;

    let anchored = match confirmed_submission(db, patent.id, payload.content.as_bytes()).await? {
        Some(anchored) => anchored,
        None => submit(db, anchor, patent.id, payload.content.as_bytes()).await?,
    };

    let patent = db
        .transaction::<_, _, TaskError>(|txn| {
            Box::pin(async move {
                let mut active = patent.into_active_model();
                active.ledger_topic_id = ActiveValue::Set(Some(anchored.topic_id));
                active.ledger_message_id = ActiveValue::Set(Some(anchored.message_id));
                active.content_hash = ActiveValue::Set(Some(anchored.hash));
                active.updated_at = ActiveValue::Set(db::now());
                let patent = active.update(txn).await?;

                patent_activity::Entity::insert(patent_activity::record(
                    &patent,
                    patent_activity::ActivityType::Anchored,
                    format!("Patent \"{}\" was anchored on the ledger", patent.title),
                ))
                .exec_without_returning(txn)
                .await?;

                Ok(patent)
            })
        })
        .await
        .into_raw_result()?;

    info!(patent_id = patent.id, hash = ?patent.content_hash, "patent anchored");

    Ok(())
}

/// Find a confirmed ledger submission of the payload hash.
async fn confirmed_submission(
    db: &DatabaseConnection,
    patent_id: i64,
    payload: &[u8],
) -> Result<Option<AnchoredHash>, TaskError> {
    let hash = hash::blake2_hex(payload);

    let transaction = blockchain_transaction::Entity::find()
        .filter(blockchain_transaction::Column::PatentId.eq(patent_id))
        .filter(
            blockchain_transaction::Column::TransactionType
                .eq(blockchain_transaction::TransactionType::HashStorage),
        )
        .filter(
            blockchain_transaction::Column::Status.eq(blockchain_transaction::Status::Confirmed),
        )
        .filter(blockchain_transaction::Column::Hash.eq(hash.as_str()))
        .order_by_desc(blockchain_transaction::Column::Id)
        .one(db)
        .await?;

    Ok(transaction.and_then(|transaction| {
        Some(AnchoredHash {
            topic_id: transaction.topic_id?,
            message_id: transaction.message_id?,
            hash,
        })
    }))
}

/// Submit the payload hash to the ledger and record the submission.
async fn submit(
    db: &DatabaseConnection,
    anchor: &Anchor,
    patent_id: i64,
    payload: &[u8],
) -> Result<AnchoredHash, TaskError> {
    let anchored = match anchor.store_hash(patent_id, payload).await {
        Ok(anchored) => anchored,
        Err(err) => {
            blockchain_transaction::Entity::insert(blockchain_transaction::ActiveModel {
                patent_id: ActiveValue::Set(patent_id),
                transaction_type: ActiveValue::Set(
                    blockchain_transaction::TransactionType::HashStorage,
                ),
                status: ActiveValue::Set(blockchain_transaction::Status::Failed),
                error: ActiveValue::Set(Some(err.to_string())),
                ..Default::default()
            })
            .exec_without_returning(db)
            .await?;

            return Err(err.into());
        }
    };

    blockchain_transaction::Entity::insert(blockchain_transaction::ActiveModel {
        patent_id: ActiveValue::Set(patent_id),
        transaction_type: ActiveValue::Set(blockchain_transaction::TransactionType::HashStorage),
        status: ActiveValue::Set(blockchain_transaction::Status::Confirmed),
        topic_id: ActiveValue::Set(Some(anchored.topic_id.clone())),
        message_id: ActiveValue::Set(Some(anchored.message_id.clone())),
        hash: ActiveValue::Set(Some(anchored.hash.clone())),
        ..Default::default()
    })
    .exec_without_returning(db)
    .await?;

    Ok(anchored)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::{
        ai::Analyst,
        config, hash,
        ledger::{Anchor, LocalLedger},
    };
    use db::{blockchain_transaction, patent, patent_activity, task, ActiveValue, EntityTrait};

    use crate::{
        process::worker::Processor,
        testing::{create_database, create_patent, enqueue, FailingLedger, StubModel},
    };

    #[tokio::test]
    async fn anchor() {
        let db = create_database().await;
        let created = create_patent(&db).await;
        enqueue(
            &db,
            created.id,
            task::Kind::AnchorHash,
            r#"{"content":"Wind turbine\nSilent blades"}"#,
        )
        .await;

        let ledger = Arc::new(LocalLedger::new());
        let anchor = Anchor::new(ledger, None);

        let processor = Processor::new(
            config::Worker::default(),
            Analyst::new(Arc::new(StubModel(None))),
            anchor.clone(),
        );

        assert!(processor.process_next(&db).await.unwrap());

        let stored = patent::Entity::find_by_id(created.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        let expected_hash = hash::blake2_hex(b"Wind turbine\nSilent blades");

        assert_eq!(stored.content_hash.as_deref(), Some(expected_hash.as_str()));

        let topic_id = stored.ledger_topic_id.unwrap();
        let message_id = stored.ledger_message_id.unwrap();

        assert!(anchor
            .verify_hash(&topic_id, &message_id, &expected_hash)
            .await
            .unwrap());

        let transactions = blockchain_transaction::Entity::find().all(&db).await.unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(
            transactions[0].status,
            blockchain_transaction::Status::Confirmed
        );
        assert_eq!(transactions[0].hash.as_deref(), Some(expected_hash.as_str()));

        let activities = patent_activity::Entity::find().all(&db).await.unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(
            activities[0].activity_type,
            patent_activity::ActivityType::Anchored
        );

        let tasks = task::Entity::find().all(&db).await.unwrap();

        assert_eq!(tasks[0].status, task::Status::Completed);
        assert!(tasks[0].processed_at.is_some());
    }

    #[tokio::test]
    async fn ledger_failure() {
        let db = create_database().await;
        let created = create_patent(&db).await;
        enqueue(
            &db,
            created.id,
            task::Kind::AnchorHash,
            r#"{"content":"Wind turbine"}"#,
        )
        .await;

        let processor = Processor::new(
            config::Worker::default(),
            Analyst::new(Arc::new(StubModel(None))),
            Anchor::new(Arc::new(FailingLedger), None),
        );

        assert!(processor.process_next(&db).await.unwrap());

        let transactions = blockchain_transaction::Entity::find().all(&db).await.unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].status, blockchain_transaction::Status::Failed);
        assert!(transactions[0].error.is_some());

        let stored = patent::Entity::find_by_id(created.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert!(stored.content_hash.is_none());
        assert!(patent_activity::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn reuses_confirmed_submission() {
        let db = create_database().await;
        let created = create_patent(&db).await;
        let task_id = enqueue(
            &db,
            created.id,
            task::Kind::AnchorHash,
            r#"{"content":"Wind turbine"}"#,
        )
        .await;

        let expected_hash = hash::blake2_hex(b"Wind turbine");

        blockchain_transaction::Entity::insert(blockchain_transaction::ActiveModel {
            patent_id: ActiveValue::Set(created.id),
            transaction_type: ActiveValue::Set(
                blockchain_transaction::TransactionType::HashStorage,
            ),
            status: ActiveValue::Set(blockchain_transaction::Status::Confirmed),
            topic_id: ActiveValue::Set(Some(String::from("0.0.1001"))),
            message_id: ActiveValue::Set(Some(String::from("1"))),
            hash: ActiveValue::Set(Some(expected_hash.clone())),
            ..Default::default()
        })
        .exec_without_returning(&db)
        .await
        .unwrap();

        let processor = Processor::new(
            config::Worker::default(),
            Analyst::new(Arc::new(StubModel(None))),
            Anchor::new(Arc::new(FailingLedger), None),
        );

        assert!(processor.process_next(&db).await.unwrap());

        let task = task::Entity::find_by_id(task_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(task.status, task::Status::Completed);

        let stored = patent::Entity::find_by_id(created.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.ledger_topic_id.as_deref(), Some("0.0.1001"));
        assert_eq!(stored.ledger_message_id.as_deref(), Some("1"));
        assert_eq!(stored.content_hash, Some(expected_hash));

        let transactions = blockchain_transaction::Entity::find().all(&db).await.unwrap();

        assert_eq!(transactions.len(), 1);
    }
}
