use std::{sync::Arc, time::Duration};

use common::{ai, ai::Analyst, config, ledger, ledger::Anchor};
use db::{
    sea_query::{LockBehavior, LockType},
    task, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, TransactionErrorExt,
    TransactionTrait,
};
use derive_more::{Display, Error, From};
use tracing::{error, info, instrument, warn};

use super::{analysis, anchor};

/// Errors that may occur while running a single task.
#[derive(Debug, Display, Error, From)]
pub(crate) enum TaskError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Task payload can't be decoded.
    InvalidPayload(serde_json::Error),

    /// Ledger request failed.
    LedgerError(ledger::Error),

    /// Language model request failed.
    ModelError(ai::Error),

    /// Patent was removed after the task was enqueued.
    #[display(fmt = "patent not found")]
    MissingPatent,
}

impl TaskError {
    /// Check if retrying the task can't possibly change its outcome.
    fn is_permanent(&self) -> bool {
        matches!(
            self,
            TaskError::InvalidPayload(_)
                | TaskError::MissingPatent
                | TaskError::ModelError(ai::Error::NotConfigured)
        )
    }
}

/// Time a claimed task stays hidden from other workers while it runs.
///
/// A task whose worker stopped mid-run becomes due again after this period.
const CLAIM_TIMEOUT: time::Duration = time::Duration::minutes(10);

/// Result of an attempt to claim the next due task.
enum Claim {
    /// No task is due.
    Empty,

    /// Due task had no attempts left and was marked as failed.
    Exhausted,

    /// Task claimed for a single run.
    Claimed(task::Model),
}

/// Outbox task processor shared between workers.
pub(crate) struct Processor {
    /// Retry and polling configuration.
    config: config::Worker,

    /// Adapter used by analysis tasks.
    analyst: Analyst,

    /// Adapter used by anchoring tasks.
    anchor: Anchor,
}

impl Processor {
    /// Create new [`Processor`].
    pub(crate) fn new(config: config::Worker, analyst: Analyst, anchor: Anchor) -> Self {
        Self {
            config,
            analyst,
            anchor,
        }
    }

    /// Pick the next due task and run it.
    ///
    /// Returns `false` if there were no tasks to run. Only database errors are
    /// returned, any other task failure is recorded on the task itself.
    ///
    /// External services are called outside of any database transaction.
    pub(crate) async fn process_next(&self, db: &DatabaseConnection) -> Result<bool, DbErr> {
        let task = match self.claim(db).await? {
            Claim::Empty => return Ok(false),
            Claim::Exhausted => return Ok(true),
            Claim::Claimed(task) => task,
        };

        let outcome = match task.kind {
            task::Kind::AnchorHash => anchor::run(db, &self.anchor, &task).await,
            task::Kind::AnalyzePatent => analysis::run(db, &self.analyst, &task).await,
        };

        self.finish(db, task, outcome).await?;

        Ok(true)
    }

    /// Claim the next due task by counting an attempt and postponing it by [`CLAIM_TIMEOUT`].
    async fn claim(&self, db: &DatabaseConnection) -> Result<Claim, DbErr> {
        let max_attempts = self.config.max_attempts;

        db.transaction::<_, _, DbErr>(|txn| {
            Box::pin(async move {
                let now = db::now();

                let mut query = task::Entity::find()
                    .filter(task::Column::Status.eq(task::Status::Pending))
                    .filter(task::Column::ScheduledAt.lte(now))
                    .order_by_asc(task::Column::ScheduledAt)
                    .order_by_asc(task::Column::Id);

                QuerySelect::query(&mut query)
                    .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked);

                let Some(task) = query.one(txn).await? else {
                    return Ok(Claim::Empty);
                };

                let task_id = task.id;
                let kind = task.kind;
                let attempts = task.attempts;
                let interrupted = task.last_error.is_none();
                let mut active = task.into_active_model();

                if attempts >= max_attempts {
                    if interrupted {
                        active.last_error =
                            ActiveValue::Set(Some(String::from("task run was interrupted")));
                    }

                    active.status = ActiveValue::Set(task::Status::Failed);
                    active.processed_at = ActiveValue::Set(Some(now));
                    active.update(txn).await?;

                    error!(task_id, ?kind, attempts, "task ran out of attempts");

                    return Ok(Claim::Exhausted);
                }

                active.attempts = ActiveValue::Set(attempts + 1);
                active.scheduled_at = ActiveValue::Set(now.saturating_add(CLAIM_TIMEOUT));

                Ok(Claim::Claimed(active.update(txn).await?))
            })
        })
        .await
        .into_raw_result()
    }

    /// Record the outcome of a claimed task run.
    async fn finish(
        &self,
        db: &DatabaseConnection,
        task: task::Model,
        outcome: Result<(), TaskError>,
    ) -> Result<(), DbErr> {
        let now = db::now();
        let retry_delay = i64::try_from(self.config.retry_delay).unwrap_or(i64::MAX);

        let task_id = task.id;
        let kind = task.kind;
        let attempts = task.attempts;
        let mut active = task.into_active_model();

        match outcome {
            Ok(()) => {
                active.status = ActiveValue::Set(task::Status::Completed);
                active.processed_at = ActiveValue::Set(Some(now));
                active.last_error = ActiveValue::Set(None);

                info!(task_id, ?kind, "task completed");
            }
            Err(err) => {
                active.last_error = ActiveValue::Set(Some(err.to_string()));

                if err.is_permanent() || attempts >= self.config.max_attempts {
                    active.status = ActiveValue::Set(task::Status::Failed);
                    active.processed_at = ActiveValue::Set(Some(now));

                    error!(task_id, ?kind, attempts, %err, "task failed");
                } else {
                    let delay = retry_delay.saturating_mul(attempts.into());

                    active.scheduled_at =
                        ActiveValue::Set(now.saturating_add(time::Duration::seconds(delay)));

                    warn!(task_id, ?kind, attempts, %err, "task rescheduled");
                }
            }
        }

        active.update(db).await?;

        Ok(())
    }
}

/// Run the worker loop, polling for due tasks until the process is stopped.
#[instrument(skip_all)]
pub(crate) async fn spawn(processor: Arc<Processor>, db: Arc<DatabaseConnection>) {
    let poll_interval = Duration::from_secs(processor.config.poll_interval);

    loop {
        match processor.process_next(&db).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(error) => error!(%error, "worker error"),
        }

        tokio::time::sleep(poll_interval).await;
    }
}
