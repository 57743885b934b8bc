/// Patent activity feed route.
mod activities;

/// AI analysis history route.
mod analyses;

/// Patent filing route.
mod create;

/// Patent deletion route.
mod delete;

/// Patent details route.
mod details;

/// Patent document routes.
mod documents;

/// Patent list route.
mod list;

/// Prior art results route.
mod prior_art;

/// Patent search route.
mod search;

/// Ledger transaction history route.
mod transactions;

/// Patent update route.
mod update;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete as delete_route, get},
    Router,
};
use common::config;
use db::{patent, patent_activity, DatabaseConnection, PrimitiveDateTime};
use serde::Serialize;

/// Create a router with patent management routes.
///
/// Request body limit of the filing route is derived from the storage configuration.
pub(crate) fn routes(storage: &config::Storage) -> Router<Arc<DatabaseConnection>> {
    let body_limit = storage
        .max_file_size
        .saturating_mul(storage.max_files)
        .saturating_add(1024 * 1024);

    Router::new()
        .route(
            "/",
            get(list::list)
                .post(create::create)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/search", get(search::search))
        .route(
            "/:id",
            get(details::details)
                .put(update::update)
                .delete(delete::delete),
        )
        .route("/:id/documents", get(documents::list))
        .route(
            "/:id/documents/:documentId",
            delete_route(documents::delete),
        )
        .route("/:id/activities", get(activities::activities))
        .route("/:id/analyses", get(analyses::analyses))
        .route("/:id/prior-art", get(prior_art::prior_art))
        .route("/:id/transactions", get(transactions::transactions))
}

fn unix_timestamp(timestamp: PrimitiveDateTime) -> i64 {
    timestamp.assume_utc().unix_timestamp()
}

/// Patent information.
///
/// All timestamps are UNIX timestamps.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatentData {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: Option<patent::Category>,
    pub status: patent::Status,
    pub patent_number: Option<String>,
    pub estimated_value: Option<i64>,
    pub filed_at: Option<i64>,
    pub approved_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub ledger_topic_id: Option<String>,
    pub ledger_message_id: Option<String>,
    pub nft_token_id: Option<String>,
    pub content_hash: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<patent::Model> for PatentData {
    fn from(model: patent::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            category: model.category,
            status: model.status,
            patent_number: model.patent_number,
            estimated_value: model.estimated_value,
            filed_at: model.filed_at.map(unix_timestamp),
            approved_at: model.approved_at.map(unix_timestamp),
            expires_at: model.expires_at.map(unix_timestamp),
            ledger_topic_id: model.ledger_topic_id,
            ledger_message_id: model.ledger_message_id,
            nft_token_id: model
                .nft_token_id
                .filter(|token_id| token_id != patent::NFT_MINT_PENDING),
            content_hash: model.content_hash,
            created_at: unix_timestamp(model.created_at),
            updated_at: unix_timestamp(model.updated_at),
        }
    }
}

/// Patent lifecycle event.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActivityData {
    pub id: i64,
    pub patent_id: i64,
    pub user_id: i64,
    pub activity_type: patent_activity::ActivityType,
    pub description: String,
    pub created_at: i64,
}

impl From<patent_activity::Model> for ActivityData {
    fn from(model: patent_activity::Model) -> Self {
        Self {
            id: model.id,
            patent_id: model.patent_id,
            user_id: model.user_id,
            activity_type: model.activity_type,
            description: model.description,
            created_at: unix_timestamp(model.created_at),
        }
    }
}
