mod access;
mod auth;
mod handlers;
mod password;
mod session;
mod storage;
mod validation;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Extension, Json, Router, Server};
use common::{ai::Analyst, config::Config, ledger::Anchor, logging};
use db::{ledger::DatabaseLedger, Database, DatabaseConnection};
use serde_json::{json, Value};
use session::{DatabaseSessionStore, Sessions};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::new(None)?;

    logging::init(&config);

    let Some(server_config) = config.server.as_ref() else {
        return Err(anyhow::Error::msg("unable to load server config"));
    };

    let analyst = Analyst::from_config(config.ai.as_ref())?;

    info!("connecting to database");
    let database = Arc::new(Database::connect(&config.database.url).await?);

    let ledger = Arc::new(DatabaseLedger::new((*database).clone()));
    let anchor = Anchor::from_config(&config.ledger, ledger)?;
    let address = server_config.address;
    let config = Arc::new(config);

    info!(%address, "starting server");

    Server::bind(&address)
        .serve(app_router(database, config, analyst, anchor).into_make_service())
        .await?;

    Ok(())
}

fn app_router(
    database: Arc<DatabaseConnection>,
    config: Arc<Config>,
    analyst: Analyst,
    anchor: Anchor,
) -> Router {
    let sessions: Sessions = Arc::new(DatabaseSessionStore::new(
        database.clone(),
        &config.session,
    ));

    let protected_routes = Router::new()
        .nest("/auth", handlers::auth::protected_routes())
        .nest("/patents", handlers::patents::routes(&config.storage))
        .nest("/dashboard", handlers::dashboard::routes())
        .nest("/ai", handlers::ai::routes())
        .nest("/blockchain", handlers::blockchain::routes())
        .route_layer(from_fn_with_state(
            sessions.clone(),
            auth::require_authentication,
        ));

    let api_routes = Router::new()
        .nest("/auth", handlers::auth::routes())
        .merge(protected_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(Extension(config))
        .layer(Extension(sessions))
        .layer(Extension(analyst))
        .layer(Extension(anchor))
        .with_state(database)
}

/// Liveness check.
async fn health() -> Json<Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
    }))
}

#[cfg(test)]
mod tests {
    use assert_json::{assert_json, validators};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::testing::{app, create_database, ResponseBodyExt};

    #[tokio::test]
    async fn health() {
        let db = create_database().await;

        let response = app(db)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_json!(response.json().await, {
            "status": "ok",
            "timestamp": validators::string(|val| {
                val.contains('T')
                    .then_some(())
                    .ok_or(String::from("not an RFC 3339 timestamp"))
            }),
        });
    }
}
