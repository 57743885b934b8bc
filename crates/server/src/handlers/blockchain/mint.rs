use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use common::ledger::{self, Anchor, Nft, NftRequest};
use db::{
    blockchain_transaction, patent, patent_activity, sea_query::Expr, ActiveModelTrait,
    ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use tracing::{info, warn};

use crate::{
    access::{self, patent_access_error},
    auth::AuthenticatedUserId,
};

/// Errors that may occur during the patent token minting.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum MintError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Ledger request failed.
    #[status(StatusCode::BAD_GATEWAY)]
    #[display(fmt = "ledger request failed")]
    LedgerError(ledger::Error),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "patent not found")]
    PatentNotFound,

    #[status(StatusCode::FORBIDDEN)]
    #[display(fmt = "access to this patent is forbidden")]
    Forbidden,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "token was already minted for this patent")]
    AlreadyMinted,
}

patent_access_error!(MintError);

/// Mint a token representing a patent owned by the current user.
///
/// Every minting attempt is recorded as a ledger transaction of the patent,
/// including failed ones.
pub(super) async fn mint(
    Extension(current_user): Extension<AuthenticatedUserId>,
    Extension(anchor): Extension<Anchor>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(patent_id): Path<i64>,
) -> Result<Json<Nft>, MintError> {
    let patent = access::owned_patent(&*db, patent_id, current_user).await?;

    // A patent is claimed with a placeholder token id before the ledger is
    // called, so that concurrent requests can't mint a second token.
    let claimed = patent::Entity::update_many()
        .col_expr(
            patent::Column::NftTokenId,
            Expr::value(patent::NFT_MINT_PENDING),
        )
        .filter(patent::Column::Id.eq(patent.id))
        .filter(patent::Column::NftTokenId.is_null())
        .exec(&*db)
        .await?;

    if claimed.rows_affected == 0 {
        return Err(MintError::AlreadyMinted);
    }

    let result = anchor
        .mint_nft(&NftRequest {
            patent_id: patent.id,
            title: &patent.title,
            content_hash: patent.content_hash.as_deref(),
            existing_token_id: None,
        })
        .await;

    let nft = match result {
        Ok(nft) => nft,
        Err(err) => {
            patent::Entity::update_many()
                .col_expr(
                    patent::Column::NftTokenId,
                    Expr::value(Option::<String>::None),
                )
                .filter(patent::Column::Id.eq(patent.id))
                .filter(patent::Column::NftTokenId.eq(patent::NFT_MINT_PENDING))
                .exec(&*db)
                .await?;

            if let ledger::Error::AlreadyMinted = err {
                return Err(MintError::AlreadyMinted);
            }

            warn!(%err, patent_id, "unable to mint patent token");

            blockchain_transaction::Entity::insert(blockchain_transaction::ActiveModel {
                patent_id: ActiveValue::Set(patent.id),
                transaction_type: ActiveValue::Set(blockchain_transaction::TransactionType::NftMint),
                status: ActiveValue::Set(blockchain_transaction::Status::Failed),
                error: ActiveValue::Set(Some(err.to_string())),
                ..Default::default()
            })
            .exec_without_returning(&*db)
            .await?;

            return Err(MintError::LedgerError(err));
        }
    };

    let response = nft.clone();

    db.transaction::<_, _, MintError>(|txn| {
        Box::pin(async move {
            blockchain_transaction::Entity::insert(blockchain_transaction::ActiveModel {
                patent_id: ActiveValue::Set(patent.id),
                transaction_type: ActiveValue::Set(blockchain_transaction::TransactionType::NftMint),
                status: ActiveValue::Set(blockchain_transaction::Status::Confirmed),
                token_id: ActiveValue::Set(Some(nft.token_id.clone())),
                transaction_id: ActiveValue::Set(Some(nft.transaction_id)),
                hash: ActiveValue::Set(patent.content_hash.clone()),
                ..Default::default()
            })
            .exec_without_returning(txn)
            .await?;

            let mut active = patent.into_active_model();
            active.nft_token_id = ActiveValue::Set(Some(nft.token_id));
            active.updated_at = ActiveValue::Set(db::now());

            let patent = active.update(txn).await?;

            patent_activity::Entity::insert(patent_activity::record(
                &patent,
                patent_activity::ActivityType::NftMinted,
                format!("Token #{} minted for \"{}\"", nft.serial_number, patent.title),
            ))
            .exec_without_returning(txn)
            .await?;

            Ok(())
        })
    })
    .await
    .into_raw_result()?;

    info!(patent_id, token_id = %response.token_id, "patent token minted");

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use db::{blockchain_transaction, patent, patent_activity, ActiveValue, EntityTrait};
    use tower::{Service, ServiceExt};

    use crate::testing::{
        app, app_with_ledger, create_database, create_patent, create_user, login, patent_model,
        FailingLedger, ResponseBodyExt,
    };

    fn request(cookie: &str, patent_id: i64) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/blockchain/mint-nft/{patent_id}"))
            .header("Cookie", cookie)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn mint() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let patent = create_patent(&db, user_id, patent_model("Solar panel", None)).await;

        let mut service = app(db.clone());

        let response = service.call(request(&cookie, patent.id)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;

        assert_eq!(body["serialNumber"], 1);
        let token_id = body["tokenId"].as_str().unwrap().to_string();

        let stored = patent::Entity::find_by_id(patent.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.nft_token_id, Some(token_id));

        let transactions = blockchain_transaction::Entity::find().all(&db).await.unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(
            transactions[0].status,
            blockchain_transaction::Status::Confirmed
        );

        let activities = patent_activity::Entity::find().all(&db).await.unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(
            activities[0].activity_type,
            patent_activity::ActivityType::NftMinted
        );

        let response = service.call(request(&cookie, patent.id)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn already_minted() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let patent = create_patent(
            &db,
            user_id,
            patent::ActiveModel {
                nft_token_id: ActiveValue::Set(Some(String::from("0.0.5000"))),
                ..patent_model("Solar panel", None)
            },
        )
        .await;

        let response = app(db.clone())
            .oneshot(request(&cookie, patent.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(blockchain_transaction::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn mint_in_progress() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let patent = create_patent(
            &db,
            user_id,
            patent::ActiveModel {
                nft_token_id: ActiveValue::Set(Some(patent::NFT_MINT_PENDING.to_string())),
                ..patent_model("Solar panel", None)
            },
        )
        .await;

        let mut service = app(db.clone());

        let response = service.call(request(&cookie, patent.id)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(blockchain_transaction::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .is_empty());

        let response = service
            .call(
                Request::builder()
                    .uri(format!("/api/patents/{}", patent.id))
                    .header("Cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.json().await["nftTokenId"].is_null());
    }

    #[tokio::test]
    async fn ledger_failure() {
        let db = create_database().await;
        let user_id = create_user(&db, "alice@example.com").await;
        let cookie = login(&db, user_id).await;

        let patent = create_patent(&db, user_id, patent_model("Solar panel", None)).await;

        let response = app_with_ledger(db.clone(), Arc::new(FailingLedger))
            .oneshot(request(&cookie, patent.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let transactions = blockchain_transaction::Entity::find().all(&db).await.unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].status, blockchain_transaction::Status::Failed);
        assert!(transactions[0].error.is_some());

        let stored = patent::Entity::find_by_id(patent.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert!(stored.nft_token_id.is_none());

        let response = app(db).oneshot(request(&cookie, patent.id)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn foreign_patent() {
        let db = create_database().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let cookie = login(&db, bob).await;

        let patent = create_patent(&db, alice, patent_model("Solar panel", None)).await;

        let response = app(db).oneshot(request(&cookie, patent.id)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
