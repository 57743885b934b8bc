//! Patent hash anchoring on a distributed ledger.
//!
//! A patent is anchored by submitting a message containing its content hash
//! to a ledger topic. The returned topic and message identifiers are later
//! used to read the message back and compare the recorded hash with the
//! expected one.
//!
//! [`GatewayLedger`] talks to a ledger network through an HTTP gateway.
//! [`LocalLedger`] keeps everything in memory and is only visible to the
//! process that created it, which makes it suitable for tests. Development
//! deployments running several processes supply their own shared ledger to
//! [`Anchor::from_config`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use derive_more::{Display, Error, From};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use crate::{config, hash};

/// Ledger errors.
#[derive(Debug, Display, From, Error)]
pub enum Error {
    /// HTTP transport error.
    Http(reqwest::Error),

    /// Anchored message is not a valid JSON value.
    Json(serde_json::Error),

    /// A token was already minted for the patent.
    #[display(fmt = "token was already minted for this patent")]
    AlreadyMinted,

    /// Gateway network was configured without a gateway URL.
    #[display(fmt = "ledger gateway URL is not configured")]
    MissingGatewayUrl,

    /// Storage backing a local ledger failed.
    #[display(fmt = "ledger storage error: {_0}")]
    Storage(#[error(not(source))] String),
}

/// Identifiers of a message submitted to a ledger topic.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub topic_id: String,
    pub message_id: String,
}

/// Minted token information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    pub token_id: String,
    pub serial_number: i64,
    pub transaction_id: String,
}

/// Distributed ledger client.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Submit a message to the provided topic, creating a new topic if none is provided.
    async fn submit_message(&self, topic_id: Option<&str>, message: &str)
        -> Result<Receipt, Error>;

    /// Read a previously submitted message.
    async fn message(&self, topic_id: &str, message_id: &str) -> Result<Option<String>, Error>;

    /// Mint a new non-fungible token with the provided metadata.
    async fn mint_token(&self, metadata: &str) -> Result<Nft, Error>;
}

/// Ledger reachable through an HTTP gateway.
pub struct GatewayLedger {
    client: reqwest::Client,
    url: String,
    account_id: Option<String>,
    private_key: Option<String>,
}

impl GatewayLedger {
    /// Create new [`GatewayLedger`] from the provided configuration.
    pub fn new(config: &config::Ledger) -> Result<Self, Error> {
        let url = config
            .gateway_url
            .as_ref()
            .ok_or(Error::MissingGatewayUrl)?
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: reqwest::Client::new(),
            url,
            account_id: config.account_id.clone(),
            private_key: config.private_key.clone(),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = match &self.account_id {
            Some(account_id) => builder.header("X-Account-Id", account_id),
            None => builder,
        };

        match &self.private_key {
            Some(private_key) => builder.bearer_auth(private_key),
            None => builder,
        }
    }
}

#[derive(Deserialize)]
struct GatewayMessage {
    message: String,
}

#[async_trait]
impl Ledger for GatewayLedger {
    async fn submit_message(
        &self,
        topic_id: Option<&str>,
        message: &str,
    ) -> Result<Receipt, Error> {
        let receipt = self
            .request(self.client.post(format!("{}/topics/messages", self.url)))
            .json(&json!({
                "topicId": topic_id,
                "message": message,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(receipt)
    }

    async fn message(&self, topic_id: &str, message_id: &str) -> Result<Option<String>, Error> {
        let response = self
            .request(self.client.get(format!(
                "{}/topics/{topic_id}/messages/{message_id}",
                self.url
            )))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let message: GatewayMessage = response.error_for_status()?.json().await?;

        Ok(Some(message.message))
    }

    async fn mint_token(&self, metadata: &str) -> Result<Nft, Error> {
        let nft = self
            .request(self.client.post(format!("{}/tokens/mint", self.url)))
            .json(&json!({ "metadata": metadata }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(nft)
    }
}

#[derive(Default)]
struct LocalState {
    last_entity: u64,
    topics: HashMap<String, Vec<String>>,
    minted: i64,
}

/// In-memory ledger.
#[derive(Default)]
pub struct LocalLedger {
    state: Mutex<LocalState>,
}

impl LocalLedger {
    /// Create new empty [`LocalLedger`].
    pub fn new() -> Self {
        Default::default()
    }
}

#[async_trait]
impl Ledger for LocalLedger {
    async fn submit_message(
        &self,
        topic_id: Option<&str>,
        message: &str,
    ) -> Result<Receipt, Error> {
        let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());

        let topic_id = match topic_id {
            Some(topic_id) => topic_id.to_string(),
            None => {
                state.last_entity += 1;
                format!("0.0.{}", 1000 + state.last_entity)
            }
        };

        let messages = state.topics.entry(topic_id.clone()).or_default();
        messages.push(message.to_string());

        Ok(Receipt {
            topic_id,
            message_id: messages.len().to_string(),
        })
    }

    async fn message(&self, topic_id: &str, message_id: &str) -> Result<Option<String>, Error> {
        let state = self.state.lock().unwrap_or_else(|err| err.into_inner());

        let Ok(sequence_number) = message_id.parse::<usize>() else {
            return Ok(None);
        };

        Ok(state
            .topics
            .get(topic_id)
            .and_then(|messages| messages.get(sequence_number.checked_sub(1)?))
            .cloned())
    }

    async fn mint_token(&self, _: &str) -> Result<Nft, Error> {
        let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());

        state.minted += 1;

        Ok(Nft {
            token_id: String::from("0.0.5000"),
            serial_number: state.minted,
            transaction_id: format!("0.0.5000@{}", state.minted),
        })
    }
}

/// Message recorded on a ledger for each anchored patent.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnchorMessage {
    patent_id: i64,
    hash: String,
    timestamp: i64,
}

/// Result of a successful hash anchoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchoredHash {
    pub topic_id: String,
    pub message_id: String,

    /// Hex-encoded hash of the anchored payload.
    pub hash: String,
}

/// Patent information used to mint its token.
pub struct NftRequest<'a> {
    pub patent_id: i64,
    pub title: &'a str,
    pub content_hash: Option<&'a str>,

    /// Token identifier already recorded for the patent, if any.
    pub existing_token_id: Option<&'a str>,
}

/// Blockchain adapter used by patent routes and the outbox worker.
#[derive(Clone)]
pub struct Anchor {
    ledger: Arc<dyn Ledger>,
    topic_id: Option<String>,
}

impl Anchor {
    /// Create new [`Anchor`] that submits messages to the provided topic.
    pub fn new(ledger: Arc<dyn Ledger>, topic_id: Option<String>) -> Self {
        Self { ledger, topic_id }
    }

    /// Create new [`Anchor`] from the ledger configuration.
    ///
    /// The `local` ledger is used when the configured network is
    /// [`config::LedgerNetwork::Local`].
    pub fn from_config(config: &config::Ledger, local: Arc<dyn Ledger>) -> Result<Self, Error> {
        let ledger: Arc<dyn Ledger> = match config.network {
            config::LedgerNetwork::Local => local,
            config::LedgerNetwork::Gateway => Arc::new(GatewayLedger::new(config)?),
        };

        Ok(Self::new(ledger, config.topic_id.clone()))
    }

    /// Hash the provided payload and record the hash on the ledger.
    pub async fn store_hash(&self, patent_id: i64, payload: &[u8]) -> Result<AnchoredHash, Error> {
        let hash = hash::blake2_hex(payload);

        let message = serde_json::to_string(&AnchorMessage {
            patent_id,
            hash: hash.clone(),
            timestamp: OffsetDateTime::now_utc().unix_timestamp(),
        })?;

        let receipt = self
            .ledger
            .submit_message(self.topic_id.as_deref(), &message)
            .await?;

        Ok(AnchoredHash {
            topic_id: receipt.topic_id,
            message_id: receipt.message_id,
            hash,
        })
    }

    /// Check that the message recorded on the ledger contains the expected hash.
    pub async fn verify_hash(
        &self,
        topic_id: &str,
        message_id: &str,
        expected_hash: &str,
    ) -> Result<bool, Error> {
        let Some(message) = self.ledger.message(topic_id, message_id).await? else {
            return Ok(false);
        };

        let message: AnchorMessage = serde_json::from_str(&message)?;

        Ok(message.hash.eq_ignore_ascii_case(expected_hash))
    }

    /// Mint a token representing the patent.
    ///
    /// Fails with [`Error::AlreadyMinted`] if the patent already has a token.
    pub async fn mint_nft(&self, request: &NftRequest<'_>) -> Result<Nft, Error> {
        if request.existing_token_id.is_some() {
            return Err(Error::AlreadyMinted);
        }

        let metadata = serde_json::to_string(&json!({
            "patentId": request.patent_id,
            "title": request.title,
            "hash": request.content_hash,
        }))?;

        self.ledger.mint_token(&metadata).await
    }
}
