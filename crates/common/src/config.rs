use std::{net::SocketAddr, path::PathBuf};

use byte_unit::n_mib_bytes;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[cfg(feature = "logging")]
use tracing_subscriber::filter::LevelFilter;

/// Database configuration.
#[derive(Deserialize)]
pub struct Database {
    /// Database URL string.
    pub url: String,
}

/// HTTP server configuration.
#[derive(Deserialize)]
pub struct Server {
    /// Address, that HTTP server will listen on.
    pub address: SocketAddr,
}

/// Session cookie configuration.
#[derive(Deserialize)]
pub struct Session {
    /// Secret mixed into session token hashes before they are stored.
    pub secret: String,

    /// Session lifespan, in seconds, counted from the moment of login.
    #[serde(default = "default_session_lifespan")]
    pub lifespan: u64,
}

fn default_session_lifespan() -> u64 {
    7 * 24 * 60 * 60
}

/// Implementation of [`serde`]'s deserializer for [`FromStr`] types.
#[cfg(feature = "logging")]
fn deserialize_from_str<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error,
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
}

/// Logging configuration.
#[cfg(feature = "logging")]
#[derive(Deserialize)]
pub struct Logging {
    /// Log level.
    #[serde(deserialize_with = "deserialize_from_str")]
    pub level: LevelFilter,
}

#[cfg(feature = "logging")]
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
        }
    }
}

/// Patent document storage configuration.
#[derive(Deserialize)]
pub struct Storage {
    /// Directory in which uploaded documents are stored, keyed by their content hash.
    pub uploads_path: PathBuf,

    /// Max size of a single uploaded document, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Max count of documents attached to a single filing request.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_max_file_size() -> usize {
    n_mib_bytes!(50) as usize
}

fn default_max_files() -> usize {
    10
}

/// Hosted language model configuration.
#[derive(Clone, Deserialize)]
pub struct Ai {
    /// API key passed as a bearer token.
    pub api_key: String,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Request timeout, in seconds.
    #[serde(default = "default_ai_timeout")]
    pub timeout: u64,
}

fn default_ai_base_url() -> String {
    String::from("https://api.openai.com/v1")
}

fn default_ai_model() -> String {
    String::from("gpt-4o")
}

fn default_ai_timeout() -> u64 {
    60
}

/// Ledger network kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerNetwork {
    /// Development ledger stored in the application database, shared by
    /// the server and the worker.
    Local,

    /// Remote ledger reachable through an HTTP gateway.
    Gateway,
}

/// Distributed ledger configuration.
#[derive(Clone, Deserialize)]
pub struct Ledger {
    /// Ledger network kind.
    pub network: LedgerNetwork,

    /// Gateway URL, required for the [`LedgerNetwork::Gateway`] network.
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Operator account identifier.
    #[serde(default)]
    pub account_id: Option<String>,

    /// Operator private key.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Topic used for hash anchoring. A new topic is created per message when absent.
    #[serde(default)]
    pub topic_id: Option<String>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            network: LedgerNetwork::Local,
            gateway_url: None,
            account_id: None,
            private_key: None,
            topic_id: None,
        }
    }
}

/// Outbox worker configuration.
#[derive(Deserialize)]
pub struct Worker {
    /// Total count of workers started for task processing.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Delay between polls of an empty task queue, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Max attempts per task before it is marked as failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,

    /// Base delay between task retries, in seconds. Multiplied by the attempt count.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
}

impl Default for Worker {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            poll_interval: default_poll_interval(),
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
        }
    }
}

fn default_worker_count() -> usize {
    1
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_attempts() -> i32 {
    5
}

fn default_retry_delay() -> u64 {
    30
}

/// General configuration.
#[derive(Deserialize)]
pub struct Config {
    /// General database configuration.
    pub database: Database,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: Option<Server>,

    /// Session configuration.
    pub session: Session,

    /// Logging configuration.
    #[cfg(feature = "logging")]
    #[serde(default)]
    pub logging: Logging,

    /// Document storage configuration.
    pub storage: Storage,

    /// Language model configuration. AI analyses are unavailable when absent.
    #[serde(default)]
    pub ai: Option<Ai>,

    /// Ledger configuration.
    #[serde(default)]
    pub ledger: Ledger,

    /// Outbox worker configuration.
    #[serde(default)]
    pub worker: Worker,
}

impl Config {
    /// Create new config using default configuration file or environment variables.
    ///
    /// See [`Env`] for more details on how to use environment variables configuration.
    /// Nested keys are separated with a double underscore, e.g. `CONFIG_DATABASE__URL`.
    ///
    /// [`Env`]: figment::providers::Env
    pub fn new(path: Option<PathBuf>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.unwrap_or(PathBuf::from("Config.toml"))))
            .merge(Env::prefixed("CONFIG_").split("__"))
            .extract()
    }

    /// Create new config suitable for running unit tests.
    #[cfg(feature = "test-utils")]
    pub fn for_tests() -> Self {
        Self {
            database: Database {
                url: String::from("sqlite::memory:"),
            },
            server: Some(Server {
                address: "127.0.0.1:3000".parse().unwrap(),
            }),
            session: Session {
                secret: String::from("test secret"),
                lifespan: default_session_lifespan(),
            },
            #[cfg(feature = "logging")]
            logging: Logging::default(),
            storage: Storage {
                uploads_path: std::env::temp_dir().join("patent-vault-tests"),
                max_file_size: default_max_file_size(),
                max_files: default_max_files(),
            },
            ai: None,
            ledger: Ledger::default(),
            worker: Worker::default(),
        }
    }
}
