//! Application configuration loaded from environment variables.

use document_store::StoreOptions;
use thiserror::Error;

const DEFAULT_CLUSTER: &str = "cluster0.yrcmf.mongodb.net";
const DEFAULT_DATABASE: &str = "zaynax_db";

/// Which document store backs the gateway.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// A MongoDB deployment reached through `uri`.
    MongoDb { uri: String },
    /// Process-local store; contents are lost on exit.
    Memory,
}

// The URI carries credentials.
impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::MongoDb { .. } => f
                .debug_struct("MongoDb")
                .field("uri", &"<redacted>")
                .finish(),
            StoreBackend::Memory => f.write_str("Memory"),
        }
    }
}

/// Errors raised while reading configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid PORT value {0:?}")]
    InvalidPort(String),

    #[error("unknown STORE_BACKEND {0:?}, expected \"mongodb\" or \"memory\"")]
    UnknownBackend(String),
}

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `5000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `STORE_BACKEND` — `"mongodb"` (default) or `"memory"`
/// - `MONGODB_URI` — full connection string; when unset it is built from
///   `DB_USER`, `DB_PASS` (both required) and `DB_CLUSTER`
/// - `DB_NAME` — database name (default: `"zaynax_db"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub backend: StoreBackend,
    pub database: String,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 5000,
        };

        let backend = match var("STORE_BACKEND").as_deref() {
            None | Some("mongodb") => {
                let uri = match var("MONGODB_URI") {
                    Some(uri) => uri,
                    None => {
                        let user = var("DB_USER").ok_or(ConfigError::MissingVar("DB_USER"))?;
                        let pass = var("DB_PASS").ok_or(ConfigError::MissingVar("DB_PASS"))?;
                        let cluster = var("DB_CLUSTER").unwrap_or_else(|| DEFAULT_CLUSTER.to_string());
                        format!("mongodb+srv://{user}:{pass}@{cluster}/?retryWrites=true&w=majority")
                    }
                };
                StoreBackend::MongoDb { uri }
            }
            Some("memory") => StoreBackend::Memory,
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            backend,
            database: var("DB_NAME").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection options for the MongoDB backend, `None` for the memory backend.
    pub fn store_options(&self) -> Option<StoreOptions> {
        match &self.backend {
            StoreBackend::MongoDb { uri } => Some(StoreOptions {
                uri: uri.clone(),
                database: self.database.clone(),
                app_name: Some(env!("CARGO_PKG_NAME").to_string()),
            }),
            StoreBackend::Memory => None,
        }
    }
}
