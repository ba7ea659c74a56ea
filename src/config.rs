//! Tracker configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while reading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is set but is not a valid socket address.
    #[error("invalid LISTEN_ADDR {value:?}: {source}")]
    InvalidListenAddr {
        /// Raw value found in the environment.
        value: String,
        /// Parser error.
        source: AddrParseError,
    },
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level tracker configuration.
///
/// Loaded once at startup via [`TrackerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8083`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Master switch for the PostgreSQL backend.
    pub persistence_enabled: bool,

    /// Deadline applied to every tracker operation.
    pub request_timeout: Duration,

    /// HMAC secret used to verify bearer tokens.
    pub jwt_secret: String,

    /// Optional JSON file of tours and key points loaded into the
    /// in-memory store at startup.
    pub seed_path: Option<PathBuf>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl TrackerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidListenAddr`] if `LISTEN_ADDR` is set
    /// but cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8083".to_string());
        let listen_addr = raw_addr
            .parse()
            .map_err(|source| ConfigError::InvalidListenAddr {
                value: raw_addr.clone(),
                source,
            })?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10);
        let database_min_connections = parse_env("DATABASE_MIN_CONNECTIONS", 2);
        let database_connect_timeout_secs = parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5);
        let persistence_enabled = parse_env_bool("PERSISTENCE_ENABLED", true);

        let request_timeout = Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 5));

        let jwt_secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());

        let seed_path = std::env::var("SEED_PATH").ok().map(PathBuf::from);

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections,
            database_min_connections,
            database_connect_timeout_secs,
            persistence_enabled,
            request_timeout,
            jwt_secret,
            seed_path,
            log_format,
        })
    }

    /// Returns the PostgreSQL URL when the database backend should be used.
    #[must_use]
    pub fn postgres_url(&self) -> Option<&str> {
        if self.persistence_enabled {
            self.database_url.as_deref()
        } else {
            None
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}
