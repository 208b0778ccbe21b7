//! Environment variable resolution
//!
//! All lookups go through a `Fn(&str) -> Option<String>` so tests can feed a
//! plain map instead of mutating the process environment. A variable that is
//! set to the empty string counts as set.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Default bind host when `SERVER_HOST` is unset
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default bind port when `SERVER_PORT` is unset
pub const DEFAULT_SERVER_PORT: &str = "9090";

/// Default datastore host when `REDIS_HOST` is unset
pub const DEFAULT_REDIS_HOST: &str = "localhost";

/// Default datastore port when `REDIS_PORT` is unset
pub const DEFAULT_REDIS_PORT: &str = "6379";

/// Default datastore database index when `REDIS_DB` is unset
pub const DEFAULT_REDIS_DB: &str = "0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid redis connection string (host={host}, port={port}, db={db}): {source}")]
    InvalidRedisUrl {
        host: String,
        port: String,
        db: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("Unknown log format '{0}' (expected 'json' or 'pretty')")]
    UnknownLogFormat(String),
}

/// Read the process environment
///
/// Values that are not valid unicode are treated as unset.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Look up `key`, falling back to `default` with a warning when unset
///
/// `shown` is what the warning prints as the default, so secrets can be
/// described rather than echoed.
fn lookup_or_default<F>(lookup: &F, key: &str, default: &str, shown: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value,
        None => {
            warn!(
                variable = key,
                default = shown,
                "Environment variable not set, using default"
            );
            default.to_string()
        }
    }
}

/// Address the HTTP server binds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

impl ServerConfig {
    /// Resolve from `SERVER_HOST` and `SERVER_PORT`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup_or_default(
                &lookup,
                "SERVER_HOST",
                DEFAULT_SERVER_HOST,
                DEFAULT_SERVER_HOST,
            ),
            port: lookup_or_default(
                &lookup,
                "SERVER_PORT",
                DEFAULT_SERVER_PORT,
                DEFAULT_SERVER_PORT,
            ),
        }
    }

    /// Resolve from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// `host:port` as configured
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `host:port` handed to the listener
    ///
    /// An empty host listens on every interface.
    pub fn bind_addr(&self) -> String {
        let host = if self.host.is_empty() {
            DEFAULT_SERVER_HOST
        } else {
            self.host.as_str()
        };
        format!("{}:{}", host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT.to_string(),
        }
    }
}

/// Datastore connection parameters
///
/// Only used to build and validate a connection string at startup. No route
/// reads from or writes to the datastore.
#[derive(Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub host: String,
    pub port: String,
    pub password: String,
    pub db: String,
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("db", &self.db)
            .finish()
    }
}

impl RedisConfig {
    /// Resolve from `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD` and `REDIS_DB`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup_or_default(
                &lookup,
                "REDIS_HOST",
                DEFAULT_REDIS_HOST,
                DEFAULT_REDIS_HOST,
            ),
            port: lookup_or_default(
                &lookup,
                "REDIS_PORT",
                DEFAULT_REDIS_PORT,
                DEFAULT_REDIS_PORT,
            ),
            password: lookup_or_default(&lookup, "REDIS_PASSWORD", "", "[empty]"),
            db: lookup_or_default(&lookup, "REDIS_DB", DEFAULT_REDIS_DB, DEFAULT_REDIS_DB),
        }
    }

    /// Resolve from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// Connection URL with an empty user name
    ///
    /// An empty host connects to `localhost`.
    pub fn connection_url(&self) -> String {
        let host = if self.host.is_empty() {
            DEFAULT_REDIS_HOST
        } else {
            self.host.as_str()
        };
        format!(
            "redis://:{}@{}:{}/{}",
            self.password, host, self.port, self.db
        )
    }

    /// Parse the connection URL into a client
    ///
    /// No connection is opened; this only validates the parameters.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidRedisUrl` if the URL does not parse, e.g.
    /// a non-numeric port or database index.
    pub fn open_client(&self) -> Result<redis::Client, ConfigError> {
        redis::Client::open(self.connection_url().as_str()).map_err(|source| {
            ConfigError::InvalidRedisUrl {
                host: self.host.clone(),
                port: self.port.clone(),
                db: self.db.clone(),
                source,
            }
        })
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_REDIS_HOST.to_string(),
            port: DEFAULT_REDIS_PORT.to_string(),
            password: String::new(),
            db: DEFAULT_REDIS_DB.to_string(),
        }
    }
}

/// Everything the binary needs before it can bind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub redis: RedisConfig,
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server: ServerConfig::from_lookup(&lookup),
            redis: RedisConfig::from_lookup(&lookup),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable text
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::UnknownLogFormat(s.to_string())),
        }
    }
}

impl LogFormat {
    /// Resolve from `LOG_FORMAT`
    ///
    /// Runs before logging exists, so an unset variable is not warned about
    /// and an unknown value is returned as an error for the caller to report
    /// once the subscriber is up.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("LOG_FORMAT") {
            Some(value) => value.parse(),
            None => Ok(LogFormat::default()),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }
}
