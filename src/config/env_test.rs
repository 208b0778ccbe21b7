//! Tests for environment resolution
//!
//! Lookups are fed from a map so tests never race on the process environment.

use super::*;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

const ALL_VARIABLES: [&str; 6] = [
    "SERVER_HOST",
    "SERVER_PORT",
    "REDIS_HOST",
    "REDIS_PORT",
    "REDIS_PASSWORD",
    "REDIS_DB",
];

/// Log sink shared between the subscriber and the test
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Resolve the full config with a capturing subscriber, returning the WARN lines
fn warnings_while_resolving(pairs: &[(&str, &str)]) -> Vec<String> {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        AppConfig::from_lookup(env_from(pairs));
    });

    let bytes = sink.0.lock().expect("lock output").clone();
    String::from_utf8(bytes)
        .expect("utf8 log output")
        .lines()
        .filter(|line| line.contains("WARN"))
        .map(str::to_string)
        .collect()
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_server_config_defaults_when_unset() {
    let config = ServerConfig::from_lookup(env_from(&[]));

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, "9090");
    assert_eq!(config.addr(), "0.0.0.0:9090");
    assert_eq!(config, ServerConfig::default());
}

#[test]
fn test_server_config_overrides() {
    let config = ServerConfig::from_lookup(env_from(&[
        ("SERVER_HOST", "127.0.0.1"),
        ("SERVER_PORT", "8081"),
    ]));

    assert_eq!(config.addr(), "127.0.0.1:8081");
}

/// Each variable falls back independently of the other
#[test]
fn test_server_config_partial_overrides() {
    let host_only = ServerConfig::from_lookup(env_from(&[("SERVER_HOST", "10.0.0.5")]));
    assert_eq!(host_only.addr(), "10.0.0.5:9090");

    let port_only = ServerConfig::from_lookup(env_from(&[("SERVER_PORT", "7000")]));
    assert_eq!(port_only.addr(), "0.0.0.0:7000");
}

/// A variable set to "" is present, not absent
#[test]
fn test_empty_value_counts_as_set() {
    let config = ServerConfig::from_lookup(env_from(&[("SERVER_HOST", "")]));

    assert_eq!(config.host, "");
    assert_eq!(config.addr(), ":9090");
}

/// An empty host binds every interface, like the default
#[test]
fn test_empty_host_binds_all_interfaces() {
    let config = ServerConfig::from_lookup(env_from(&[
        ("SERVER_HOST", ""),
        ("SERVER_PORT", "8080"),
    ]));

    assert_eq!(config.host, "");
    assert_eq!(config.bind_addr(), "0.0.0.0:8080");
}

#[test]
fn test_bind_addr_keeps_configured_host() {
    let config = ServerConfig::from_lookup(env_from(&[("SERVER_HOST", "127.0.0.1")]));

    assert_eq!(config.bind_addr(), "127.0.0.1:9090");
}

#[test]
fn test_redis_config_defaults_when_unset() {
    let config = RedisConfig::from_lookup(env_from(&[]));

    assert_eq!(config, RedisConfig::default());
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, "6379");
    assert_eq!(config.password, "");
    assert_eq!(config.db, "0");
    assert_eq!(config.connection_url(), "redis://:@localhost:6379/0");
}

#[test]
fn test_redis_config_overrides() {
    let config = RedisConfig::from_lookup(env_from(&[
        ("REDIS_HOST", "cache.internal"),
        ("REDIS_PORT", "6380"),
        ("REDIS_PASSWORD", "hunter2"),
        ("REDIS_DB", "3"),
    ]));

    assert_eq!(
        config.connection_url(),
        "redis://:hunter2@cache.internal:6380/3"
    );
}

#[test]
fn test_redis_default_config_opens_client() {
    let config = RedisConfig::default();

    assert!(config.open_client().is_ok());
}

/// An empty host is not fatal: the client points at localhost
#[test]
fn test_redis_empty_host_falls_back_to_localhost() {
    let config = RedisConfig::from_lookup(env_from(&[("REDIS_HOST", "")]));

    assert_eq!(config.host, "");
    assert_eq!(config.connection_url(), "redis://:@localhost:6379/0");
    assert!(config.open_client().is_ok());
}

#[test]
fn test_redis_non_numeric_port_is_config_error() {
    let config = RedisConfig::from_lookup(env_from(&[("REDIS_PORT", "not-a-port")]));

    let err = config.open_client().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRedisUrl { .. }));
    assert!(err.to_string().contains("port=not-a-port"));
}

#[test]
fn test_redis_non_numeric_db_is_config_error() {
    let config = RedisConfig::from_lookup(env_from(&[("REDIS_DB", "primary")]));

    assert!(matches!(
        config.open_client(),
        Err(ConfigError::InvalidRedisUrl { .. })
    ));
}

#[test]
fn test_redis_debug_hides_password() {
    let config = RedisConfig::from_lookup(env_from(&[("REDIS_PASSWORD", "hunter2")]));

    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("***"));
}

#[test]
fn test_app_config_resolves_both_sections() {
    let config = AppConfig::from_lookup(env_from(&[
        ("SERVER_PORT", "1234"),
        ("REDIS_HOST", "redis"),
    ]));

    assert_eq!(config.server.addr(), "0.0.0.0:1234");
    assert_eq!(config.redis.host, "redis");
    assert_eq!(config.redis.port, "6379");
}

#[test]
fn test_log_format_defaults_to_json() {
    assert_eq!(LogFormat::from_lookup(env_from(&[])).unwrap(), LogFormat::Json);
}

#[test]
fn test_log_format_parses_known_values() {
    let pretty = LogFormat::from_lookup(env_from(&[("LOG_FORMAT", "Pretty")])).unwrap();
    assert_eq!(pretty, LogFormat::Pretty);

    let json = LogFormat::from_lookup(env_from(&[("LOG_FORMAT", " json ")])).unwrap();
    assert_eq!(json, LogFormat::Json);
}

#[test]
fn test_log_format_rejects_unknown_value() {
    let result = LogFormat::from_lookup(env_from(&[("LOG_FORMAT", "xml")]));

    assert!(matches!(result, Err(ConfigError::UnknownLogFormat(ref v)) if v == "xml"));
}

#[test]
fn test_every_default_fallback_is_warned() {
    let warnings = warnings_while_resolving(&[]);

    assert_eq!(warnings.len(), 6, "expected one warning per variable: {:?}", warnings);
    for variable in ALL_VARIABLES {
        assert!(
            warnings.iter().any(|line| line.contains(variable)),
            "no warning mentions {}: {:?}",
            variable,
            warnings
        );
    }
}

#[test]
fn test_no_warnings_when_everything_is_set() {
    let pairs: Vec<(&str, &str)> = ALL_VARIABLES.iter().map(|v| (*v, "1")).collect();

    assert!(warnings_while_resolving(&pairs).is_empty());
}

/// Set-but-empty values are not fallbacks and are not warned about
#[test]
fn test_no_warnings_when_everything_is_set_but_empty() {
    let pairs: Vec<(&str, &str)> = ALL_VARIABLES.iter().map(|v| (*v, "")).collect();

    assert!(warnings_while_resolving(&pairs).is_empty());
}

#[test]
fn test_partial_config_warns_only_for_missing_values() {
    let warnings = warnings_while_resolving(&[("SERVER_HOST", "127.0.0.1"), ("REDIS_DB", "2")]);

    assert_eq!(warnings.len(), 4);
    assert!(!warnings.iter().any(|line| line.contains("SERVER_HOST")));
    assert!(!warnings.iter().any(|line| line.contains("REDIS_DB")));
}
