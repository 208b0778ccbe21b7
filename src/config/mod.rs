//! Configuration resolved from the process environment
//!
//! Every setting has a fixed default. Resolution only fails on a datastore
//! connection string that does not parse (fatal) or an unknown `LOG_FORMAT`
//! (reported, then JSON is used).

mod env;

pub use env::{
    AppConfig, ConfigError, LogFormat, RedisConfig, ServerConfig, DEFAULT_REDIS_DB,
    DEFAULT_REDIS_HOST, DEFAULT_REDIS_PORT, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

#[cfg(test)]
#[path = "env_test.rs"]
mod env_tests;
