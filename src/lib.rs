//! rchat: ping, metrics and key echo service with graceful shutdown

pub mod config;
pub mod server;
pub mod telemetry;
