//! Log subscriber setup
//!
//! Library code only emits `tracing` events; the subscriber is installed once
//! by the binary. Output goes to stdout, filtered by `RUST_LOG` (default
//! `info`).

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, or `info` when unset or invalid
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber
///
/// # Panics
/// Panics if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stdout);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
