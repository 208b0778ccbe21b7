//! Prometheus metrics for the rchat server
//!
//! The registry is owned by [`Metrics`] and handed to the router as a
//! [`SharedMetrics`] handle, so tests get an isolated registry each time
//! instead of sharing the prometheus default one.

use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};
use std::sync::Arc;
use thiserror::Error;

/// Content type of the text exposition format
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("Encoded metrics are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Metrics registry plus the counters the routes update
pub struct Metrics {
    registry: Registry,
    ping_hits: IntCounter,
}

/// Handle shared between the router and anything else that records metrics
pub type SharedMetrics = Arc<Metrics>;

impl Metrics {
    /// Create a registry with all server metrics registered
    ///
    /// On Linux the process collector (CPU, memory, open fds) is registered
    /// as well.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let ping_hits = IntCounter::with_opts(
            Opts::new(
                "total_ping_hits",
                "The total amount of hits on the ping route",
            )
            .namespace("server"),
        )?;
        registry.register(Box::new(ping_hits.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            ping_hits,
        })
    }

    /// Record one hit on `/ping`
    pub fn record_ping(&self) {
        self.ping_hits.inc();
    }

    /// Current value of `server_total_ping_hits`
    pub fn ping_hits(&self) -> u64 {
        self.ping_hits.get()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Create the shared metrics handle used by the server
pub fn create_metrics() -> Result<SharedMetrics, MetricsError> {
    Ok(Arc::new(Metrics::new()?))
}
