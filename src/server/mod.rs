//! HTTP server for ping, metrics and key endpoints
//!
//! Provides:
//! - `/ping` - Liveness check
//! - `/metrics` - Prometheus scrape endpoint
//! - `/key/{key}` - Echo routes
//!
//! Also provides graceful shutdown handling for SIGINT.

pub mod lifecycle;
pub mod metrics;
mod routes;
pub mod shutdown;

pub use lifecycle::{serve, Application, RunningServer, ServerError};
pub use metrics::{create_metrics, Metrics, MetricsError, SharedMetrics};
pub use routes::{build_router, AppState};
pub use shutdown::{
    shutdown_channel, wait_for_interrupt, CompletionLatch, ShutdownController, ShutdownSignal,
    Termination,
};

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_tests;

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_tests;

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
