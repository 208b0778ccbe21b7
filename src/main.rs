use anyhow::Context;
use rchat::config::{AppConfig, LogFormat};
use rchat::server::{build_router, create_metrics, serve, wait_for_interrupt};
use rchat::telemetry::init_tracing;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Resolved before logging exists; an unknown value is reported below
    let (log_format, log_format_error) = match LogFormat::from_env() {
        Ok(format) => (format, None),
        Err(e) => (LogFormat::default(), Some(e)),
    };
    init_tracing(log_format);
    if let Some(e) = log_format_error {
        warn!(error = %e, "Falling back to JSON logs");
    }

    info!("Starting rchat");

    let config = AppConfig::from_env();

    // An invalid datastore configuration is fatal: nothing gets bound
    let _redis = match config.redis.open_client() {
        Ok(client) => {
            info!(
                host = %config.redis.host,
                port = %config.redis.port,
                db = %config.redis.db,
                "Redis client configured"
            );
            client
        }
        Err(e) => {
            error!(error = %e, "Invalid redis configuration");
            return Err(e.into());
        }
    };

    let metrics = create_metrics().context("Failed to create metrics registry")?;
    info!("Prometheus metrics registry initialized");

    let router = build_router(metrics);

    // Bind failures are logged, not turned into an exit status
    match serve(&config.server, router, wait_for_interrupt()).await {
        Ok(termination) => info!(termination = ?termination, "rchat shut down"),
        Err(e) => error!(error = %e, "Server failed to start"),
    }

    Ok(())
}
