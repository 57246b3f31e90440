//! Boot — logging init and config load.

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::CollectorConfig;

/// Initialise the tracing / logging subsystem.
///
/// Diagnostics go to stderr so stdout carries only ingested messages.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate the configuration.
pub fn boot() -> Result<CollectorConfig, Box<dyn std::error::Error>> {
    info!("Starting syslog collector v{}", env!("CARGO_PKG_VERSION"));

    let config = CollectorConfig::load()?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!("Loaded configuration: listen_address={}", config.listen_address);
    info!(
        "Queue capacity: {}, max line: {} bytes, drain timeout: {}ms",
        config.queue_capacity, config.max_line_bytes, config.drain_timeout_ms
    );

    Ok(config)
}
