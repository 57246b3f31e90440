//! Serve — bind the listener, run the accept loop and the sink, and tear
//! everything down on a termination signal.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::conf::CollectorConfig;
use crate::runtime::stop::shutdown_signal;
use crate::server::SyslogServer;
use crate::sink;

/// Serve until Ctrl+C / SIGTERM, then shut down and drain.
pub async fn serve(config: CollectorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (server, messages) = SyslogServer::bind(&config).await.map_err(|e| {
        error!("Failed to start listener: {}", e);
        e
    })?;
    let server = Arc::new(server);

    info!("");
    info!("========================================");
    info!("Syslog collector is ready!");
    match server.local_addr() {
        Some(addr) => info!("Listening on: {}", addr),
        None => info!("Listening on: {}", config.listen_address),
    }
    info!("Press Ctrl+C to shutdown gracefully");
    info!("========================================");
    info!("");

    let sink_task = tokio::spawn(sink::drain(messages, tokio::io::stdout(), tokio::io::stderr()));
    let accept_task = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.start().await }
    });

    shutdown_signal().await;
    server.shutdown();

    let drain_timeout = Duration::from_millis(config.drain_timeout_ms);
    let drained = tokio::time::timeout(drain_timeout, server.wait()).await.is_ok();
    if !drained {
        let open = server.registry().list();
        warn!(
            "{} connection(s) still open after {}ms, exiting without them",
            open.len(),
            config.drain_timeout_ms
        );
        for conn in open {
            warn!(
                "  #{} from {} (connected at {})",
                conn.id,
                conn.peer,
                conn.connected_at.to_rfc3339()
            );
        }
    }

    if let Err(e) = accept_task.await {
        error!("Accept loop task failed: {}", e);
    }

    // The queue only ends once every reader is gone
    if drained {
        match sink_task.await {
            Ok(Ok(stats)) => info!(
                "Sink wrote {} line(s) to stdout, {} to stderr",
                stats.stdout_lines, stats.stderr_lines
            ),
            Ok(Err(e)) => error!("Sink write failed: {}", e),
            Err(e) => error!("Sink task failed: {}", e),
        }
    } else {
        sink_task.abort();
    }

    let snapshot = server.metrics().snapshot();
    match serde_json::to_string(&snapshot) {
        Ok(json) => info!("Final ingest metrics: {}", json),
        Err(e) => warn!("Failed to encode ingest metrics: {}", e),
    }

    info!("Server shutdown complete");
    Ok(())
}
