//! Server module — the syslog ingestion server: accept loop, connection
//! readers, and coordinated shutdown.

pub mod listener;
pub mod reader;
pub mod registry;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::conf::{CollectorConfig, ListenAddr, DEFAULT_MAX_LINE_BYTES};
use crate::error::CollectorResult;
use crate::metrics::IngestMetrics;
use crate::parser::{DockerLogParser, LineParser, SyslogMessage};

pub use listener::{ConnectionSource, IngestListener, IngestStream};
pub use reader::{ReadOutcome, ReaderContext};
pub use registry::{ConnectionInfo, ConnectionRegistry};
pub use shutdown::{ServerState, ShutdownCoordinator, ShutdownSignal};

/// Tunables for the accept loop and its readers.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub max_line_bytes: usize,
    pub accept_backoff: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            accept_backoff: Duration::from_millis(10),
        }
    }
}

impl From<&CollectorConfig> for ServerSettings {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            max_line_bytes: config.max_line_bytes,
            accept_backoff: Duration::from_millis(config.accept_backoff_ms),
        }
    }
}

/// Accepts producer connections and publishes one parsed message per line
/// onto the output queue.
///
/// `start()` runs the accept loop; `shutdown()` may be called any number of
/// times from any task. The output queue's consumer sees the channel end once
/// shutdown has happened and every reader has let go of its handle.
pub struct SyslogServer<L = IngestListener> {
    /// Taken by `start()`, or by `shutdown()` if the loop never ran.
    listener: Mutex<Option<L>>,
    /// The server's own queue handle; readers get clones at spawn time.
    queue: Mutex<Option<mpsc::Sender<SyslogMessage>>>,
    local_addr: Option<ListenAddr>,
    parser: Arc<dyn LineParser>,
    coordinator: Arc<ShutdownCoordinator>,
    metrics: Arc<IngestMetrics>,
    registry: Arc<ConnectionRegistry>,
    readers: TaskTracker,
    settings: ServerSettings,
}

impl<L: ConnectionSource> SyslogServer<L> {
    pub fn new(
        listener: L,
        messages: mpsc::Sender<SyslogMessage>,
        parser: Arc<dyn LineParser>,
        settings: ServerSettings,
    ) -> Self {
        let local_addr = listener.local_addr().ok();
        let metrics = Arc::new(IngestMetrics::new());
        Self {
            listener: Mutex::new(Some(listener)),
            queue: Mutex::new(Some(messages)),
            local_addr,
            parser,
            coordinator: Arc::new(ShutdownCoordinator::new()),
            registry: Arc::new(ConnectionRegistry::new(Arc::clone(&metrics))),
            metrics,
            readers: TaskTracker::new(),
            settings,
        }
    }

    pub fn local_addr(&self) -> Option<&ListenAddr> {
        self.local_addr.as_ref()
    }

    pub fn state(&self) -> ServerState {
        self.coordinator.state()
    }

    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Run the accept loop until shutdown.
    ///
    /// Each accepted connection gets its own reader task. Accept errors while
    /// running are logged and retried; once stopped the loop returns quietly
    /// and the listening socket is closed.
    pub async fn start(&self) {
        let Some(listener) = self.listener.lock().take() else {
            if self.coordinator.is_stopped() {
                debug!("Server already stopped, not accepting connections");
            } else {
                warn!("Accept loop is already running");
            }
            return;
        };

        let mut signal = self.coordinator.subscribe();
        match &self.local_addr {
            Some(addr) => info!(
                "Accepting syslog connections on {} (parser: {})",
                addr,
                self.parser.name()
            ),
            None => info!("Accepting syslog connections (parser: {})", self.parser.name()),
        }

        loop {
            let accepted = tokio::select! {
                biased;
                _ = signal.recv() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => self.spawn_reader(stream, peer),
                Err(e) => {
                    if self.coordinator.is_stopped() {
                        break;
                    }
                    self.metrics.record_accept_error();
                    error!("Error accepting connection: {}", e);

                    // Transient (e.g. out of file descriptors): pause, keep going
                    tokio::select! {
                        biased;
                        _ = signal.recv() => break,
                        _ = tokio::time::sleep(self.settings.accept_backoff) => {}
                    }
                }
            }
        }

        drop(listener);
        info!("Stopped accepting syslog connections");
    }

    fn spawn_reader(&self, stream: L::Stream, peer: String) {
        let Some(queue) = self.queue.lock().clone() else {
            debug!("Rejecting connection from {} during shutdown", peer);
            return;
        };

        debug!("Accepted connection from {}", peer);
        let guard = self.registry.register(peer);
        self.readers
            .spawn(reader::read_connection(stream, guard, self.reader_context(), queue));
    }

    fn reader_context(&self) -> ReaderContext {
        ReaderContext {
            parser: Arc::clone(&self.parser),
            coordinator: Arc::clone(&self.coordinator),
            metrics: Arc::clone(&self.metrics),
            max_line_bytes: self.settings.max_line_bytes,
        }
    }

    /// Stop the server. Never blocks; safe to call repeatedly and concurrently.
    ///
    /// The first call broadcasts the shutdown signal, closes the output queue
    /// and closes the listening socket, and returns `true`. Later calls do
    /// nothing and return `false`.
    pub fn shutdown(&self) -> bool {
        if !self.coordinator.stop() {
            debug!("Shutdown already performed");
            return false;
        }

        drop(self.queue.lock().take());
        // Only still present if start() never ran; otherwise the accept loop
        // drops it when it sees the signal.
        drop(self.listener.lock().take());
        self.readers.close();

        info!(
            "Syslog server shutting down ({} connection(s) draining)",
            self.registry.len()
        );
        true
    }

    /// Resolve once shutdown has happened and every reader task has exited.
    pub async fn wait(&self) {
        self.readers.wait().await;
    }
}

impl SyslogServer {
    /// Bind the configured address and create the output queue, using the
    /// Docker syslog parser.
    pub async fn bind(
        config: &CollectorConfig,
    ) -> CollectorResult<(Self, mpsc::Receiver<SyslogMessage>)> {
        let addr = config.validate()?;
        let listener = IngestListener::bind(&addr).await?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let server = Self::new(
            listener,
            tx,
            Arc::new(DockerLogParser::new()),
            ServerSettings::from(config),
        );
        Ok((server, rx))
    }
}
