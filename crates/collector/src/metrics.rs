use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use serde::Serialize;

/// Forces the wrapped counter group onto its own 64-byte cache line so that
/// readers on different cores do not invalidate each other's counters.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Connection lifecycle counters
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    pub accepted: AtomicU64,
    pub closed: AtomicU64,
    pub active: AtomicI64,
}

/// Per-line counters (hottest path - updated once per line)
#[derive(Debug, Default)]
pub struct LineMetrics {
    pub published: AtomicU64,
    pub degraded: AtomicU64,
    pub dropped_on_shutdown: AtomicU64,
    pub oversized: AtomicU64,
}

/// Listener error counters
#[derive(Debug, Default)]
pub struct AcceptMetrics {
    pub errors: AtomicU64,
}

/// Ingestion metrics shared by the accept loop and every connection reader.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` is not transactional
/// across groups.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    pub connections: CacheAligned<ConnectionMetrics>,
    pub lines: CacheAligned<LineMetrics>,
    pub accept: CacheAligned<AcceptMetrics>,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Connections ---

    #[inline]
    pub fn connection_opened(&self) {
        self.connections.0.accepted.fetch_add(1, Ordering::Relaxed);
        self.connections.0.active.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connection_closed(&self) {
        self.connections.0.closed.fetch_add(1, Ordering::Relaxed);
        self.connections.0.active.fetch_sub(1, Ordering::Relaxed);
    }

    // --- Lines ---

    /// Record a message handed to the output queue
    #[inline]
    pub fn record_published(&self, degraded: bool) {
        self.lines.0.published.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.lines.0.degraded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a parsed message discarded because the server was stopping
    #[inline]
    pub fn record_dropped(&self) {
        self.lines.0.dropped_on_shutdown.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_oversized(&self) {
        self.lines.0.oversized.fetch_add(1, Ordering::Relaxed);
    }

    // --- Listener ---

    #[inline]
    pub fn record_accept_error(&self) {
        self.accept.0.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections.0.accepted.load(Ordering::Relaxed),
            connections_closed: self.connections.0.closed.load(Ordering::Relaxed),
            connections_active: self.connections.0.active.load(Ordering::Relaxed),
            lines_published: self.lines.0.published.load(Ordering::Relaxed),
            lines_degraded: self.lines.0.degraded.load(Ordering::Relaxed),
            lines_dropped_on_shutdown: self.lines.0.dropped_on_shutdown.load(Ordering::Relaxed),
            lines_oversized: self.lines.0.oversized.load(Ordering::Relaxed),
            accept_errors: self.accept.0.errors.load(Ordering::Relaxed),
        }
    }
}

/// A read-only snapshot of ingestion metrics, suitable for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub connections_closed: u64,
    pub connections_active: i64,
    pub lines_published: u64,
    pub lines_degraded: u64,
    pub lines_dropped_on_shutdown: u64,
    pub lines_oversized: u64,
    pub accept_errors: u64,
}
