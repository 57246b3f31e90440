//! Registry — live connection tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::metrics::IngestMetrics;

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: u64,
    pub peer: String,
    pub connected_at: DateTime<Utc>,
}

/// All connections currently owned by a reader task.
#[derive(Debug)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    live: DashMap<u64, ConnectionInfo>,
    metrics: Arc<IngestMetrics>,
}

impl ConnectionRegistry {
    pub fn new(metrics: Arc<IngestMetrics>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            live: DashMap::new(),
            metrics,
        }
    }

    /// Record a freshly accepted connection.
    ///
    /// The entry lives exactly as long as the returned guard.
    pub fn register(self: &Arc<Self>, peer: String) -> ConnectionGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.live.insert(
            id,
            ConnectionInfo {
                id,
                peer,
                connected_at: Utc::now(),
            },
        );
        self.metrics.connection_opened();

        ConnectionGuard {
            id,
            registry: Arc::clone(self),
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Connections sorted by id (accept order).
    pub fn list(&self) -> Vec<ConnectionInfo> {
        let mut connections: Vec<ConnectionInfo> =
            self.live.iter().map(|entry| entry.value().clone()).collect();
        connections.sort_by_key(|c| c.id);
        connections
    }
}

/// Removes its registry entry when the reader that owns it exits.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: u64,
    registry: Arc<ConnectionRegistry>,
}

impl ConnectionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some((_, info)) = self.registry.live.remove(&self.id) {
            debug!("Connection #{} from {} closed", info.id, info.peer);
        }
        self.registry.metrics.connection_closed();
    }
}
