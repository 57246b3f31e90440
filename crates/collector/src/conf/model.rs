//! Model — CollectorConfig.

use serde::{Deserialize, Serialize};

/// Longest accepted line in bytes (matches the default Go/bufio scanner limit
/// the Docker syslog driver is commonly paired with).
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// Upper bound accepted for `max_line_bytes`.
pub const MAX_LINE_BYTES_LIMIT: usize = 16 * 1024 * 1024;

/// Upper bound accepted for `queue_capacity`.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// `tcp://host:port`, bare `host:port`, or `unix:///path/to/socket`
    pub listen_address: String,
    /// Capacity of the output queue; a full queue blocks connection readers.
    pub queue_capacity: usize,
    /// Lines longer than this terminate the offending connection.
    pub max_line_bytes: usize,
    /// Pause after a transient accept failure.
    pub accept_backoff_ms: u64,
    /// How long the binary waits for in-flight readers after shutdown.
    pub drain_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            listen_address: "tcp://127.0.0.1:5140".to_string(),
            queue_capacity: 1024,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            accept_backoff_ms: 10,
            drain_timeout_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ─────────────────────────────────────────────────

    #[test]
    fn test_default_listen_address() {
        let cfg = CollectorConfig::default();
        assert_eq!(cfg.listen_address, "tcp://127.0.0.1:5140");
    }

    #[test]
    fn test_default_limits() {
        let cfg = CollectorConfig::default();
        assert_eq!(cfg.queue_capacity, 1024);
        assert_eq!(cfg.max_line_bytes, 65536);
        assert_eq!(cfg.accept_backoff_ms, 10);
        assert_eq!(cfg.drain_timeout_ms, 5000);
    }

    // ── Serialization ────────────────────────────────────────────

    #[test]
    fn test_config_toml_round_trip() {
        let cfg = CollectorConfig::default();
        let toml_str = toml::to_string(&cfg).expect("Should serialize to TOML");
        let deserialized: CollectorConfig = toml::from_str(&toml_str).expect("Should deserialize from TOML");
        assert_eq!(deserialized, cfg);
    }

    #[test]
    fn test_config_deserialize_partial_toml() {
        // Only set listen_address; rest should use defaults via #[serde(default)]
        let toml_str = r#"listen_address = "unix:///run/collector.sock""#;
        let cfg: CollectorConfig = toml::from_str(toml_str).expect("Should accept partial TOML");
        assert_eq!(cfg.listen_address, "unix:///run/collector.sock");
        assert_eq!(cfg.queue_capacity, 1024); // default
    }
}
