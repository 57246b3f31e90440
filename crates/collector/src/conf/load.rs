//! Load — config loading from file and environment variables.

use std::path::Path;

use super::addr::ListenAddr;
use super::model::{CollectorConfig, MAX_LINE_BYTES_LIMIT, MAX_QUEUE_CAPACITY};
use crate::error::{CollectorError, CollectorResult};

impl CollectorConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> CollectorResult<Self> {
        let config_path = std::env::var("COLLECTOR_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/collector/collector.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        // Environment variables override file config
        if let Ok(listen) = std::env::var("COLLECTOR_LISTEN") {
            config.listen_address = listen;
        }
        if let Some(capacity) = env_parse("COLLECTOR_QUEUE_CAPACITY") {
            config.queue_capacity = capacity;
        }
        if let Some(max) = env_parse("COLLECTOR_MAX_LINE_BYTES") {
            config.max_line_bytes = max;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> CollectorResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> CollectorResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_address: std::env::var("COLLECTOR_LISTEN")
                .unwrap_or(defaults.listen_address),
            queue_capacity: env_parse("COLLECTOR_QUEUE_CAPACITY")
                .unwrap_or(defaults.queue_capacity),
            max_line_bytes: env_parse("COLLECTOR_MAX_LINE_BYTES")
                .unwrap_or(defaults.max_line_bytes),
            accept_backoff_ms: env_parse("COLLECTOR_ACCEPT_BACKOFF_MS")
                .unwrap_or(defaults.accept_backoff_ms),
            drain_timeout_ms: env_parse("COLLECTOR_DRAIN_TIMEOUT_MS")
                .unwrap_or(defaults.drain_timeout_ms),
        }
    }

    /// Check that configuration values are sane and return the parsed listen address
    pub fn validate(&self) -> CollectorResult<ListenAddr> {
        if self.listen_address.trim().is_empty() {
            return Err(CollectorError::Config("listen_address must not be empty".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(CollectorError::Config("queue_capacity must be > 0".to_string()));
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(CollectorError::Config(format!(
                "queue_capacity must be <= {} (got {})",
                MAX_QUEUE_CAPACITY, self.queue_capacity
            )));
        }
        if self.max_line_bytes == 0 {
            return Err(CollectorError::Config("max_line_bytes must be > 0".to_string()));
        }
        if self.max_line_bytes > MAX_LINE_BYTES_LIMIT {
            return Err(CollectorError::Config(format!(
                "max_line_bytes must be <= {} (got {})",
                MAX_LINE_BYTES_LIMIT, self.max_line_bytes
            )));
        }
        self.listen_address.parse()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
