// Module structure for the syslog collector.

// Core infrastructure
pub mod conf;
pub mod error;
pub mod metrics;
pub mod parser;

// Ingestion
pub mod server;
pub mod sink;
pub mod runtime;
