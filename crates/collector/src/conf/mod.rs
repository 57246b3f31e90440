//! Conf module — configuration model, loading, and listen addresses.

pub mod model;
pub mod load;
pub mod addr;

pub use model::{CollectorConfig, DEFAULT_MAX_LINE_BYTES, MAX_LINE_BYTES_LIMIT, MAX_QUEUE_CAPACITY};
pub use addr::ListenAddr;
