/// Line parsing for ingested syslog records
///
/// Converts one raw line (without its trailing newline) into a structured
/// `SyslogMessage`.
///
/// # Architecture
///
/// - `traits.rs`: the `LineParser` seam used by connection readers
/// - `model.rs`: message, priority, severity and facility types
/// - `priority.rs`: `<PRI>` token decoding
/// - `formats/`: parser implementations
///
/// Parsers never fail: unreadable input yields a degraded message that still
/// carries the line body.

pub mod traits;
pub mod model;
pub mod priority;
pub mod formats;
mod serde_utils;

// Re-export commonly used types
pub use traits::LineParser;
pub use model::{Facility, Priority, Severity, SyslogMessage};
pub use formats::{DockerLogParser, PlainLineParser};
