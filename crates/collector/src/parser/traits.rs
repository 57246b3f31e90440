pub use super::model::{Facility, Priority, Severity, SyslogMessage};

/// Converts one raw line into a structured message.
///
/// Implementations are called from every connection reader concurrently.
/// They must not block and must not fail: input they cannot make sense of
/// still produces a (degraded) message.
pub trait LineParser: Send + Sync {
    /// `line` excludes the trailing newline.
    fn parse(&self, line: &[u8]) -> SyslogMessage;

    fn name(&self) -> &'static str;
}
