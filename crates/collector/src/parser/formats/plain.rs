use bytes::Bytes;
use crate::parser::traits::{LineParser, Priority, SyslogMessage};

/// `user.info`
const USER_INFO: u8 = 14;

/// Pass-through parser: the whole line becomes the body at `info` severity.
///
/// Useful for producers that write bare lines instead of syslog frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainLineParser;

impl LineParser for PlainLineParser {
    fn parse(&self, line: &[u8]) -> SyslogMessage {
        SyslogMessage::new(Priority::from_value(USER_INFO), Bytes::copy_from_slice(line))
    }

    fn name(&self) -> &'static str {
        "plain"
    }
}
