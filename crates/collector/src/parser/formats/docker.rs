use bytes::Bytes;
use tracing::trace;
use crate::parser::priority::parse_priority;
use crate::parser::traits::{LineParser, SyslogMessage};

/// Parser for lines written by Docker's syslog log driver.
///
/// Handles both header layouts the driver emits:
///
/// - `DefaultFormatter`: `<30>2016-07-06T15:13:11Z00:00 hostname docker/9648c64f5037[16200]: body`
/// - `UnixFormatter`:    `<30>Jul  6 15:13:11 docker/9648c64f5037[16200]: body`
///
/// Lines with no readable priority become degraded messages; lines with no
/// recognisable header keep everything after the priority as the body.
#[derive(Debug, Default, Clone, Copy)]
pub struct DockerLogParser;

impl DockerLogParser {
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for DockerLogParser {
    fn parse(&self, line: &[u8]) -> SyslogMessage {
        let (priority, after_priority) = match parse_priority(line) {
            Ok((pri, cursor)) => (Some(pri), cursor),
            Err(e) => {
                trace!("Unreadable syslog priority: {}", e);
                (None, 0)
            }
        };

        let start = content_index(line).unwrap_or(after_priority);
        let body = Bytes::copy_from_slice(&line[start..]);

        SyslogMessage::new(priority, body)
    }

    fn name(&self) -> &'static str {
        "docker"
    }
}

/// Index of the first body byte after the syslog header, if a header is present.
///
/// The timestamp holds the first two colons; the tag follows the next space
/// and is terminated by `": "`.
fn content_index(line: &[u8]) -> Option<usize> {
    let second_colon = line
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b':')
        .nth(1)
        .map(|(i, _)| i)?;

    let space = second_colon + line[second_colon..].iter().position(|&b| b == b' ')?;

    let separator = space + line[space..].windows(2).position(|w| w == b": ")?;

    Some(separator + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model::Severity;

    #[test]
    fn test_parse_default_formatter() {
        let parser = DockerLogParser::new();
        let line = b"<30>2016-07-06T15:13:11Z00:00 hostname docker/9648c64f5037[16200]: 1:C 25 Jul 00:53:56.396 # Warning";
        let msg = parser.parse(line);
        assert_eq!(msg.severity(), Some(Severity::Info));
        assert_eq!(msg.message.as_ref(), b"1:C 25 Jul 00:53:56.396 # Warning");
    }

    #[test]
    fn test_parse_unix_formatter() {
        let parser = DockerLogParser::new();
        let line = b"<27>Jul  6 15:13:11 docker/9648c64f5037[16200]: failed to connect";
        let msg = parser.parse(line);
        // 27 => facility 3 (daemon), severity 3 (error)
        assert_eq!(msg.severity(), Some(Severity::Error));
        assert_eq!(msg.priority.unwrap().facility.as_str(), "daemon");
        assert_eq!(msg.message.as_ref(), b"failed to connect");
    }

    #[test]
    fn test_parse_body_containing_separator() {
        let parser = DockerLogParser::new();
        let line = b"<30>Jul  6 15:13:11 docker/abc[1]: key: value";
        let msg = parser.parse(line);
        assert_eq!(msg.message.as_ref(), b"key: value");
    }

    #[test]
    fn test_parse_empty_body() {
        let parser = DockerLogParser::new();
        let line = b"<30>Jul  6 15:13:11 docker/abc[1]: ";
        let msg = parser.parse(line);
        assert_eq!(msg.severity(), Some(Severity::Info));
        assert!(msg.message.is_empty());
    }

    #[test]
    fn test_parse_priority_without_header() {
        let parser = DockerLogParser::new();
        let msg = parser.parse(b"<14>just a message");
        assert_eq!(msg.severity(), Some(Severity::Info));
        assert_eq!(msg.message.as_ref(), b"just a message");
    }

    #[test]
    fn test_parse_plain_line_is_degraded() {
        let parser = DockerLogParser::new();
        let msg = parser.parse(b"hello");
        assert!(msg.is_degraded());
        assert_eq!(msg.message.as_ref(), b"hello");
    }

    #[test]
    fn test_parse_empty_line_is_degraded() {
        let parser = DockerLogParser::new();
        let msg = parser.parse(b"");
        assert!(msg.is_degraded());
        assert!(msg.message.is_empty());
    }

    #[test]
    fn test_parse_non_utf8_never_fails() {
        let parser = DockerLogParser::new();
        let msg = parser.parse(b"\xFF\xFE\x00\x01");
        assert!(msg.is_degraded());
        assert_eq!(msg.message.as_ref(), b"\xFF\xFE\x00\x01");
    }

    #[test]
    fn test_parse_bad_priority_keeps_header_body() {
        let parser = DockerLogParser::new();
        let msg = parser.parse(b"<abc>Jul  6 15:13:11 docker/abc[1]: body");
        assert!(msg.is_degraded());
        assert_eq!(msg.message.as_ref(), b"body");
    }

    #[test]
    fn test_message_owns_its_bytes() {
        let parser = DockerLogParser::new();
        let mut buf = b"<30>Jul  6 15:13:11 docker/abc[1]: first".to_vec();
        let msg = parser.parse(&buf);
        buf.clear();
        buf.extend_from_slice(b"overwritten");
        assert_eq!(msg.message.as_ref(), b"first");
    }
}
