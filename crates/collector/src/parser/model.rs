use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use super::serde_utils::serialize_bytes_lossy;

/// Syslog severity levels (RFC 5424 §6.2.1), most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

const SEVERITIES: [Severity; 8] = [
    Severity::Emergency,
    Severity::Alert,
    Severity::Critical,
    Severity::Error,
    Severity::Warning,
    Severity::Notice,
    Severity::Info,
    Severity::Debug,
];

impl Severity {
    /// Severity encoded in the low three bits of a priority value.
    pub fn from_code(code: u8) -> Option<Self> {
        SEVERITIES.get(code as usize).copied()
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Emergency => "emergency",
            Severity::Alert => "alert",
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }

    /// `error` or anything more severe.
    pub fn is_error(&self) -> bool {
        *self <= Severity::Error
    }
}

/// Syslog facility names (RFC 5424 §6.2.1), indexed by facility code.
const FACILITY_NAMES: [&str; 24] = [
    "kern", "user", "mail", "daemon", "auth", "syslog", "lpr", "news",
    "uucp", "cron", "authpriv", "ftp", "ntp", "audit", "alert2", "clock",
    "local0", "local1", "local2", "local3", "local4", "local5", "local6", "local7",
];

/// Facility code in the range `0..24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub struct Facility(u8);

impl Facility {
    pub fn from_code(code: u8) -> Option<Self> {
        if (code as usize) < FACILITY_NAMES.len() {
            Some(Self(code))
        } else {
            None
        }
    }

    pub fn code(&self) -> u8 {
        self.0
    }

    pub fn as_str(&self) -> &'static str {
        FACILITY_NAMES[self.0 as usize]
    }
}

impl From<Facility> for &'static str {
    fn from(facility: Facility) -> Self {
        facility.as_str()
    }
}

/// Decoded `<PRI>` value: `facility * 8 + severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Priority {
    pub value: u8,
    pub facility: Facility,
    pub severity: Severity,
}

impl Priority {
    /// Split a raw priority value. Values above 191 carry no valid facility.
    pub fn from_value(value: u8) -> Option<Self> {
        let facility = Facility::from_code(value >> 3)?;
        let severity = Severity::from_code(value & 0x07)?;
        Some(Self { value, facility, severity })
    }
}

/// One ingested log line after parsing.
///
/// Messages are immutable once built; the body is an owned copy of the bytes
/// read from the connection, so later reads never alias it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyslogMessage {
    /// `None` when the line carried no readable priority (degraded message).
    pub priority: Option<Priority>,

    /// Log body with the syslog header removed.
    #[serde(serialize_with = "serialize_bytes_lossy")]
    pub message: Bytes,

    /// When the collector read the line.
    pub received_at: DateTime<Utc>,
}

impl SyslogMessage {
    pub fn new(priority: Option<Priority>, message: Bytes) -> Self {
        Self {
            priority,
            message,
            received_at: Utc::now(),
        }
    }

    /// Best-effort message for a line whose header could not be read.
    pub fn degraded(message: Bytes) -> Self {
        Self::new(None, message)
    }

    pub fn severity(&self) -> Option<Severity> {
        self.priority.map(|p| p.severity)
    }

    pub fn is_degraded(&self) -> bool {
        self.priority.is_none()
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn message_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.message)
    }
}
