//! Addr — listen address parsing.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::CollectorError;

/// Where the collector accepts producer connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddr {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl FromStr for ListenAddr {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(CollectorError::InvalidAddress(s.to_string()));
            }
            return Ok(ListenAddr::Unix(PathBuf::from(path)));
        }

        let host_port = s.strip_prefix("tcp://").unwrap_or(s);
        host_port
            .parse::<SocketAddr>()
            .map(ListenAddr::Tcp)
            .map_err(|_| CollectorError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenAddr::Tcp(addr) => write!(f, "tcp://{}", addr),
            ListenAddr::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
