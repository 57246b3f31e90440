//! Listener — TCP / Unix socket binding and the accepted stream type.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};
use tracing::debug;

use crate::conf::ListenAddr;
use crate::error::{CollectorError, CollectorResult};

/// Anything the accept loop can take connections from.
///
/// `IngestListener` is the real implementation; tests plug in sources that
/// fail on demand. Dropping the source must stop accepting.
pub trait ConnectionSource: Send + Sync + 'static {
    type Stream: AsyncRead + Unpin + Send + 'static;

    /// Wait for the next connection. Returns the stream and a printable peer.
    fn accept(
        &self,
    ) -> Pin<Box<dyn Future<Output = io::Result<(Self::Stream, String)>> + Send + '_>>;

    fn local_addr(&self) -> io::Result<ListenAddr>;
}

/// A bound listening socket. Dropping it closes the socket.
#[derive(Debug)]
pub enum IngestListener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixIngress),
}

/// Unix listener that unlinks its socket file when dropped.
#[cfg(unix)]
#[derive(Debug)]
pub struct UnixIngress {
    listener: UnixListener,
    path: std::path::PathBuf,
}

#[cfg(unix)]
impl Drop for UnixIngress {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                debug!("Failed to remove socket file {}: {}", self.path.display(), e);
            }
        }
    }
}

impl IngestListener {
    /// Bind the given address. Must be called from within a tokio runtime.
    pub async fn bind(addr: &ListenAddr) -> CollectorResult<Self> {
        match addr {
            ListenAddr::Tcp(socket_addr) => {
                let listener = TcpListener::bind(*socket_addr)
                    .await
                    .map_err(|source| CollectorError::Bind {
                        address: addr.to_string(),
                        source,
                    })?;
                Ok(IngestListener::Tcp(listener))
            }
            #[cfg(unix)]
            ListenAddr::Unix(path) => {
                // A socket file left behind by a previous run makes bind fail
                match std::fs::remove_file(path) {
                    Ok(()) => debug!("Removed stale socket file {}", path.display()),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(source) => {
                        return Err(CollectorError::Bind {
                            address: addr.to_string(),
                            source,
                        })
                    }
                }
                let listener = UnixListener::bind(path).map_err(|source| CollectorError::Bind {
                    address: addr.to_string(),
                    source,
                })?;
                Ok(IngestListener::Unix(UnixIngress {
                    listener,
                    path: path.clone(),
                }))
            }
            #[cfg(not(unix))]
            ListenAddr::Unix(_) => Err(CollectorError::InvalidAddress(format!(
                "{} (unix sockets are not supported on this platform)",
                addr
            ))),
        }
    }

    /// Wait for the next connection. Returns the stream and a printable peer.
    pub async fn accept(&self) -> io::Result<(IngestStream, String)> {
        match self {
            IngestListener::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                Ok((IngestStream::Tcp(stream), peer.to_string()))
            }
            #[cfg(unix)]
            IngestListener::Unix(ingress) => {
                let (stream, peer) = ingress.listener.accept().await?;
                let peer = peer
                    .as_pathname()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "unix".to_string());
                Ok((IngestStream::Unix(stream), peer))
            }
        }
    }

    /// The address actually bound (resolves port 0 for TCP).
    pub fn local_addr(&self) -> io::Result<ListenAddr> {
        match self {
            IngestListener::Tcp(listener) => listener.local_addr().map(ListenAddr::Tcp),
            #[cfg(unix)]
            IngestListener::Unix(ingress) => Ok(ListenAddr::Unix(ingress.path.clone())),
        }
    }
}

impl ConnectionSource for IngestListener {
    type Stream = IngestStream;

    fn accept(
        &self,
    ) -> Pin<Box<dyn Future<Output = io::Result<(IngestStream, String)>> + Send + '_>> {
        Box::pin(IngestListener::accept(self))
    }

    fn local_addr(&self) -> io::Result<ListenAddr> {
        IngestListener::local_addr(self)
    }
}

/// An accepted producer connection.
#[derive(Debug)]
pub enum IngestStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl AsyncRead for IngestStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            IngestStream::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(unix)]
            IngestStream::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}
