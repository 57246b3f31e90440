//! Reader — one task per accepted connection.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::registry::ConnectionGuard;
use super::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::metrics::IngestMetrics;
use crate::parser::{LineParser, SyslogMessage};

/// Everything a reader shares with the server and with other readers.
#[derive(Clone)]
pub struct ReaderContext {
    pub parser: Arc<dyn LineParser>,
    pub coordinator: Arc<ShutdownCoordinator>,
    pub metrics: Arc<IngestMetrics>,
    pub max_line_bytes: usize,
}

/// Why a reader stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Peer closed the connection.
    EndOfStream,
    ReadError,
    /// A line exceeded `max_line_bytes` before its newline arrived.
    LineTooLong,
    /// Shutdown was signalled; any partial line was abandoned.
    Shutdown,
    /// The output queue consumer went away.
    ConsumerGone,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Publish {
    Sent,
    /// Discarded because the server is stopping.
    Dropped,
    Closed,
}

/// Read newline-delimited records from `stream` until it ends, fails or
/// shutdown is signalled, publishing one parsed message per line in the
/// order the lines arrived.
///
/// The stream and the registry guard are released before returning, on
/// every path.
pub async fn read_connection<S>(
    stream: S,
    guard: ConnectionGuard,
    ctx: ReaderContext,
    queue: mpsc::Sender<SyslogMessage>,
) -> ReadOutcome
where
    S: AsyncRead + Unpin,
{
    let mut signal = ctx.coordinator.subscribe();
    let mut reader = BufReader::new(stream);
    let mut line = Vec::with_capacity(256);
    // One extra byte so a line of exactly max_line_bytes still fits its '\n'
    let limit = (ctx.max_line_bytes as u64).saturating_add(1);

    let outcome = loop {
        if signal.is_triggered() {
            break ReadOutcome::Shutdown;
        }

        line.clear();
        let mut bounded = (&mut reader).take(limit);
        let read = tokio::select! {
            biased;
            _ = signal.recv() => break ReadOutcome::Shutdown,
            read = bounded.read_until(b'\n', &mut line) => read,
        };

        match read {
            Ok(0) => break ReadOutcome::EndOfStream,
            Ok(_) => {
                let terminated = line.last() == Some(&b'\n');
                if !terminated && line.len() > ctx.max_line_bytes {
                    ctx.metrics.record_oversized();
                    break ReadOutcome::LineTooLong;
                }

                let message = ctx.parser.parse(trim_line_ending(&line));
                match publish(&queue, message, &ctx, &mut signal).await {
                    Publish::Sent => {}
                    Publish::Dropped => break ReadOutcome::Shutdown,
                    Publish::Closed => break ReadOutcome::ConsumerGone,
                }

                // An unterminated line is only returned at end of stream
                if !terminated {
                    break ReadOutcome::EndOfStream;
                }
            }
            Err(e) => {
                debug!("Read failed on connection #{}: {}", guard.id(), e);
                break ReadOutcome::ReadError;
            }
        }
    };

    drop(reader);
    debug!("Reader for connection #{} finished: {:?}", guard.id(), outcome);
    drop(guard);
    outcome
}

/// Hand one message to the output queue unless the server is stopping.
///
/// The state is checked right before the send, and a send blocked on a full
/// queue is abandoned as soon as shutdown is signalled.
pub(crate) async fn publish(
    queue: &mpsc::Sender<SyslogMessage>,
    message: SyslogMessage,
    ctx: &ReaderContext,
    signal: &mut ShutdownSignal,
) -> Publish {
    if ctx.coordinator.is_stopped() {
        ctx.metrics.record_dropped();
        return Publish::Dropped;
    }

    let degraded = message.is_degraded();
    tokio::select! {
        biased;
        _ = signal.recv() => {
            ctx.metrics.record_dropped();
            Publish::Dropped
        }
        sent = queue.send(message) => match sent {
            Ok(()) => {
                ctx.metrics.record_published(degraded);
                Publish::Sent
            }
            Err(_) => Publish::Closed,
        },
    }
}

/// Strip one trailing `\n` and an optional `\r` before it.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
