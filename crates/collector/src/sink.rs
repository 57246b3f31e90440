//! Sink — the queue consumer used by the binary.
//!
//! Writes each message body on its own line: error-or-worse severities go to
//! the error writer, everything else (degraded messages included) to the
//! output writer.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::parser::SyslogMessage;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    pub stdout_lines: u64,
    pub stderr_lines: u64,
}

/// Consume the queue until it ends, returning how many lines went where.
pub async fn drain<O, E>(
    messages: mpsc::Receiver<SyslogMessage>,
    mut out: O,
    mut err: E,
) -> std::io::Result<SinkStats>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let mut stats = SinkStats::default();
    let mut stream = ReceiverStream::new(messages);

    while let Some(msg) = stream.next().await {
        let to_err = msg.severity().is_some_and(|s| s.is_error());
        if to_err {
            write_line(&mut err, &msg.message).await?;
            stats.stderr_lines += 1;
        } else {
            write_line(&mut out, &msg.message).await?;
            stats.stdout_lines += 1;
        }
    }

    out.flush().await?;
    err.flush().await?;
    debug!(
        "Sink drained: {} line(s) to stdout, {} to stderr",
        stats.stdout_lines, stats.stderr_lines
    );
    Ok(stats)
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, body: &[u8]) -> std::io::Result<()> {
    writer.write_all(body).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
