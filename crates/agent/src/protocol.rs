//! Stdio protocol drivers
//!
//! Responses are the only thing ever written to the output stream;
//! diagnostics go through `tracing`.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::wire::{decode_messages, encode_invocation, FramingError};
use crate::{Invocation, Invoke, Result};

/// Counters reported when the daemon reaches end of input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonStats {
    /// Lines read, blank ones included
    pub lines: usize,
    pub responses: usize,
    pub skipped: usize,
    /// Lines that were not a JSON array of messages
    pub rejected: usize,
    /// Lines whose invocation failed recoverably
    pub failed: usize,
}

/// Read the whole input, answer it once, write the answer without a newline
pub async fn run_single<I, R, W>(agent: &I, mut input: R, mut output: W) -> Result<()>
where
    I: Invoke + ?Sized,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = Vec::new();
    input.read_to_end(&mut raw).await?;
    debug!(bytes = raw.len(), "read single-shot input");

    let messages = decode_messages(&raw)?;
    let invocation = agent.invoke(messages).await?;

    write_response(&mut output, &invocation, false).await
}

/// Answer one JSON array per input line until end of input
///
/// Bad lines and recoverable invocation failures are logged and skipped.
/// A fatal failure ends the loop with an error.
pub async fn run_daemon<I, R, W>(agent: &I, input: R, mut output: W) -> Result<DaemonStats>
where
    I: Invoke + ?Sized,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("daemon ready, reading one JSON array per line");

    let mut reader = BufReader::new(input);
    let mut stats = DaemonStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        stats.lines += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(_) => {
                stats.rejected += 1;
                error!(line = stats.lines, "{}", FramingError::InvalidUtf8);
                continue;
            }
        };

        if line.is_empty() {
            stats.skipped += 1;
            continue;
        }

        let messages = match decode_messages(line.as_bytes()) {
            Ok(messages) => messages,
            Err(e) => {
                stats.rejected += 1;
                error!(line = stats.lines, "{}", e);
                continue;
            }
        };

        match agent.invoke(messages).await {
            Ok(invocation) => {
                write_response(&mut output, &invocation, true).await?;
                stats.responses += 1;
            }
            Err(e) if e.is_fatal() => {
                error!(line = stats.lines, "{}", e);
                return Err(e);
            }
            Err(e) => {
                stats.failed += 1;
                warn!(line = stats.lines, kind = ?e.kind(), "invocation failed: {}", e);
            }
        }
    }

    info!(
        lines = stats.lines,
        responses = stats.responses,
        skipped = stats.skipped,
        rejected = stats.rejected,
        failed = stats.failed,
        "end of input"
    );
    Ok(stats)
}

async fn write_response<W>(output: &mut W, invocation: &Invocation, newline: bool) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = encode_invocation(invocation).map_err(std::io::Error::from)?;
    if newline {
        bytes.push(b'\n');
    }
    output.write_all(&bytes).await?;
    output.flush().await?;
    Ok(())
}
