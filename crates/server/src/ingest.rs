//! Inbound line protocol.
//!
//! Every transport (WebSocket text frames, the TCP listener) funnels lines
//! through [`ingest_line`]. A malformed line is logged and dropped; the
//! connection stays open.

use std::sync::Arc;

use cardio_core::error::CoreError;
use cardio_core::reading::Reading;
use cardio_core::wire;
use cardio_store::TimeSeriesStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Longest accepted TCP ingest line, newline included.
pub const MAX_LINE_BYTES: usize = 4096;

/// Parse one line and append it to the store.
pub fn ingest_line(store: &TimeSeriesStore, line: &str) -> Result<Reading, CoreError> {
    match wire::parse_line(line) {
        Ok(reading) => {
            store.append(reading);
            Ok(reading)
        }
        Err(e) => {
            tracing::warn!(line = %line, error = %e, "Dropped malformed ingest line");
            Err(e)
        }
    }
}

/// Ingest every line of a multi-line payload. Blank lines are skipped.
///
/// Returns the number of readings stored.
pub fn ingest_text(store: &TimeSeriesStore, text: &str) -> usize {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| ingest_line(store, line).is_ok())
        .count()
}

/// Decode one raw line and ingest it. Blank lines yield `Ok(None)`.
pub fn ingest_raw_line(store: &TimeSeriesStore, raw: &[u8]) -> Result<Option<Reading>, CoreError> {
    let line = std::str::from_utf8(raw).map_err(|e| {
        let err = CoreError::Parse {
            line: String::from_utf8_lossy(raw).trim_end().to_string(),
            reason: format!("invalid UTF-8 after byte {}", e.valid_up_to()),
        };
        tracing::warn!(error = %err, "Dropped malformed ingest line");
        err
    })?;
    if line.trim().is_empty() {
        return Ok(None);
    }
    ingest_line(store, line.trim_end_matches(['\r', '\n'])).map(Some)
}

/// Accept TCP connections until cancelled, one task per connection.
pub async fn serve_tcp_ingest(
    listener: TcpListener,
    store: Arc<TimeSeriesStore>,
    cancel: CancellationToken,
) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "TCP ingest accept failed");
                    continue;
                }
            },
        };

        tracing::debug!(%peer, "TCP ingest client connected");
        let store = Arc::clone(&store);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let stored = read_lines(stream, &store, cancel).await;
            tracing::debug!(%peer, stored, "TCP ingest client disconnected");
        });
    }
    tracing::info!("TCP ingest listener stopped");
}

#[derive(Debug)]
enum LineRead {
    Line,
    Oversized,
    Eof,
}

/// Read up to [`MAX_LINE_BYTES`] of the next line into `buf`.
///
/// An overlong line is consumed through its newline and reported as
/// `Oversized` with `buf` left empty.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_LINE_BYTES as u64;
    buf.clear();
    if (&mut *reader).take(limit).read_until(b'\n', buf).await? == 0 {
        return Ok(LineRead::Eof);
    }
    if buf.ends_with(b"\n") || buf.len() < MAX_LINE_BYTES {
        return Ok(LineRead::Line);
    }

    loop {
        buf.clear();
        let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
        if read == 0 || buf.ends_with(b"\n") {
            break;
        }
    }
    buf.clear();
    Ok(LineRead::Oversized)
}

async fn read_lines(stream: TcpStream, store: &TimeSeriesStore, cancel: CancellationToken) -> usize {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::with_capacity(256);
    let mut stored = 0;
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = next_line(&mut reader, &mut buf) => next,
        };
        match next {
            Ok(LineRead::Line) => {
                if let Ok(Some(_)) = ingest_raw_line(store, &buf) {
                    stored += 1;
                }
            }
            Ok(LineRead::Oversized) => {
                tracing::warn!(limit = MAX_LINE_BYTES, "Dropped oversized ingest line");
            }
            Ok(LineRead::Eof) => break,
            Err(e) => {
                tracing::warn!(error = %e, "TCP ingest read failed");
                break;
            }
        }
    }
    stored
}
