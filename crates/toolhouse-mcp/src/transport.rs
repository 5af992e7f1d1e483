//! Content-Length framed JSON messages over a bidirectional stream.
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! {"jsonrpc": "2.0", "id": 1, "method": "...", "params": {...}}
//! ```
//!
//! Generic over the stream pair so the server loop runs identically on
//! process stdio and on in-memory pipes in tests.

use serde::Serialize;
use serde_json::Value;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin,
    Stdout,
};

use crate::error::{Result, ServerError};

/// Framed transport over an async read/write pair.
pub struct StdioTransport<R, W> {
    reader: R,
    writer: W,
}

impl StdioTransport<BufReader<Stdin>, Stdout> {
    /// Transport over the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a transport over an arbitrary stream pair.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read the next framed message. Returns `Ok(None)` when the stream is
    /// closed cleanly between messages.
    pub async fn read_message(&mut self) -> Result<Option<Value>> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_header = false;

        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                if saw_header {
                    return Err(ServerError::transport("stream closed mid-frame"));
                }
                return Ok(None);
            }

            let trimmed = line.trim();

            // Empty line signals end of headers
            if trimmed.is_empty() {
                if saw_header {
                    break;
                }
                // Tolerate stray blank lines between frames
                continue;
            }

            saw_header = true;
            if let Some(len_str) = trimmed.strip_prefix("Content-Length:") {
                content_length = Some(len_str.trim().parse().map_err(|e| {
                    ServerError::protocol(format!("invalid Content-Length: {}", e))
                })?);
            }
        }

        let content_length =
            content_length.ok_or_else(|| ServerError::protocol("missing Content-Length header"))?;

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).await?;

        let json_str = String::from_utf8(body)
            .map_err(|e| ServerError::protocol(format!("invalid UTF-8 in message: {}", e)))?;

        tracing::trace!(content_length, json = %json_str, "received message");

        let message: Value = serde_json::from_str(&json_str)?;
        Ok(Some(message))
    }

    /// Write one framed message and flush.
    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let json = serde_json::to_string(message)?;

        let frame = format!("Content-Length: {}\r\n\r\n{}", json.len(), json);
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.flush().await?;

        tracing::trace!(content_length = json.len(), json = %json, "sent message");
        Ok(())
    }
}
