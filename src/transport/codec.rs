//! Newline-delimited framing over any async byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::transport::message::{Frame, Inbound};
use crate::utils::{Error, Result};

/// Longest line accepted by `FrameReader::new`, newline excluded.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Splits a byte stream into frames.
///
/// Reads are buffered, so several frames in one segment and one frame spread
/// over several segments both decode the same way. Blank lines are skipped.
/// A line longer than the limit is a protocol error; nothing past the limit
/// is buffered.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    max_frame_bytes: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_frame_bytes(inner, DEFAULT_MAX_FRAME_BYTES)
    }

    pub fn with_max_frame_bytes(inner: R, max_frame_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(inner),
            line: Vec::new(),
            max_frame_bytes,
        }
    }

    /// Returns the next frame, or `None` at end of stream.
    ///
    /// Not cancellation safe: a partially read line is discarded if the
    /// future is dropped.
    pub async fn next_frame(&mut self) -> Result<Option<Inbound>> {
        // room for the payload plus its newline
        let limit = self.max_frame_bytes as u64 + 1;

        loop {
            self.line.clear();
            let n = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.line)
                .await?;
            if n == 0 {
                return Ok(None);
            }
            if n > self.max_frame_bytes && self.line.last() != Some(&b'\n') {
                return Err(Error::Protocol(format!(
                    "frame exceeds {} bytes",
                    self.max_frame_bytes
                )));
            }
            if self.line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Frame::decode(&self.line).map(Some);
        }
    }
}

/// Writes `frame` as a single line.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> Result<()> {
    let buf = frame.encode()?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
