use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::source::ByteSource;
use bytes::{Bytes, BytesMut};

const DELIMITER: u8 = b'\n';

/// Reassembles newline-terminated lines from arbitrarily fragmented reads
pub struct LineFramer<S> {
    source: S,
    buffer: BytesMut,
    /// Prefix of `buffer` already searched for the delimiter
    scanned: usize,
    max_line_bytes: usize,
    exhausted: bool,
    bytes_read: u64,
}

impl<S: ByteSource> LineFramer<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, &StreamConfig::default())
    }

    pub fn with_config(source: S, config: &StreamConfig) -> Self {
        Self {
            source,
            buffer: BytesMut::with_capacity(config.initial_capacity),
            scanned: 0,
            max_line_bytes: config.max_line_bytes,
            exhausted: false,
            bytes_read: 0,
        }
    }

    /// Next line including its delimiter.
    ///
    /// Suspends until a whole line is buffered. Returns `Ok(None)` once the
    /// source is exhausted; bytes of an unterminated final line stay in the
    /// buffer and are reported by [`LineFramer::buffered`].
    pub async fn next_line(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(pos) = self.find_delimiter() {
                // same limit whether the line arrived whole or in pieces
                if pos > self.max_line_bytes {
                    return Err(self.too_long());
                }
                let line = self.buffer.split_to(pos + 1).freeze();
                self.scanned = 0;
                return Ok(Some(line));
            }

            self.scanned = self.buffer.len();
            if self.scanned > self.max_line_bytes {
                return Err(self.too_long());
            }

            if self.exhausted {
                return Ok(None);
            }

            match self.source.read_chunk().await? {
                Some(chunk) => {
                    self.bytes_read += chunk.len() as u64;
                    self.buffer.extend_from_slice(&chunk);
                }
                None => self.exhausted = true,
            }
        }
    }

    fn too_long(&self) -> StreamError {
        StreamError::LineTooLong {
            limit: self.max_line_bytes,
        }
    }

    fn find_delimiter(&self) -> Option<usize> {
        self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == DELIMITER)
            .map(|offset| self.scanned + offset)
    }

    /// Bytes received but not yet returned as a line
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes pulled from the source so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
