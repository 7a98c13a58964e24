use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read size used by `ReaderSource::new`
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Type alias for the future returned by `ByteSource::read_chunk`
pub type ChunkFuture<'a> = Pin<Box<dyn Future<Output = io::Result<Option<Bytes>>> + Send + 'a>>;

/// An open, already-addressed response body
///
/// Connection setup, TLS, headers and authentication all happen before a
/// source reaches this crate. Dropping the source releases the underlying
/// connection.
pub trait ByteSource: Send {
    /// Read the next available bytes
    ///
    /// # Returns
    /// `Ok(Some(bytes))` with whatever the transport delivered (possibly a
    /// fragment of a line), `Ok(None)` once the body is exhausted
    fn read_chunk(&mut self) -> ChunkFuture<'_>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_chunk(&mut self) -> ChunkFuture<'_> {
        (**self).read_chunk()
    }
}

impl ByteSource for reqwest::Response {
    fn read_chunk(&mut self) -> ChunkFuture<'_> {
        Box::pin(async move { self.chunk().await.map_err(io::Error::other) })
    }
}

/// Adapts a stream of byte chunks, e.g. `reqwest::Response::bytes_stream()`
pub struct BodyStream<S> {
    inner: S,
}

impl<S> BodyStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, E> ByteSource for BodyStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn read_chunk(&mut self) -> ChunkFuture<'_> {
        Box::pin(async move {
            match self.inner.next().await {
                Some(Ok(bytes)) => Ok(Some(bytes)),
                Some(Err(e)) => Err(io::Error::other(e)),
                None => Ok(None),
            }
        })
    }
}

/// Adapts any async reader: a file holding a captured body, stdin, a pipe
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
}

impl<R> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Cap every read at `chunk_size` bytes (minimum 1)
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<R> ByteSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    fn read_chunk(&mut self) -> ChunkFuture<'_> {
        Box::pin(async move {
            let mut buf = BytesMut::with_capacity(self.chunk_size);
            let read = self.reader.read_buf(&mut buf).await?;
            if read == 0 {
                Ok(None)
            } else {
                Ok(Some(buf.freeze()))
            }
        })
    }
}
