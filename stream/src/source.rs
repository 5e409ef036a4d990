use super::*;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

const DEFAULT_READ_SIZE: usize = 8 * 1024;

/// An asynchronous sequence of byte chunks.
///
/// `read` must be cancel-safe: a read future dropped before completion must
/// not lose data the source has already delivered.
#[async_trait]
pub trait ByteSource: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the next chunk, or `None` at the end of the sequence.
    async fn read(&mut self) -> Result<Option<Bytes>, Self::Error>;

    /// Closes the source. Later reads return `None`.
    async fn cancel(&mut self) -> Result<(), Self::Error>;
}

/// Adapts a [`Stream`] of byte chunks.
pub struct StreamSource<S> {
    stream: Option<S>,
}

impl<S> StreamSource<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

#[async_trait]
impl<S, E> ByteSource for StreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    async fn read(&mut self) -> Result<Option<Bytes>, E> {
        match &mut self.stream {
            Some(stream) => stream.next().await.transpose(),
            None => Ok(None),
        }
    }

    async fn cancel(&mut self) -> Result<(), E> {
        self.stream = None;
        Ok(())
    }
}

/// Adapts an [`AsyncRead`], reading up to a fixed number of bytes at a time.
pub struct ReaderSource<R> {
    reader: Option<R>,
    buffer: BytesMut,
    read_size: usize,
}

impl<R> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_read_size(reader, DEFAULT_READ_SIZE)
    }

    pub fn with_read_size(reader: R, read_size: usize) -> Self {
        Self {
            reader: Some(reader),
            buffer: BytesMut::new(),
            read_size: read_size.max(1),
        }
    }
}

#[async_trait]
impl<R> ByteSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    type Error = std::io::Error;

    async fn read(&mut self) -> std::io::Result<Option<Bytes>> {
        let Some(reader) = &mut self.reader else {
            return Ok(None);
        };
        self.buffer.reserve(self.read_size);
        let mut limited = reader.take(self.read_size as u64);
        if limited.read_buf(&mut self.buffer).await? == 0 {
            return Ok(None);
        }
        Ok(Some(self.buffer.split().freeze()))
    }

    async fn cancel(&mut self) -> std::io::Result<()> {
        self.reader = None;
        Ok(())
    }
}
