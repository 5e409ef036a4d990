use thiserror::Error;

/// Failure of a streaming operation over a source whose errors are `E`.
#[derive(Error, Debug)]
pub enum StreamError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Codec(#[from] quarry_cbor::Error),

    /// The source failed to produce the next chunk.
    #[error("Source failed: {0}")]
    Source(#[source] E),

    #[error("Operation cancelled")]
    Cancelled,

    /// Cancellation was requested, but closing the source failed.
    #[error("Cancelled, but the source failed to close: {0}")]
    CancelFailed(#[source] E),
}

impl<E: std::error::Error + 'static> StreamError<E> {
    /// Whether the operation ended because cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::CancelFailed(_))
    }
}
