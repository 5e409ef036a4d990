use super::*;
use bytes::Bytes;
use futures::Stream;
use quarry_cbor::{DecoderOptions, Value, decode::Decoder};

/// Decodes one item from `source`, feeding each chunk to a resumable decoder
/// as it arrives.
///
/// Cancellation is checked before each read and raced against the read in
/// flight. When it fires, the pending read future is dropped rather than
/// awaited alongside the close, since the source is borrowed exclusively; a
/// chunk that was already available is discarded. The source is then closed
/// and the result is [`StreamError::Cancelled`], or
/// [`StreamError::CancelFailed`] if closing the source failed.
pub async fn decode_source<S>(
    source: &mut S,
    options: &DecoderOptions,
    cancel: &CancellationToken,
) -> Result<Value, StreamError<S::Error>>
where
    S: ByteSource + ?Sized,
{
    let mut decoder = Decoder::new(options.clone());
    let mut total = 0usize;
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Decode cancelled after {total} bytes");
                return match source.cancel().await {
                    Ok(()) => Err(StreamError::Cancelled),
                    Err(e) => {
                        warn!("Failed to close source after cancellation: {e}");
                        Err(StreamError::CancelFailed(e))
                    }
                };
            }
            r = source.read() => r.map_err(StreamError::Source)?,
        };

        let Some(chunk) = chunk else {
            trace!("Source ended after {total} bytes");
            return Ok(decoder.end()?);
        };
        trace!("Read chunk of {} bytes", chunk.len());
        total += chunk.len();
        decoder.process(&chunk)?;
    }
}

/// Decodes one item from a stream of byte chunks.
pub async fn decode_stream<St, E>(
    stream: St,
    options: &DecoderOptions,
    cancel: &CancellationToken,
) -> Result<Value, StreamError<E>>
where
    St: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    decode_source(&mut StreamSource::new(stream), options, cancel).await
}
