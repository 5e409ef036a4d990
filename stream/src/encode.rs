use super::*;
use quarry_cbor::{EncoderOptions, Value, Writer, encode};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encodes `value` and writes it to `sink` chunk by chunk, returning the
/// number of bytes written.
pub async fn write_value<W>(
    sink: &mut W,
    value: &Value,
    options: &EncoderOptions,
) -> Result<usize, StreamError<std::io::Error>>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut writer = Writer::from_config(options.config());
    encode::write(&mut writer, value, options)?;

    let mut total = 0;
    for chunk in writer.output_chunks()? {
        sink.write_all(&chunk).await.map_err(StreamError::Source)?;
        total += chunk.len();
    }
    sink.flush().await.map_err(StreamError::Source)?;
    trace!("Wrote {total} bytes");
    Ok(total)
}
