/*!
Asynchronous adapters for [`quarry_cbor`].

Decoding pulls chunks from a [`ByteSource`] into a resumable
[`Decoder`](quarry_cbor::decode::Decoder), racing each read against a
[`CancellationToken`]. Encoding writes the encoder's chunk list to any
[`AsyncWrite`](tokio::io::AsyncWrite) sink.

```no_run
use quarry_cbor::DecoderOptions;
use quarry_cbor_stream::{CancellationToken, ReaderSource, decode_source};

# async fn example(socket: impl tokio::io::AsyncRead + Unpin + Send) {
let cancel = CancellationToken::new();
let value = decode_source(
    &mut ReaderSource::new(socket),
    &DecoderOptions::default(),
    &cancel,
)
.await;
# }
```
*/

use tracing::*;

mod decode;
mod encode;
mod error;
mod source;

pub use async_trait::async_trait;
pub use decode::{decode_source, decode_stream};
pub use encode::write_value;
pub use error::StreamError;
pub use source::{ByteSource, ReaderSource, StreamSource};

/// A token for cooperative cancellation of a streaming decode.
pub type CancellationToken = tokio_util::sync::CancellationToken;
