/*!
Resumable RFC 8949 CBOR codec used by the Quarry RPC client.

The crate converts between an owned [`Value`] tree and CBOR bytes. Both
directions run as iterative loops over an explicit frame stack, so arbitrarily
nested input never grows the native call stack, and the [`Decoder`] can be
suspended between network reads, even in the middle of a header or a string
payload.

```
use quarry_cbor::{decode, encode, DecoderOptions, EncoderOptions, Value};

let value = Value::Array(vec![Value::Integer(1), Value::from("two")]);
let bytes = encode::encode(&value, &EncoderOptions::default()).unwrap();

let mut decoder = decode::Decoder::new(DecoderOptions::default());
for chunk in bytes.chunks(3) {
    decoder.process(chunk).unwrap();
}
assert_eq!(decoder.output().unwrap(), value);
```
*/

use tracing::*;

pub mod config;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod pool;
pub mod value;
pub mod writer;

mod decode_frame;
mod revive;

pub use indexmap::IndexMap;
pub use config::{Config, DecoderOptions, EncoderOptions, MapType};
pub use error::{Error, ErrorKind};
pub use pool::EncodePool;
pub use revive::format_date;
pub use value::{Chained, Extension, Simple, Tagged, TaggedForm, Value};
pub use writer::Writer;


#[cfg(test)]
mod encode_tests;
