#![no_main]

use libfuzzer_sys::fuzz_target;
use quarry_cbor::{DecoderOptions, decode};

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = decode::decode(data, &DecoderOptions::default()) {
        _ = format!("{value:?}");
    }
});
