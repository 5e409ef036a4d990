#![no_main]

use libfuzzer_sys::fuzz_target;
use quarry_cbor::{DecoderOptions, decode};

// The first byte picks a chunk size; the result must not depend on it
fuzz_target!(|data: &[u8]| {
    let Some((&size, data)) = data.split_first() else {
        return;
    };
    let options = DecoderOptions::default();
    let whole = decode::decode(data, &options);

    let mut decoder = decode::Decoder::new(options);
    let chunked = data
        .chunks((size as usize).max(1))
        .try_for_each(|c| decoder.process(c))
        .and_then(|_| decoder.end());

    match (whole, chunked) {
        (Ok(a), Ok(b)) => assert_eq!(format!("{a:?}"), format!("{b:?}")),
        (Err(a), Err(b)) => assert_eq!(a.kind(), b.kind()),
        (a, b) => panic!("whole {a:?} but chunked {b:?}"),
    }
});
