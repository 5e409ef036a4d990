#![no_main]

use libfuzzer_sys::fuzz_target;
use quarry_cbor::{Chained, DecoderOptions, EncoderOptions, MapType, Value, decode, encode};

// Anything that decodes must re-encode, and decode again to the same value
fuzz_target!(|data: &[u8]| {
    // Dates are normalised on encode, so keep them as raw tags
    let decode_options = DecoderOptions::default()
        .with_map_type(MapType::Map)
        .with_tagged_reviver(|t| {
            Ok(match t.tag {
                0 => Chained::Produced(Value::Tagged(Box::new(t.clone()))),
                _ => Chained::Pass,
            })
        });
    let Ok(value) = decode::decode(data, &decode_options) else {
        return;
    };
    // A literal undefined decodes without a depth level, so keep it literal
    let encode_options = EncoderOptions::default().with_undefined_as_none_tag(false);
    let encoded = encode::encode(&value, &encode_options)
        .expect("Failed to re-encode a decoded value");

    let mut decoder = decode::Decoder::new(decode_options);
    for chunk in encoded.chunks(3) {
        decoder.process(chunk).expect("Failed to decode re-encoded data");
    }
    let again = decoder.end().expect("Re-encoded data is incomplete");
    assert_eq!(format!("{value:?}"), format!("{again:?}"));
});
