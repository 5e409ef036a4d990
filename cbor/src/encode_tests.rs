use super::encode::*;
use super::*;
use hex_literal::hex;
use indexmap::IndexMap;
use std::any::Any;
use std::sync::{Arc, Mutex};

fn emit(value: &Value) -> Vec<u8> {
    emit_with(value, &EncoderOptions::default())
}

/// Encodes with the given options, checking the result does not depend on
/// the writer's chunk size.
fn emit_with(value: &Value, options: &EncoderOptions) -> Vec<u8> {
    let data = encode(value, options).unwrap();
    for chunk_size in [1, 2, 3, 5, 16] {
        let options = options.clone().with_chunk_size(chunk_size);
        assert_eq!(
            encode(value, &options).unwrap(),
            data,
            "chunk size {chunk_size}"
        );
    }
    data
}

fn emit_err(value: &Value, options: &EncoderOptions) -> Error {
    encode(value, options).unwrap_err()
}

fn obj<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<IndexMap<_, _>>(),
    )
}

fn arr<const N: usize>(items: [Value; N]) -> Value {
    Value::Array(items.into())
}

fn int(n: i64) -> Value {
    Value::Integer(n)
}

#[test]
fn rfc_tests() {
    // RFC 8949, Appendix A:
    // https://www.rfc-editor.org/rfc/rfc8949.html#section-appendix.a

    assert_eq!(emit(&int(0)), hex!("00"));
    assert_eq!(emit(&int(1)), hex!("01"));
    assert_eq!(emit(&int(10)), hex!("0a"));
    assert_eq!(emit(&int(23)), hex!("17"));
    assert_eq!(emit(&int(24)), hex!("1818"));
    assert_eq!(emit(&int(25)), hex!("1819"));
    assert_eq!(emit(&int(100)), hex!("1864"));
    assert_eq!(emit(&int(1000)), hex!("1903e8"));
    assert_eq!(emit(&int(1000000)), hex!("1a000f4240"));
    assert_eq!(emit(&int(1000000000000)), hex!("1b000000e8d4a51000"));
    assert_eq!(
        emit(&Value::BigInt(18446744073709551615)),
        hex!("1bffffffffffffffff")
    );
    assert_eq!(
        emit(&Value::BigInt(-18446744073709551616)),
        hex!("3bffffffffffffffff")
    );
    assert_eq!(emit(&int(-1)), hex!("20"));
    assert_eq!(emit(&int(-10)), hex!("29"));
    assert_eq!(emit(&int(-100)), hex!("3863"));
    assert_eq!(emit(&int(-1000)), hex!("3903e7"));

    // Zero, infinities and NaN take the half-precision form, other floats
    // are always written as doubles
    assert_eq!(emit(&Value::Float(0.0)), hex!("f90000"));
    assert_eq!(emit(&Value::Float(-0.0)), hex!("f98000"));
    assert_eq!(emit(&Value::Float(f64::INFINITY)), hex!("f97c00"));
    assert_eq!(emit(&Value::Float(f64::NAN)), hex!("f97e00"));
    assert_eq!(emit(&Value::Float(f64::NEG_INFINITY)), hex!("f9fc00"));
    assert_eq!(emit(&Value::Float(1.0)), hex!("fb3ff0000000000000"));
    assert_eq!(emit(&Value::Float(1.1)), hex!("fb3ff199999999999a"));
    assert_eq!(emit(&Value::Float(1.0e+300)), hex!("fb7e37e43c8800759c"));
    assert_eq!(emit(&Value::Float(-4.1)), hex!("fbc010666666666666"));

    assert_eq!(emit(&Value::Bool(false)), hex!("f4"));
    assert_eq!(emit(&Value::Bool(true)), hex!("f5"));
    assert_eq!(emit(&Value::Null), hex!("f6"));
    assert_eq!(emit(&Value::Simple(Simple::new(16).unwrap())), hex!("f0"));
    assert_eq!(emit(&Value::Simple(Simple::new(255).unwrap())), hex!("f8ff"));
    assert_eq!(
        emit(&Value::tagged(1, int(1363896240))),
        hex!("c11a514b67b0")
    );
    assert_eq!(
        emit(&Value::tagged(1, Value::Float(1363896240.5))),
        hex!("c1fb41d452d9ec200000")
    );
    assert_eq!(
        emit(&Value::tagged(23, Value::Bytes(hex!("01020304").to_vec()))),
        hex!("d74401020304")
    );
    assert_eq!(
        emit(&Value::tagged(24, Value::Bytes(hex!("6449455446").to_vec()))),
        hex!("d818456449455446")
    );
    assert_eq!(
        emit(&Value::tagged(32, Value::from("http://www.example.com"))),
        hex!("d82076687474703a2f2f7777772e6578616d706c652e636f6d")
    );
    assert_eq!(emit(&Value::Bytes(Vec::new())), hex!("40"));
    assert_eq!(emit(&Value::Bytes(hex!("01020304").to_vec())), hex!("4401020304"));
    assert_eq!(emit(&Value::from("")), hex!("60"));
    assert_eq!(emit(&Value::from("a")), hex!("6161"));
    assert_eq!(emit(&Value::from("IETF")), hex!("6449455446"));
    assert_eq!(emit(&Value::from("\"\\")), hex!("62225c"));
    assert_eq!(emit(&Value::from("\u{00fc}")), hex!("62c3bc"));
    assert_eq!(emit(&Value::from("\u{6c34}")), hex!("63e6b0b4"));
    assert_eq!(emit(&Value::from("\u{10151}")), hex!("64f0908591"));
    assert_eq!(emit(&arr([])), hex!("80"));
    assert_eq!(emit(&arr([int(1), int(2), int(3)])), hex!("83010203"));
    assert_eq!(
        emit(&arr([int(1), arr([int(2), int(3)]), arr([int(4), int(5)])])),
        hex!("8301820203820405")
    );
    assert_eq!(
        emit(&Value::Array((1..=25).map(int).collect())),
        hex!("98190102030405060708090a0b0c0d0e0f101112131415161718181819")
    );
    assert_eq!(emit(&obj([])), hex!("a0"));
    assert_eq!(
        emit(&Value::Map(vec![(int(1), int(2)), (int(3), int(4))])),
        hex!("a201020304")
    );
    assert_eq!(
        emit(&obj([("a", int(1)), ("b", arr([int(2), int(3)]))])),
        hex!("a26161016162820203")
    );
    assert_eq!(
        emit(&arr([Value::from("a"), obj([("b", Value::from("c"))])])),
        hex!("826161a161626163")
    );
    assert_eq!(
        emit(&obj([
            ("a", Value::from("A")),
            ("b", Value::from("B")),
            ("c", Value::from("C")),
            ("d", Value::from("D")),
            ("e", Value::from("E")),
        ])),
        hex!("a56161614161626142616361436164614461656145")
    );
}

#[test]
fn integers() {
    // Beyond the exactly representable range plain integers become doubles
    assert_eq!(emit(&int(1 << 53)), hex!("fb4340000000000000"));
    assert_eq!(emit(&int(-(1 << 53))), hex!("fbc340000000000000"));
    assert_eq!(emit(&int((1 << 53) - 1)), hex!("1b001fffffffffffff"));
    assert_eq!(emit(&int(-(1 << 53) + 1)), hex!("3b001ffffffffffffe"));
    assert_eq!(emit(&int(i64::MAX)), hex!("fb43e0000000000000"));
    assert_eq!(emit(&int(i64::MIN)), hex!("fbc3e0000000000000"));

    // Big integers stay exact
    assert_eq!(emit(&Value::BigInt(1 << 53)), hex!("1b0020000000000000"));
    assert_eq!(emit(&Value::BigInt(-1)), hex!("20"));

    let e = emit_err(&Value::BigInt(1 << 64), &EncoderOptions::default());
    assert!(matches!(e, Error::IntegerOutOfRange(_)));
    assert_eq!(e.kind(), ErrorKind::ResourceLimit);
    assert!(matches!(
        emit_err(&Value::BigInt(-(1 << 64) - 1), &EncoderOptions::default()),
        Error::IntegerOutOfRange(_)
    ));
}

#[test]
fn undefined() {
    assert_eq!(emit(&Value::Undefined), hex!("c6f6"));
    assert_eq!(
        emit_with(
            &Value::Undefined,
            &EncoderOptions::default().with_undefined_as_none_tag(false)
        ),
        hex!("f7")
    );
}

#[test]
fn dates() {
    assert_eq!(
        emit(&Value::Date(time::OffsetDateTime::UNIX_EPOCH)),
        hex!("c07818313937302d30312d30315430303a30303a30302e3030305a")
    );
    // Normalised to UTC with millisecond precision
    assert_eq!(
        emit(&Value::Date(time::macros::datetime!(2013-03-21 20:04:00.25 +2))),
        hex!("c07818323031332d30332d32315431383a30343a30302e3235305a")
    );

    let date = time::macros::datetime!(2024-02-29 12:30:45.125 UTC);
    assert_eq!(
        decode::decode(&emit(&Value::Date(date)), &DecoderOptions::default()).unwrap(),
        Value::Date(date)
    );
}

#[test]
fn known_strings() {
    assert_eq!(
        emit(&obj([("id", int(1)), ("method", Value::from("ping"))])),
        hex!("a2 626964 01 666d6574686f64 6470696e67")
    );
}

#[test]
fn unsafe_keys() {
    let options = EncoderOptions::default();
    let e = emit_err(&obj([("__proto__", int(1))]), &options);
    assert!(matches!(&e, Error::UnsafeKey(k) if k == "__proto__"));
    assert_eq!(e.kind(), ErrorKind::Safety);

    assert!(matches!(
        emit_err(&arr([obj([("constructor", int(1))])]), &options),
        Error::UnsafeKey(_)
    ));
    assert!(matches!(
        emit_err(
            &Value::Map(vec![(Value::from("__proto__"), int(1))]),
            &options
        ),
        Error::UnsafeKey(_)
    ));

    let permissive = EncoderOptions::default()
        .with_object_key_check(|_| true)
        .with_map_key_check(|k| !matches!(k, Value::Null));
    assert_eq!(
        emit_with(&obj([("__proto__", int(1))]), &permissive),
        hex!("a1695f5f70726f746f5f5f01")
    );
    assert!(matches!(
        emit_err(&Value::Map(vec![(Value::Null, int(1))]), &permissive),
        Error::UnsafeKey(_)
    ));
}

#[test]
fn depth_limits() {
    let options = EncoderOptions::default().with_max_depth(2);
    assert_eq!(emit_with(&arr([arr([int(1)])]), &options), hex!("818101"));
    assert_eq!(emit_with(&arr([arr([])]), &options), hex!("8180"));

    for value in [
        arr([arr([arr([int(1)])])]),
        arr([arr([arr([])])]),
        arr([arr([obj([])])]),
        Value::tagged(1, arr([arr([int(1)])])),
        Value::Map(vec![(arr([arr([])]), int(1))]),
    ] {
        let e = emit_err(&value, &options);
        assert!(matches!(e, Error::MaxDepth(2)), "{value:?}: {e}");
        assert_eq!(e.kind(), ErrorKind::ResourceLimit);
    }
}

#[test]
fn depth_limits_round_trip() {
    let encode_options = EncoderOptions::default().with_max_depth(2);
    let decode_options = DecoderOptions::default().with_max_depth(2);

    // Tags count as a level in both directions, including the NONE tag
    for value in [
        arr([Value::Undefined]),
        arr([Value::tagged(1, int(1))]),
        arr([Value::Date(time::OffsetDateTime::UNIX_EPOCH)]),
        arr([arr([Value::Null])]),
    ] {
        let data = emit_with(&value, &encode_options);
        assert_eq!(decode::decode(&data, &decode_options).unwrap(), value);
    }

    let deeper = arr([arr([Value::Undefined])]);
    assert!(matches!(emit_err(&deeper, &encode_options), Error::MaxDepth(2)));
    assert!(matches!(
        decode::decode(&hex!("8181c6f6"), &decode_options),
        Err(Error::MaxDepth(2))
    ));

    // Without the NONE tag, undefined is a plain simple value
    let plain = encode_options.clone().with_undefined_as_none_tag(false);
    assert_eq!(emit_with(&deeper, &plain), hex!("8181f7"));
    assert_eq!(decode::decode(&hex!("8181f7"), &decode_options).unwrap(), deeper);
}

#[test]
fn object_order() {
    let value = obj([
        ("method", Value::from("query")),
        ("id", int(7)),
        ("10", Value::Null),
        ("2", Value::Null),
    ]);
    let data = emit(&value);
    assert_eq!(
        data,
        hex!("a4 666d6574686f64 657175657279 626964 07 623130 f6 6132 f6")
    );

    let Value::Object(entries) = decode::decode(&data, &DecoderOptions::default()).unwrap() else {
        panic!("expected an object");
    };
    assert_eq!(
        entries.keys().map(String::as_str).collect::<Vec<_>>(),
        ["method", "id", "10", "2"]
    );
}

#[test]
fn deep_nesting() {
    const DEPTH: usize = 2000;
    let mut value = int(0);
    for _ in 0..DEPTH {
        value = Value::Array(vec![value]);
    }
    let data = encode(&value, &EncoderOptions::default().with_max_depth(DEPTH)).unwrap();
    assert_eq!(data.len(), DEPTH + 1);
    assert!(data[..DEPTH].iter().all(|b| *b == 0x81));
}

#[test]
fn poisoned_writer() {
    let options = EncoderOptions::default();
    let mut writer = Writer::default();
    write(&mut writer, &int(1), &options).unwrap();
    write(&mut writer, &Value::from("a"), &options).unwrap();
    assert_eq!(writer.output().unwrap(), hex!("01 6161"));

    assert!(write(&mut writer, &obj([("__proto__", int(1))]), &options).is_err());
    assert!(writer.is_poisoned());
    assert!(matches!(
        write(&mut writer, &int(1), &options),
        Err(Error::Poisoned)
    ));
    assert!(matches!(writer.consume(), Err(Error::Poisoned)));

    writer.clear();
    write(&mut writer, &int(2), &options).unwrap();
    assert_eq!(writer.consume().unwrap(), hex!("02"));
}

#[derive(Debug)]
struct RecordId(&'static str, i64);

impl Extension for RecordId {
    fn to_tagged(&self) -> Option<TaggedForm> {
        Some(TaggedForm {
            tag: Some(8),
            value: arr([Value::from(self.0), int(self.1)]),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Has no tagged form of its own.
#[derive(Debug)]
struct Duration(u64);

impl Extension for Duration {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Written as its children, untagged.
#[derive(Debug, Default)]
struct Graph {
    children: Mutex<Vec<Value>>,
}

impl Extension for Graph {
    fn to_tagged(&self) -> Option<TaggedForm> {
        let children = self.children.lock().ok()?;
        Some(TaggedForm {
            tag: None,
            value: Value::Array(children.clone()),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn extensions() {
    let id: Arc<dyn Extension> = Arc::new(RecordId("person", 1));
    assert_eq!(
        emit(&Value::Extension(id.clone())),
        hex!("c8 82 66706572736f6e 01")
    );

    // The same extension may appear more than once, it is not a cycle
    assert_eq!(
        emit(&arr([Value::Extension(id.clone()), Value::Extension(id)])),
        hex!("82 c88266706572736f6e01 c88266706572736f6e01")
    );

    let graph = Arc::new(Graph::default());
    graph.children.lock().unwrap().push(int(1));
    assert_eq!(emit(&Value::Extension(graph)), hex!("8101"));

    let e = emit_err(
        &Value::Extension(Arc::new(Duration(5))),
        &EncoderOptions::default(),
    );
    assert!(matches!(e, Error::Unencodable("extension")));
    assert_eq!(e.kind(), ErrorKind::Type);
}

#[test]
fn circular_reference() {
    let graph = Arc::new(Graph::default());
    let ext: Arc<dyn Extension> = graph.clone();
    graph
        .children
        .lock()
        .unwrap()
        .push(arr([Value::Extension(ext.clone())]));

    let value = arr([Value::Extension(ext.clone()), Value::Extension(ext)]);
    let e = emit_err(&value, &EncoderOptions::default());
    assert!(matches!(e, Error::CircularReference));
    assert_eq!(e.kind(), ErrorKind::Safety);

    // Break the cycle so the test does not leak
    graph.children.lock().unwrap().clear();
    assert_eq!(emit(&value), hex!("82 80 80"));
}

#[test]
fn replacers() {
    let options = EncoderOptions::default()
        .with_replacer(|v| {
            Ok(match v {
                Value::Extension(e) if e.as_any().is::<Duration>() => {
                    Chained::Produced(Value::tagged(14, Value::from("5s")))
                }
                _ => Chained::Pass,
            })
        })
        .with_replacer(|v| {
            Ok(match v {
                // Caller replacers take precedence over the built-in ones
                Value::Date(_) => Chained::Produced(Value::Null),
                Value::Extension(_) => Chained::Produced(int(0)),
                _ => Chained::Pass,
            })
        });

    assert_eq!(
        emit_with(&Value::Extension(Arc::new(Duration(5))), &options),
        hex!("ce 62 3573")
    );
    assert_eq!(
        emit_with(&Value::Date(time::OffsetDateTime::UNIX_EPOCH), &options),
        hex!("f6")
    );

    // Replacers are not consulted for natively encodable values
    assert_eq!(emit_with(&arr([int(1), Value::Null]), &options), hex!("8201f6"));

    // A replacement may itself need replacing
    let chained = EncoderOptions::default().with_replacer(|v| {
        Ok(match v {
            Value::Extension(_) => Chained::Produced(Value::Date(time::OffsetDateTime::UNIX_EPOCH)),
            _ => Chained::Pass,
        })
    });
    assert_eq!(
        emit_with(&Value::Extension(Arc::new(Duration(0))), &chained),
        hex!("c07818313937302d30312d30315430303a30303a30302e3030305a")
    );

    // An extension replaced by itself never terminates
    let looping = EncoderOptions::default().with_replacer(|v| Ok(Chained::Produced(v.clone())));
    assert!(matches!(
        emit_err(&Value::Extension(Arc::new(Duration(0))), &looping),
        Error::CircularReference
    ));

    let failing =
        EncoderOptions::default().with_replacer(|_| Err(Error::Custom("refused".to_string())));
    assert!(matches!(
        emit_err(&Value::Date(time::OffsetDateTime::UNIX_EPOCH), &failing),
        Error::Custom(_)
    ));
}

#[test]
fn round_trip() {
    let value = obj([
        ("none", Value::Undefined),
        ("null", Value::Null),
        ("flag", Value::Bool(true)),
        ("int", int(-42)),
        ("big", Value::BigInt(u64::MAX as i128)),
        ("float", Value::Float(1.5)),
        ("bytes", Value::Bytes(hex!("deadbeef").to_vec())),
        ("text", Value::from("\u{6c34} water")),
        ("list", arr([int(1), arr([]), obj([("nested", Value::from("yes"))])])),
        ("tagged", Value::tagged(99, arr([Value::Null]))),
        ("simple", Value::Simple(Simple::new(7).unwrap())),
        (
            "date",
            Value::Date(time::macros::datetime!(2023-11-05 08:15:30.5 UTC)),
        ),
    ]);
    let data = emit(&value);

    for split in 0..=data.len() {
        let mut decoder = decode::Decoder::new(DecoderOptions::default());
        decoder.process(&data[..split]).unwrap();
        decoder.process(&data[split..]).unwrap();
        assert_eq!(decoder.end().unwrap(), value, "split at {split}");
    }
}
