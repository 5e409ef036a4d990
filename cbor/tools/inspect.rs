/*!
Inspect command - decode CBOR and display it in various formats
*/

use super::io::{Input, Output};
use base64::prelude::*;
use clap::Parser;
use quarry_cbor::{DecoderOptions, MapType, Value, decode::Decoder};
use std::fmt::Write;

/// Deepest nesting the recursive formatters will walk.
const MAX_INSPECT_DEPTH: usize = 1024;

/// Decode and display CBOR data
#[derive(Parser, Debug)]
#[command(about = "Decode and display CBOR data", long_about = None)]
pub struct Command {
    /// Output format
    #[arg(
        long,
        default_value = "diag",
        value_name = "FORMAT",
        help = "Output format: diag/diagnostic (human-readable), json (lossy), hex"
    )]
    format: OutputFormat,

    /// Feed the decoder this many bytes at a time
    #[arg(long, value_name = "BYTES")]
    chunk: Option<usize>,

    /// Decode maps as string-keyed objects or as ordered pairs
    #[arg(long, default_value = "map", value_name = "TYPE")]
    map: MapKind,

    /// Maximum nesting depth (at most 1024)
    #[arg(long, default_value_t = quarry_cbor::constants::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input CBOR file (use '-' for stdin)
    input: Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Diagnostic notation (human-readable)
    #[value(alias = "diagnostic")]
    Diag,
    /// JSON format (lossy - loses tags, byte strings become base64)
    Json,
    /// Hexadecimal dump of the input
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum MapKind {
    Object,
    Map,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let data = self.input.read_all()?;

        let output_text = match self.format {
            OutputFormat::Hex => hex::encode(&data),
            OutputFormat::Diag => diag(&self.decode(&data)?),
            OutputFormat::Json => serde_json::to_string_pretty(&to_json(&self.decode(&data)?))?,
        };

        self.output
            .unwrap_or(Output::Stdout)
            .write_str(&output_text)?;
        Ok(())
    }

    fn decode(&self, data: &[u8]) -> anyhow::Result<Value> {
        anyhow::ensure!(
            self.max_depth <= MAX_INSPECT_DEPTH,
            "--max-depth {} exceeds the limit of {MAX_INSPECT_DEPTH}",
            self.max_depth
        );
        let options = DecoderOptions::default()
            .with_max_depth(self.max_depth)
            .with_map_type(match self.map {
                MapKind::Object => MapType::Object,
                MapKind::Map => MapType::Map,
            });

        let mut decoder = Decoder::new(options);
        let chunk = self.chunk.unwrap_or(data.len()).max(1);
        for (i, c) in data.chunks(chunk).enumerate() {
            decoder
                .process(c)
                .map_err(|e| anyhow::anyhow!("Failed in chunk {i} (offset {}): {e}", i * chunk))?;
        }
        Ok(decoder.end()?)
    }
}

/// Formats a value in CBOR diagnostic notation.
fn diag(value: &Value) -> String {
    let mut s = String::new();
    write_diag(&mut s, value);
    s
}

fn write_diag(s: &mut String, value: &Value) {
    match value {
        Value::Undefined => s.push_str("undefined"),
        Value::Null => s.push_str("null"),
        Value::Bool(b) => _ = write!(s, "{b}"),
        Value::Integer(n) => _ = write!(s, "{n}"),
        Value::BigInt(n) => _ = write!(s, "{n}"),
        Value::Float(f) if f.is_nan() => s.push_str("NaN"),
        Value::Float(f) if f.is_infinite() => {
            s.push_str(if *f > 0.0 { "Infinity" } else { "-Infinity" })
        }
        Value::Float(f) => _ = write!(s, "{f:?}"),
        Value::Bytes(b) => _ = write!(s, "h'{}'", hex::encode(b)),
        Value::Text(t) => s.push_str(&json_string(t)),
        Value::Array(items) => {
            s.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                write_diag(s, item);
            }
            s.push(']');
        }
        Value::Object(entries) => {
            s.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                s.push_str(&json_string(k));
                s.push_str(": ");
                write_diag(s, v);
            }
            s.push('}');
        }
        Value::Map(pairs) => {
            s.push('{');
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                write_diag(s, k);
                s.push_str(": ");
                write_diag(s, v);
            }
            s.push('}');
        }
        Value::Tagged(t) => {
            _ = write!(s, "{}(", t.tag);
            write_diag(s, &t.value);
            s.push(')');
        }
        Value::Simple(v) => _ = write!(s, "{v}"),
        Value::Date(d) => match quarry_cbor::format_date(d) {
            Ok(d) => _ = write!(s, "0({})", json_string(&d)),
            Err(_) => _ = write!(s, "0({d})"),
        },
        Value::Extension(e) => _ = write!(s, "{e:?}"),
    }
}

fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Lossy conversion to JSON.
fn to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as J;

    match value {
        Value::Undefined | Value::Null | Value::Simple(_) | Value::Extension(_) => J::Null,
        Value::Bool(b) => J::Bool(*b),
        Value::Integer(n) => J::from(*n),
        Value::BigInt(n) => match (i64::try_from(*n), u64::try_from(*n)) {
            (Ok(n), _) => J::from(n),
            (_, Ok(n)) => J::from(n),
            _ => J::String(n.to_string()),
        },
        // NaN and infinities become null
        Value::Float(f) => J::from(*f),
        Value::Bytes(b) => J::String(BASE64_URL_SAFE_NO_PAD.encode(b)),
        Value::Text(t) => J::String(t.clone()),
        Value::Array(items) => J::Array(items.iter().map(to_json).collect()),
        Value::Object(entries) => J::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        Value::Map(pairs) => J::Object(
            pairs
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::Text(t) => t.clone(),
                        k => diag(k),
                    };
                    (key, to_json(v))
                })
                .collect(),
        ),
        Value::Tagged(t) => to_json(&t.value),
        Value::Date(d) => quarry_cbor::format_date(d).map_or(J::Null, J::String),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> Command {
        let mut argv = vec!["inspect"];
        argv.extend_from_slice(args);
        argv.push("-");
        Command::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_diag_nested() {
        // {"a": 1, "b": [2, 3]}
        let data = [0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x82, 0x02, 0x03];
        let value = command(&["--chunk", "1"]).decode(&data).unwrap();
        assert_eq!(diag(&value), r#"{"a": 1, "b": [2, 3]}"#);
    }

    #[test]
    fn test_json_bytes() {
        let data = [0x44, 0xde, 0xad, 0xbe, 0xef];
        let value = command(&[]).decode(&data).unwrap();
        assert_eq!(to_json(&value), serde_json::json!("3q2-7w"));
    }

    #[test]
    fn test_max_depth_limit() {
        let data = [0x81; 2000];
        assert!(command(&["--max-depth", "100000"]).decode(&data).is_err());

        let mut data = vec![0x81; MAX_INSPECT_DEPTH];
        data.push(0x01);
        let value = command(&["--max-depth", "1024"]).decode(&data).unwrap();
        assert!(diag(&value).starts_with("[[["));
    }
}
