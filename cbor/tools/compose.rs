/*!
Compose command - convert JSON to CBOR
*/

use crate::io::{Input, Output};
use clap::Parser;
use quarry_cbor::{EncodePool, EncoderOptions, Value};

/// Convert JSON to CBOR binary
#[derive(Parser, Debug)]
#[command(
    about = "Convert JSON to CBOR binary",
    long_about = "Parse JSON and convert it to CBOR binary.\n\n\
                  Objects become CBOR maps with text keys, integers outside the \
                  exactly representable range are kept exact."
)]
pub struct Command {
    /// Encode null as tag 6 wrapping null (NONE) rather than plain null
    #[arg(long)]
    null_as_none: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input file (use '-' for stdin)
    input: Input,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let input_text = self.input.read_to_string()?;
        let json: serde_json::Value = serde_json::from_str(&input_text)?;
        let value = json_to_value(json, self.null_as_none)?;

        let mut pool = EncodePool::new(EncoderOptions::default());
        let chunks = pool.encode_chunks(&value)?;

        self.output.unwrap_or(Output::Stdout).write_chunks(&chunks)?;
        Ok(())
    }
}

fn json_to_value(value: serde_json::Value, null_as_none: bool) -> anyhow::Result<Value> {
    use serde_json::Value as J;

    Ok(match value {
        J::Null if null_as_none => Value::Undefined,
        J::Null => Value::Null,
        J::Bool(b) => Value::Bool(b),
        J::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i.unsigned_abs() <= quarry_cbor::constants::MAX_SAFE_INTEGER as u64 {
                    Value::Integer(i)
                } else {
                    Value::BigInt(i as i128)
                }
            } else if let Some(u) = n.as_u64() {
                Value::BigInt(u as i128)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                anyhow::bail!("Invalid JSON number: {n}")
            }
        }
        J::String(s) => Value::Text(s),
        J::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| json_to_value(v, null_as_none))
                .collect::<Result<_, _>>()?,
        ),
        J::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| Ok((k, json_to_value(v, null_as_none)?)))
                .collect::<anyhow::Result<_>>()?,
        ),
    })
}
