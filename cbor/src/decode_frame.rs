use super::*;
use indexmap::IndexMap;

/// Upper bound on speculative preallocation from a declared length, so a
/// hostile header cannot reserve memory the data never fills.
pub(crate) const MAX_PREALLOC: usize = 64 * 1024;

pub(crate) fn prealloc(declared: u64) -> usize {
    usize::try_from(declared).unwrap_or(usize::MAX).min(MAX_PREALLOC)
}

/// An open container on the decoder's stack. `remaining` is `None` for
/// indefinite-length items, which complete on a break stop code.
#[derive(Debug)]
pub(crate) enum Frame {
    Array {
        items: Vec<Value>,
        remaining: Option<u64>,
    },
    Object {
        entries: IndexMap<String, Value>,
        key: Option<String>,
        remaining: Option<u64>,
    },
    Map {
        pairs: Vec<(Value, Value)>,
        key: Option<Value>,
        remaining: Option<u64>,
    },
    Tag {
        tag: u64,
        value: Option<Value>,
    },
    /// Indefinite-length text, each chunk validated as it arrives.
    Text(String),
    /// Indefinite-length byte string.
    Bytes(Vec<u8>),
}

impl Frame {
    pub(crate) fn array(len: Option<u64>) -> Self {
        Self::Array {
            items: Vec::with_capacity(len.map_or(0, prealloc)),
            remaining: len,
        }
    }

    pub(crate) fn map(len: Option<u64>, map_type: MapType) -> Self {
        match map_type {
            MapType::Object => Self::Object {
                entries: IndexMap::with_capacity(len.map_or(0, prealloc)),
                key: None,
                remaining: len,
            },
            MapType::Map => Self::Map {
                pairs: Vec::with_capacity(len.map_or(0, prealloc)),
                key: None,
                remaining: len,
            },
        }
    }

    /// String frames hold chunks of a single item, not nested data.
    pub(crate) fn is_counted(&self) -> bool {
        !matches!(self, Self::Text(_) | Self::Bytes(_))
    }

    /// The major type a chunk must have to be accepted by a string frame.
    pub(crate) fn chunk_major(&self) -> Option<u8> {
        match self {
            Self::Text(_) => Some(constants::MAJOR_TEXT),
            Self::Bytes(_) => Some(constants::MAJOR_BYTES),
            _ => None,
        }
    }

    /// Adds a completed child. Returns `true` once the frame is complete.
    pub(crate) fn put(&mut self, value: Value, options: &DecoderOptions) -> Result<bool, Error> {
        match self {
            Self::Array { items, remaining } => {
                items.push(value);
                Ok(count_down(remaining))
            }
            Self::Object {
                entries,
                key,
                remaining,
            } => match key.take() {
                None => {
                    let k = match value {
                        Value::Text(s) => s,
                        Value::Integer(n) => n.to_string(),
                        Value::BigInt(n) => n.to_string(),
                        v => return Err(Error::InvalidKey(v.type_name())),
                    };
                    if !(options.object_key_check)(&k) {
                        return Err(Error::UnsafeKey(k));
                    }
                    *key = Some(k);
                    Ok(false)
                }
                Some(k) => {
                    entries.insert(k, value);
                    Ok(count_down(remaining))
                }
            },
            Self::Map {
                pairs,
                key,
                remaining,
            } => match key.take() {
                None => {
                    if !(options.map_key_check)(&value) {
                        return Err(Error::UnsafeKey(format!("{value:?}")));
                    }
                    *key = Some(value);
                    Ok(false)
                }
                Some(k) => {
                    pairs.push((k, value));
                    Ok(count_down(remaining))
                }
            },
            Self::Tag { value: slot, .. } => {
                *slot = Some(value);
                Ok(true)
            }
            Self::Text(_) | Self::Bytes(_) => Err(Error::InvalidChunk(value_major(&value))),
        }
    }

    /// Completes an indefinite-length frame on a break stop code.
    pub(crate) fn accept_break(&self) -> Result<(), Error> {
        match self {
            Self::Array {
                remaining: None, ..
            }
            | Self::Text(_)
            | Self::Bytes(_) => Ok(()),
            Self::Object {
                remaining: None,
                key,
                ..
            } => key.as_ref().map_or(Ok(()), |_| Err(Error::PartialMap)),
            Self::Map {
                remaining: None,
                key,
                ..
            } => key.as_ref().map_or(Ok(()), |_| Err(Error::PartialMap)),
            _ => Err(Error::UnexpectedBreak),
        }
    }

    /// Converts a completed frame into its value.
    pub(crate) fn finish(self, options: &DecoderOptions) -> Result<Value, Error> {
        match self {
            Self::Array { items, .. } => Ok(Value::Array(items)),
            Self::Object { entries, .. } => Ok(Value::Object(entries)),
            Self::Map { pairs, .. } => Ok(Value::Map(pairs)),
            Self::Tag { tag, value } => options.revive_tagged(Tagged {
                tag,
                value: value.ok_or(Error::NotEnoughData)?,
            }),
            Self::Text(s) => Ok(Value::Text(s)),
            Self::Bytes(b) => Ok(Value::Bytes(b)),
        }
    }
}

/// Counts one child off a definite-length frame.
fn count_down(remaining: &mut Option<u64>) -> bool {
    match remaining {
        Some(n) => {
            *n = n.saturating_sub(1);
            *n == 0
        }
        None => false,
    }
}

fn value_major(value: &Value) -> u8 {
    match value {
        Value::Integer(n) if *n < 0 => constants::MAJOR_NEGATIVE,
        Value::BigInt(n) if *n < 0 => constants::MAJOR_NEGATIVE,
        Value::Integer(_) | Value::BigInt(_) => constants::MAJOR_UNSIGNED,
        Value::Bytes(_) => constants::MAJOR_BYTES,
        Value::Text(_) => constants::MAJOR_TEXT,
        Value::Array(_) => constants::MAJOR_ARRAY,
        Value::Object(_) | Value::Map(_) => constants::MAJOR_MAP,
        Value::Tagged(_) | Value::Date(_) => constants::MAJOR_TAG,
        _ => constants::MAJOR_SIMPLE,
    }
}
