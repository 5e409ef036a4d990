/*!
The host-side value tree produced by the decoder and consumed by the encoder.
*/

use super::*;
use std::any::Any;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// An owned CBOR value.
///
/// Maps take one of two shapes, chosen by [`MapType`](crate::MapType) when
/// decoding: [`Value::Object`] for string-keyed objects and [`Value::Map`]
/// for insertion-ordered pairs with arbitrary keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    /// A plain number holding an integer. Magnitudes above 2^53-1 are
    /// encoded as floats.
    Integer(i64),
    /// A big integer, encoded as a CBOR integer anywhere in [-2^64, 2^64-1].
    BigInt(i128),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    /// Entries keep the order they were inserted or decoded in.
    Object(IndexMap<String, Value>),
    Map(Vec<(Value, Value)>),
    Tagged(Box<Tagged>),
    Simple(Simple),
    Date(time::OffsetDateTime),
    Extension(Arc<dyn Extension>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::BigInt(_) => "bigint",
            Self::Float(_) => "float",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Map(_) => "map",
            Self::Tagged(_) => "tagged",
            Self::Simple(_) => "simple",
            Self::Date(_) => "date",
            Self::Extension(_) => "extension",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::BigInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// Builds a tagged value.
    pub fn tagged(tag: u64, value: Value) -> Self {
        Self::Tagged(Box::new(Tagged { tag, value }))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(n) if n <= constants::MAX_SAFE_INTEGER => Self::Integer(n),
            _ => Self::BigInt(value as i128),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<Simple> for Value {
    fn from(value: Simple) -> Self {
        Self::Simple(value)
    }
}

impl From<time::OffsetDateTime> for Value {
    fn from(value: time::OffsetDateTime) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A tag number paired with its inner value, kept as-is when no reviver
/// recognises it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged {
    pub tag: u64,
    pub value: Value,
}

/// A CBOR simple value other than the four literals false/true/null/undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Simple(u8);

impl Simple {
    /// Accepts 0..=19 and 32..=255.
    pub fn new(value: u8) -> Result<Self, Error> {
        match value {
            20..=31 => Err(Error::InvalidSimple(value)),
            _ => Ok(Self(value)),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Simple {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Simple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simple({})", self.0)
    }
}

/// The self-describing form of an [`Extension`]: an optional tag wrapping an
/// inner value. Without a tag the inner value is written in its place.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedForm {
    pub tag: Option<u64>,
    pub value: Value,
}

/// A host value the codec does not model natively, such as a record id or a
/// duration.
///
/// The encoder first asks [`to_tagged`](Extension::to_tagged) for a
/// self-describing form; when that returns `None` the value is offered to the
/// replacer chain instead.
pub trait Extension: fmt::Debug + Send + Sync + 'static {
    fn to_tagged(&self) -> Option<TaggedForm> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another extension. Identity is always
    /// treated as equal.
    fn eq_extension(&self, _other: &dyn Extension) -> bool {
        false
    }
}

impl PartialEq for dyn Extension {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self, other) || self.eq_extension(other)
    }
}

/// Result of one link in a replacer or reviver chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Chained<T> {
    /// The link handled the input.
    Produced(T),
    /// The link does not handle the input, try the next one.
    Pass,
}

pub type TaggedReviver = dyn Fn(&Tagged) -> Result<Chained<Value>, Error> + Send + Sync;
pub type SimpleReviver = dyn Fn(Simple) -> Result<Chained<Value>, Error> + Send + Sync;
pub type Replacer = dyn Fn(&Value) -> Result<Chained<Value>, Error> + Send + Sync;
pub type ObjectKeyCheck = dyn Fn(&str) -> bool + Send + Sync;
pub type MapKeyCheck = dyn Fn(&Value) -> bool + Send + Sync;
