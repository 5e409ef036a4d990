use super::*;
use crate::value::{MapKeyCheck, ObjectKeyCheck, Replacer, SimpleReviver, TaggedReviver};
use std::sync::Arc;

/// Which container a decoded CBOR map becomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MapType {
    /// [`Value::Object`], keyed by text (integer keys are stringified).
    #[default]
    Object,
    /// [`Value::Map`], insertion-ordered pairs with arbitrary keys.
    Map,
}

/// Data-only codec settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Maximum nesting of arrays, maps and tags.
    pub max_depth: usize,

    /// Size of each writer chunk, in bytes.
    pub chunk_size: usize,

    pub map_type: MapType,

    /// Encode [`Value::Undefined`] as tag 6 wrapping `null` rather than the
    /// simple value 23.
    pub undefined_as_none_tag: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: constants::DEFAULT_MAX_DEPTH,
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            map_type: MapType::default(),
            undefined_as_none_tag: true,
        }
    }
}

/// Rejects keys that would alter an object's prototype in a JavaScript
/// consumer.
pub fn default_object_key_check(key: &str) -> bool {
    !matches!(key, "__proto__" | "constructor")
}

pub fn default_map_key_check(key: &Value) -> bool {
    match key {
        Value::Text(s) => default_object_key_check(s),
        _ => true,
    }
}

/// Decoder settings: the data-only [`Config`] plus key checks and reviver
/// chains. Caller-supplied revivers run in insertion order, before the
/// built-in ones.
#[derive(Clone)]
pub struct DecoderOptions {
    pub(crate) config: Config,
    pub(crate) object_key_check: Arc<ObjectKeyCheck>,
    pub(crate) map_key_check: Arc<MapKeyCheck>,
    pub(crate) tagged_revivers: Vec<Arc<TaggedReviver>>,
    pub(crate) simple_revivers: Vec<Arc<SimpleReviver>>,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl DecoderOptions {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            object_key_check: Arc::new(default_object_key_check),
            map_key_check: Arc::new(default_map_key_check),
            tagged_revivers: Vec::new(),
            simple_revivers: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.config.map_type = map_type;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn with_object_key_check<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.object_key_check = Arc::new(f);
        self
    }

    pub fn with_map_key_check<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.map_key_check = Arc::new(f);
        self
    }

    pub fn with_tagged_reviver<F>(mut self, f: F) -> Self
    where
        F: Fn(&Tagged) -> Result<Chained<Value>, Error> + Send + Sync + 'static,
    {
        self.tagged_revivers.push(Arc::new(f));
        self
    }

    pub fn with_simple_reviver<F>(mut self, f: F) -> Self
    where
        F: Fn(Simple) -> Result<Chained<Value>, Error> + Send + Sync + 'static,
    {
        self.simple_revivers.push(Arc::new(f));
        self
    }

    pub(crate) fn revive_tagged(&self, tagged: Tagged) -> Result<Value, Error> {
        for reviver in &self.tagged_revivers {
            if let Chained::Produced(value) = reviver(&tagged)? {
                return Ok(value);
            }
        }
        match revive::revive_tagged(&tagged)? {
            Chained::Produced(value) => Ok(value),
            Chained::Pass => Ok(Value::Tagged(Box::new(tagged))),
        }
    }

    pub(crate) fn revive_simple(&self, simple: Simple) -> Result<Value, Error> {
        for reviver in &self.simple_revivers {
            if let Chained::Produced(value) = reviver(simple)? {
                return Ok(value);
            }
        }
        Ok(Value::Simple(simple))
    }
}

impl std::fmt::Debug for DecoderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderOptions")
            .field("config", &self.config)
            .field("tagged_revivers", &self.tagged_revivers.len())
            .field("simple_revivers", &self.simple_revivers.len())
            .finish()
    }
}

/// Encoder settings: the data-only [`Config`] plus key checks and the
/// replacer chain. Caller-supplied replacers run in insertion order, before
/// the built-in ones.
#[derive(Clone)]
pub struct EncoderOptions {
    pub(crate) config: Config,
    pub(crate) object_key_check: Arc<ObjectKeyCheck>,
    pub(crate) map_key_check: Arc<MapKeyCheck>,
    pub(crate) replacers: Vec<Arc<Replacer>>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl EncoderOptions {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            object_key_check: Arc::new(default_object_key_check),
            map_key_check: Arc::new(default_map_key_check),
            replacers: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    pub fn with_undefined_as_none_tag(mut self, enabled: bool) -> Self {
        self.config.undefined_as_none_tag = enabled;
        self
    }

    pub fn with_object_key_check<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.object_key_check = Arc::new(f);
        self
    }

    pub fn with_map_key_check<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.map_key_check = Arc::new(f);
        self
    }

    pub fn with_replacer<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Chained<Value>, Error> + Send + Sync + 'static,
    {
        self.replacers.push(Arc::new(f));
        self
    }

    pub(crate) fn replace(&self, value: &Value) -> Result<Chained<Value>, Error> {
        for replacer in &self.replacers {
            if let Chained::Produced(value) = replacer(value)? {
                return Ok(Chained::Produced(value));
            }
        }
        revive::replace(value)
    }
}

impl std::fmt::Debug for EncoderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderOptions")
            .field("config", &self.config)
            .field("replacers", &self.replacers.len())
            .finish()
    }
}
