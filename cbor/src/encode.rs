/*!
Value to CBOR encoding.

[`write`] walks the value tree with an explicit stack of loop frames instead
of native recursion: each frame yields its next child until exhausted, and
completed frames are popped before the next child is fetched, so any number
of nested completions unwind in one step.
*/

use super::*;
use crate::constants::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::{slice, vec};

/// Encodes `value` with a fresh writer and returns the bytes.
pub fn encode(value: &Value, options: &EncoderOptions) -> Result<Vec<u8>, Error> {
    let mut writer = Writer::from_config(&options.config);
    write(&mut writer, value, options)?;
    writer.consume()
}

/// Appends the encoding of `value` to `writer`.
///
/// On error the writer is poisoned and must be cleared or discarded.
pub fn write(writer: &mut Writer, value: &Value, options: &EncoderOptions) -> Result<(), Error> {
    if writer.is_poisoned() {
        return Err(Error::Poisoned);
    }
    let r = Encoder {
        writer: &mut *writer,
        options,
        active: HashSet::new(),
    }
    .run(value);
    if r.is_err() {
        writer.poison();
    }
    r
}

/// Precomputed encodings of short strings that recur in every RPC message.
fn known_text(s: &str) -> Option<&'static [u8]> {
    Some(match s {
        "id" => b"\x62id",
        "ns" => b"\x62ns",
        "db" => b"\x62db",
        "tb" => b"\x62tb",
        "OK" => b"\x62OK",
        "ERR" => b"\x63ERR",
        "use" => b"\x63use",
        "let" => b"\x63let",
        "code" => b"\x64code",
        "data" => b"\x64data",
        "info" => b"\x64info",
        "kill" => b"\x64kill",
        "live" => b"\x64live",
        "ping" => b"\x64ping",
        "time" => b"\x64time",
        "error" => b"\x65error",
        "merge" => b"\x65merge",
        "patch" => b"\x65patch",
        "query" => b"\x65query",
        "unset" => b"\x65unset",
        "action" => b"\x66action",
        "create" => b"\x66create",
        "delete" => b"\x66delete",
        "insert" => b"\x66insert",
        "method" => b"\x66method",
        "params" => b"\x66params",
        "relate" => b"\x66relate",
        "result" => b"\x66result",
        "select" => b"\x66select",
        "signin" => b"\x66signin",
        "signup" => b"\x66signup",
        "status" => b"\x66status",
        "update" => b"\x66update",
        "upsert" => b"\x66upsert",
        "message" => b"\x67message",
        "version" => b"\x67version",
        "invalidate" => b"\x6ainvalidate",
        "authenticate" => b"\x6cauthenticate",
        _ => return None,
    })
}

/// A value being visited: either part of the caller's tree or produced during
/// the call by an extension or a replacer.
enum Node<'a> {
    Borrowed(&'a Value),
    Owned(Value),
}

impl Node<'_> {
    fn get(&self) -> &Value {
        match self {
            Node::Borrowed(v) => v,
            Node::Owned(v) => v,
        }
    }
}

enum Items<'a> {
    Borrowed(slice::Iter<'a, Value>),
    Owned(vec::IntoIter<Value>),
}

enum Entries<'a> {
    Borrowed(indexmap::map::Iter<'a, String, Value>),
    Owned(indexmap::map::IntoIter<String, Value>),
}

enum Pairs<'a> {
    Borrowed(slice::Iter<'a, (Value, Value)>),
    Owned(vec::IntoIter<(Value, Value)>),
}

enum Frame<'a> {
    Array(Items<'a>),
    /// Keys are written as soon as an entry is fetched, so only values are
    /// yielded.
    Object(Entries<'a>),
    /// Yields a key, then parks its value until the next call.
    Map {
        pairs: Pairs<'a>,
        value: Option<Node<'a>>,
    },
    /// Yields its single child once. `origin` is the extension whose tagged
    /// form is being written, held in the cycle-detection set until the frame
    /// completes.
    Tag {
        child: Option<Node<'a>>,
        origin: Option<Arc<dyn Extension>>,
        counted: bool,
    },
}

impl<'a> Frame<'a> {
    fn next(&mut self, writer: &mut Writer, options: &EncoderOptions) -> Result<Option<Node<'a>>, Error> {
        match self {
            Frame::Array(Items::Borrowed(it)) => Ok(it.next().map(Node::Borrowed)),
            Frame::Array(Items::Owned(it)) => Ok(it.next().map(Node::Owned)),
            Frame::Object(entries) => {
                let (key, value) = match entries {
                    Entries::Borrowed(it) => match it.next() {
                        Some((k, v)) => (k.as_str(), Node::Borrowed(v)),
                        None => return Ok(None),
                    },
                    Entries::Owned(it) => match it.next() {
                        Some((k, v)) => {
                            write_key(writer, options, &k)?;
                            return Ok(Some(Node::Owned(v)));
                        }
                        None => return Ok(None),
                    },
                };
                write_key(writer, options, key)?;
                Ok(Some(value))
            }
            Frame::Map { pairs, value } => {
                if let Some(value) = value.take() {
                    return Ok(Some(value));
                }
                let (key, next_value) = match pairs {
                    Pairs::Borrowed(it) => match it.next() {
                        Some((k, v)) => (Node::Borrowed(k), Node::Borrowed(v)),
                        None => return Ok(None),
                    },
                    Pairs::Owned(it) => match it.next() {
                        Some((k, v)) => (Node::Owned(k), Node::Owned(v)),
                        None => return Ok(None),
                    },
                };
                if !(options.map_key_check)(key.get()) {
                    return Err(Error::UnsafeKey(format!("{:?}", key.get())));
                }
                *value = Some(next_value);
                Ok(Some(key))
            }
            Frame::Tag { child, .. } => Ok(child.take()),
        }
    }

    fn is_counted(&self) -> bool {
        match self {
            Frame::Tag { counted, .. } => *counted,
            _ => true,
        }
    }
}

fn write_key(writer: &mut Writer, options: &EncoderOptions, key: &str) -> Result<(), Error> {
    if !(options.object_key_check)(key) {
        return Err(Error::UnsafeKey(key.to_string()));
    }
    write_text(writer, key);
    Ok(())
}

fn write_text(writer: &mut Writer, s: &str) {
    match known_text(s) {
        Some(encoded) => writer.bytes(encoded),
        None => writer.string(MAJOR_TEXT, s.as_bytes()),
    }
}

fn write_integer(writer: &mut Writer, n: i128) -> Result<(), Error> {
    if n >= 0 {
        let n = u64::try_from(n).map_err(|_| Error::IntegerOutOfRange(n))?;
        writer.header(MAJOR_UNSIGNED, n);
    } else {
        let n = u64::try_from(-1 - n).map_err(|_| Error::IntegerOutOfRange(n))?;
        writer.header(MAJOR_NEGATIVE, n);
    }
    Ok(())
}

fn write_float(writer: &mut Writer, f: f64) {
    if f.is_nan() || f == 0.0 || f.is_infinite() {
        writer.f16(half::f16::from_f64(f))
    } else {
        writer.f64(f)
    }
}

struct Encoder<'w, 'o> {
    writer: &'w mut Writer,
    options: &'o EncoderOptions,
    active: HashSet<*const ()>,
}

impl<'a> Encoder<'_, '_> {
    fn run(&mut self, root: &'a Value) -> Result<(), Error> {
        let mut stack: Vec<Frame<'a>> = Vec::new();
        let mut next = Some(Node::Borrowed(root));
        loop {
            if let Some(node) = next.take() {
                if let Some(frame) = self.open(node)? {
                    if frame.is_counted() {
                        self.writer.enter()?;
                    }
                    stack.push(frame);
                }
            }

            // Fetch the next child, unwinding every frame that has completed
            loop {
                let Some(top) = stack.last_mut() else {
                    return Ok(());
                };
                if let Some(child) = top.next(self.writer, self.options)? {
                    next = Some(child);
                    break;
                }
                if let Some(frame) = stack.pop() {
                    self.close(frame);
                }
            }
        }
    }

    fn close(&mut self, frame: Frame<'_>) {
        if frame.is_counted() {
            self.writer.leave();
        }
        if let Frame::Tag {
            origin: Some(origin),
            ..
        } = frame
        {
            self.active.remove(&(Arc::as_ptr(&origin) as *const ()));
        }
    }

    /// Writes a scalar directly, or writes a container or tag header and
    /// returns the frame that will yield its children.
    fn open(&mut self, mut node: Node<'a>) -> Result<Option<Frame<'a>>, Error> {
        let mut replacements = 0;
        loop {
            if self.write_scalar(node.get())? {
                return Ok(None);
            }
            match node {
                Node::Borrowed(Value::Array(items)) => {
                    return self.open_container(MAJOR_ARRAY, items.len(), || {
                        Frame::Array(Items::Borrowed(items.iter()))
                    });
                }
                Node::Owned(Value::Array(items)) => {
                    return self.open_container(MAJOR_ARRAY, items.len(), || {
                        Frame::Array(Items::Owned(items.into_iter()))
                    });
                }
                Node::Borrowed(Value::Object(entries)) => {
                    return self.open_container(MAJOR_MAP, entries.len(), || {
                        Frame::Object(Entries::Borrowed(entries.iter()))
                    });
                }
                Node::Owned(Value::Object(entries)) => {
                    return self.open_container(MAJOR_MAP, entries.len(), || {
                        Frame::Object(Entries::Owned(entries.into_iter()))
                    });
                }
                Node::Borrowed(Value::Map(pairs)) => {
                    return self.open_container(MAJOR_MAP, pairs.len(), || Frame::Map {
                        pairs: Pairs::Borrowed(pairs.iter()),
                        value: None,
                    });
                }
                Node::Owned(Value::Map(pairs)) => {
                    return self.open_container(MAJOR_MAP, pairs.len(), || Frame::Map {
                        pairs: Pairs::Owned(pairs.into_iter()),
                        value: None,
                    });
                }
                Node::Borrowed(Value::Tagged(tagged)) => {
                    self.writer.header(MAJOR_TAG, tagged.tag);
                    return Ok(Some(Frame::Tag {
                        child: Some(Node::Borrowed(&tagged.value)),
                        origin: None,
                        counted: true,
                    }));
                }
                Node::Owned(Value::Tagged(tagged)) => {
                    let Tagged { tag, value } = *tagged;
                    self.writer.header(MAJOR_TAG, tag);
                    return Ok(Some(Frame::Tag {
                        child: Some(Node::Owned(value)),
                        origin: None,
                        counted: true,
                    }));
                }
                _ => {}
            }

            if let Value::Extension(ext) = node.get() {
                let id = Arc::as_ptr(ext) as *const ();
                if self.active.contains(&id) {
                    return Err(Error::CircularReference);
                }
                if let Some(form) = ext.to_tagged() {
                    self.active.insert(id);
                    if let Some(tag) = form.tag {
                        self.writer.header(MAJOR_TAG, tag);
                    }
                    return Ok(Some(Frame::Tag {
                        child: Some(Node::Owned(form.value)),
                        origin: Some(ext.clone()),
                        counted: form.tag.is_some(),
                    }));
                }
            }

            // Anything else goes through the replacer chain; a replacement may
            // itself need replacing, bounded by the depth limit
            replacements += 1;
            if replacements > self.options.config.max_depth {
                return Err(Error::MaxDepth(self.options.config.max_depth));
            }
            let value = match self.options.replace(node.get())? {
                Chained::Produced(value) => value,
                Chained::Pass => return Err(Error::Unencodable(node.get().type_name())),
            };
            if let Value::Extension(ext) = node.get() {
                // The replacement may refer back to the extension
                self.active.insert(Arc::as_ptr(ext) as *const ());
                return Ok(Some(Frame::Tag {
                    child: Some(Node::Owned(value)),
                    origin: Some(ext.clone()),
                    counted: false,
                }));
            }
            node = Node::Owned(value);
        }
    }

    fn open_container<F>(&mut self, major: u8, len: usize, frame: F) -> Result<Option<Frame<'a>>, Error>
    where
        F: FnOnce() -> Frame<'a>,
    {
        self.writer.header(major, len as u64);
        if len == 0 {
            // Empty containers never push a frame, but still occupy a level
            self.writer.enter()?;
            self.writer.leave();
            return Ok(None);
        }
        Ok(Some(frame()))
    }

    fn write_scalar(&mut self, value: &Value) -> Result<bool, Error> {
        let writer = &mut *self.writer;
        match value {
            Value::Undefined => {
                if self.options.config.undefined_as_none_tag {
                    // The NONE tag occupies a level, as it does when decoded
                    writer.enter()?;
                    writer.header(MAJOR_TAG, TAG_NONE);
                    writer.u8(initial_byte(MAJOR_SIMPLE, SIMPLE_NULL));
                    writer.leave();
                } else {
                    writer.u8(initial_byte(MAJOR_SIMPLE, SIMPLE_UNDEFINED));
                }
            }
            Value::Null => writer.u8(initial_byte(MAJOR_SIMPLE, SIMPLE_NULL)),
            Value::Bool(false) => writer.u8(initial_byte(MAJOR_SIMPLE, SIMPLE_FALSE)),
            Value::Bool(true) => writer.u8(initial_byte(MAJOR_SIMPLE, SIMPLE_TRUE)),
            Value::Integer(n) => {
                if n.unsigned_abs() <= MAX_SAFE_INTEGER as u64 {
                    write_integer(writer, *n as i128)?;
                } else {
                    write_float(writer, *n as f64);
                }
            }
            Value::BigInt(n) => write_integer(writer, *n)?,
            Value::Float(f) => write_float(writer, *f),
            Value::Text(s) => write_text(writer, s),
            Value::Bytes(b) => writer.string(MAJOR_BYTES, b),
            Value::Simple(s) => writer.header(MAJOR_SIMPLE, s.value() as u64),
            _ => return Ok(false),
        }
        Ok(true)
    }
}
