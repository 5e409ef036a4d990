/*!
Resumable CBOR to [`Value`] decoding.

A [`Decoder`] is fed input with [`Decoder::process`] as it arrives. Items are
parsed in a single pass: scalars are materialized immediately and containers
are pushed as frames that collect their children, so input split at any byte
offset decodes to the same value as the whole. A header or definite-length
string cut off by the end of a chunk is held in a fragment and completed by
the next call.
*/

use super::*;
use crate::constants::*;
use crate::decode_frame::{Frame, prealloc};

/// Input held over from the previous [`Decoder::process`] call.
#[derive(Debug)]
enum Fragment {
    /// An initial byte and part of its argument.
    Header {
        bytes: [u8; 9],
        filled: usize,
        needed: usize,
    },
    /// Part of a definite-length string payload.
    Payload { major: u8, bytes: Vec<u8>, size: usize },
}

#[derive(Debug)]
pub struct Decoder {
    options: DecoderOptions,
    stack: Vec<Frame>,
    depth: usize,
    fragment: Option<Fragment>,
    root: Option<Value>,
    poisoned: bool,
}

/// Decodes a single complete item.
pub fn decode(data: &[u8], options: &DecoderOptions) -> Result<Value, Error> {
    let mut decoder = Decoder::new(options.clone());
    decoder.process(data)?;
    decoder.end()
}

impl Decoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            depth: 0,
            fragment: None,
            root: None,
            poisoned: false,
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Whether a complete root item has been decoded.
    pub fn is_complete(&self) -> bool {
        self.root.is_some()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Feeds the next chunk of input.
    ///
    /// On error the decoder is poisoned and every later call fails with
    /// [`Error::Poisoned`].
    pub fn process(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        self.process_chunk(data).inspect_err(|e| {
            debug!("Decoder failed at depth {}: {e}", self.depth);
            self.poisoned = true;
        })
    }

    /// Takes the decoded root, leaving the decoder ready for the next item.
    ///
    /// Fails with [`Error::NotEnoughData`] if the item is incomplete.
    pub fn output(&mut self) -> Result<Value, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        if !self.stack.is_empty() || self.fragment.is_some() {
            self.poisoned = true;
            return Err(Error::NotEnoughData);
        }
        let Some(root) = self.root.take() else {
            self.poisoned = true;
            return Err(Error::NotEnoughData);
        };
        self.depth = 0;
        Ok(root)
    }

    /// Takes the decoded root and consumes the decoder.
    pub fn end(mut self) -> Result<Value, Error> {
        self.output()
    }

    fn process_chunk(&mut self, data: &[u8]) -> Result<(), Error> {
        let mut offset = 0;
        match self.fragment.take() {
            None => {}
            Some(Fragment::Header {
                mut bytes,
                filled,
                needed,
            }) => {
                let take = (needed - filled).min(data.len());
                bytes[filled..filled + take].copy_from_slice(&data[..take]);
                offset = take;
                if filled + take < needed {
                    self.fragment = Some(Fragment::Header {
                        bytes,
                        filled: filled + take,
                        needed,
                    });
                    return Ok(());
                }
                trace!("Completed split header of {needed} bytes");
                let (major, info) = split_initial_byte(bytes[0]);
                let arg = read_argument(info, &bytes[1..needed]);
                offset += self.item(major, info, arg, &data[offset..])?;
            }
            Some(Fragment::Payload {
                major,
                mut bytes,
                size,
            }) => {
                let take = (size - bytes.len()).min(data.len());
                bytes.extend_from_slice(&data[..take]);
                offset = take;
                if bytes.len() < size {
                    self.fragment = Some(Fragment::Payload { major, bytes, size });
                    return Ok(());
                }
                trace!("Completed split string of {size} bytes");
                self.string(major, bytes)?;
            }
        }

        while offset < data.len() {
            offset += self.step(&data[offset..])?;
        }
        Ok(())
    }

    /// Parses one header and whatever of its payload is present, returning
    /// the number of bytes consumed.
    fn step(&mut self, data: &[u8]) -> Result<usize, Error> {
        if self.root.is_some() {
            return Err(Error::AdditionalItems);
        }
        let (major, info) = split_initial_byte(data[0]);
        let width = argument_width(info).ok_or(Error::InvalidAdditionalInfo(major, info))?;
        if data.len() <= width {
            let mut bytes = [0; 9];
            bytes[..data.len()].copy_from_slice(data);
            trace!("Header split after {} of {} bytes", data.len(), width + 1);
            self.fragment = Some(Fragment::Header {
                bytes,
                filled: data.len(),
                needed: width + 1,
            });
            return Ok(data.len());
        }
        let arg = read_argument(info, &data[1..=width]);
        Ok(1 + width + self.item(major, info, arg, &data[1 + width..])?)
    }

    /// Handles one item whose header has been read. Returns the number of
    /// payload bytes consumed from `rest`.
    fn item(&mut self, major: u8, info: u8, arg: u64, rest: &[u8]) -> Result<usize, Error> {
        if let Some(chunk_major) = self.stack.last().and_then(Frame::chunk_major) {
            let is_break = major == MAJOR_SIMPLE && info == INFO_INDEFINITE;
            if !is_break && (major != chunk_major || info == INFO_INDEFINITE) {
                return Err(Error::InvalidChunk(major));
            }
        }

        match (major, info) {
            (MAJOR_UNSIGNED | MAJOR_NEGATIVE | MAJOR_TAG, INFO_INDEFINITE) => {
                Err(Error::InvalidIndefinite(major))
            }
            (MAJOR_UNSIGNED, _) => self.emit(integer(arg as i128)).map(|_| 0),
            (MAJOR_NEGATIVE, _) => self.emit(integer(-1 - arg as i128)).map(|_| 0),
            (MAJOR_BYTES, INFO_INDEFINITE) => self.push(Frame::Bytes(Vec::new())).map(|_| 0),
            (MAJOR_TEXT, INFO_INDEFINITE) => self.push(Frame::Text(String::new())).map(|_| 0),
            (MAJOR_BYTES | MAJOR_TEXT, _) => {
                let size = usize::try_from(arg).map_err(|_| Error::LengthOutOfRange(arg))?;
                if rest.len() >= size {
                    self.string(major, rest[..size].to_vec())?;
                    return Ok(size);
                }
                trace!("String split after {} of {size} bytes", rest.len());
                let mut bytes = Vec::with_capacity(prealloc(arg).max(rest.len()));
                bytes.extend_from_slice(rest);
                self.fragment = Some(Fragment::Payload { major, bytes, size });
                Ok(rest.len())
            }
            (MAJOR_ARRAY, INFO_INDEFINITE) => self.push(Frame::array(None)).map(|_| 0),
            (MAJOR_ARRAY, _) if arg == 0 => {
                self.check_depth()?;
                self.emit(Value::Array(Vec::new())).map(|_| 0)
            }
            (MAJOR_ARRAY, _) => self.push(Frame::array(Some(arg))).map(|_| 0),
            (MAJOR_MAP, INFO_INDEFINITE) => {
                let frame = Frame::map(None, self.options.config.map_type);
                self.push(frame).map(|_| 0)
            }
            (MAJOR_MAP, _) if arg == 0 => {
                self.check_depth()?;
                let empty = Frame::map(Some(0), self.options.config.map_type).finish(&self.options)?;
                self.emit(empty).map(|_| 0)
            }
            (MAJOR_MAP, _) => {
                let frame = Frame::map(Some(arg), self.options.config.map_type);
                self.push(frame).map(|_| 0)
            }
            (MAJOR_TAG, _) => self.push(Frame::Tag { tag: arg, value: None }).map(|_| 0),
            (_, _) => self.simple(info, arg).map(|_| 0),
        }
    }

    fn simple(&mut self, info: u8, arg: u64) -> Result<(), Error> {
        let value = match info {
            0..=19 => self.options.revive_simple(Simple::new(info)?)?,
            SIMPLE_FALSE => Value::Bool(false),
            SIMPLE_TRUE => Value::Bool(true),
            SIMPLE_NULL => Value::Null,
            SIMPLE_UNDEFINED => Value::Undefined,
            INFO_ONE_BYTE => {
                if arg < 32 {
                    return Err(Error::InvalidSimple(arg as u8));
                }
                self.options.revive_simple(Simple::new(arg as u8)?)?
            }
            INFO_TWO_BYTES => Value::Float(half::f16::from_bits(arg as u16).to_f64()),
            INFO_FOUR_BYTES => Value::Float(f32::from_bits(arg as u32) as f64),
            INFO_EIGHT_BYTES => Value::Float(f64::from_bits(arg)),
            _ => return self.on_break(),
        };
        self.emit(value)
    }

    fn on_break(&mut self) -> Result<(), Error> {
        let Some(top) = self.stack.last() else {
            return Err(Error::UnexpectedBreak);
        };
        top.accept_break()?;
        self.pop()
    }

    /// Completes a string, either as a chunk of the open indefinite-length
    /// string or as a value in its own right.
    fn string(&mut self, major: u8, bytes: Vec<u8>) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(Frame::Text(s)) => s.push_str(core::str::from_utf8(&bytes)?),
            Some(Frame::Bytes(b)) => b.extend_from_slice(&bytes),
            _ if major == MAJOR_TEXT => {
                let s = String::from_utf8(bytes).map_err(|e| e.utf8_error())?;
                return self.emit(Value::Text(s));
            }
            _ => return self.emit(Value::Bytes(bytes)),
        }
        Ok(())
    }

    fn check_depth(&self) -> Result<(), Error> {
        if self.depth >= self.options.config.max_depth {
            return Err(Error::MaxDepth(self.options.config.max_depth));
        }
        Ok(())
    }

    fn push(&mut self, frame: Frame) -> Result<(), Error> {
        if frame.is_counted() {
            self.check_depth()?;
            self.depth += 1;
        }
        self.stack.push(frame);
        Ok(())
    }

    /// Pops the top frame and feeds its value to its parent.
    fn pop(&mut self) -> Result<(), Error> {
        let Some(frame) = self.stack.pop() else {
            return Err(Error::UnexpectedBreak);
        };
        if frame.is_counted() {
            self.depth -= 1;
        }
        let value = frame.finish(&self.options)?;
        self.emit(value)
    }

    /// Feeds a completed value to the top frame, unwinding every frame it
    /// completes, or sets the root.
    fn emit(&mut self, mut value: Value) -> Result<(), Error> {
        loop {
            let Some(top) = self.stack.last_mut() else {
                self.root = Some(value);
                return Ok(());
            };
            if !top.put(value, &self.options)? {
                return Ok(());
            }
            let Some(frame) = self.stack.pop() else {
                return Ok(());
            };
            if frame.is_counted() {
                self.depth -= 1;
            }
            value = frame.finish(&self.options)?;
        }
    }
}

/// Reads the argument that follows an initial byte with additional info
/// `info`. `field` holds exactly the announced number of bytes.
fn read_argument(info: u8, field: &[u8]) -> u64 {
    match info {
        0..=INFO_INLINE_MAX => info as u64,
        INFO_INDEFINITE => 0,
        _ => field.iter().fold(0, |acc, b| (acc << 8) | *b as u64),
    }
}

fn integer(n: i128) -> Value {
    match i64::try_from(n) {
        Ok(n) if n.unsigned_abs() <= MAX_SAFE_INTEGER as u64 => Value::Integer(n),
        _ => Value::BigInt(n),
    }
}
