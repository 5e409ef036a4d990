/*!
Growable, chunked output buffer.

Requests no larger than the chunk size are served from the current chunk while
it has room, otherwise from a fresh chunk of exactly the chunk size. Larger
requests get a dedicated chunk of exactly the requested size. Chunks are only
joined when the output is taken.
*/

use super::*;
use crate::constants::*;

#[derive(Debug)]
pub struct Writer {
    chunks: Vec<Vec<u8>>,
    current: Vec<u8>,
    limit: usize,
    chunk_size: usize,
    depth: usize,
    max_depth: usize,
    poisoned: bool,
}

impl Default for Writer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Writer {
    pub fn new(chunk_size: usize, max_depth: usize) -> Self {
        Self {
            chunks: Vec::new(),
            current: Vec::new(),
            limit: 0,
            chunk_size: chunk_size.max(1),
            depth: 0,
            max_depth,
            poisoned: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.chunk_size, config.max_depth)
    }

    /// Total number of bytes written since the last clear.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum::<usize>() + self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spare capacity left in the current chunk.
    pub fn room(&self) -> usize {
        self.limit - self.current.len()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn poison(&mut self) {
        if !self.poisoned {
            debug!("Writer poisoned after {} bytes", self.len());
        }
        self.poisoned = true;
    }

    /// Returns a chunk with room for at least `len` more bytes.
    fn reserve(&mut self, len: usize) -> &mut Vec<u8> {
        if self.room() < len {
            self.start_chunk(len.max(self.chunk_size));
        }
        &mut self.current
    }

    fn start_chunk(&mut self, size: usize) {
        let done = core::mem::replace(&mut self.current, Vec::with_capacity(size));
        if !done.is_empty() {
            self.chunks.push(done);
        }
        self.limit = size;
    }

    pub(crate) fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= self.max_depth {
            return Err(Error::MaxDepth(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.reserve(1).push(val)
    }

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.reserve(2).extend_from_slice(&val.to_be_bytes())
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.reserve(4).extend_from_slice(&val.to_be_bytes())
    }

    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.reserve(8).extend_from_slice(&val.to_be_bytes())
    }

    /// Writes the initial byte followed by a fixed-width big-endian field.
    fn u8_then(&mut self, initial: u8, field: &[u8]) {
        let chunk = self.reserve(1 + field.len());
        chunk.push(initial);
        chunk.extend_from_slice(field)
    }

    pub fn f16(&mut self, val: half::f16) {
        self.u8_then(initial_byte(MAJOR_SIMPLE, INFO_TWO_BYTES), &val.to_be_bytes())
    }

    pub fn f32(&mut self, val: f32) {
        self.u8_then(initial_byte(MAJOR_SIMPLE, INFO_FOUR_BYTES), &val.to_be_bytes())
    }

    pub fn f64(&mut self, val: f64) {
        self.u8_then(initial_byte(MAJOR_SIMPLE, INFO_EIGHT_BYTES), &val.to_be_bytes())
    }

    /// Writes a data item header using the shortest argument band.
    pub fn header(&mut self, major: u8, val: u64) {
        if val <= INFO_INLINE_MAX as u64 {
            self.u8(initial_byte(major, val as u8))
        } else if val <= u8::MAX as u64 {
            self.u8_then(initial_byte(major, INFO_ONE_BYTE), &[val as u8])
        } else if val <= u16::MAX as u64 {
            self.u8_then(initial_byte(major, INFO_TWO_BYTES), &(val as u16).to_be_bytes())
        } else if val <= u32::MAX as u64 {
            self.u8_then(initial_byte(major, INFO_FOUR_BYTES), &(val as u32).to_be_bytes())
        } else {
            self.u8_then(initial_byte(major, INFO_EIGHT_BYTES), &val.to_be_bytes())
        }
    }

    pub fn bytes(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.reserve(data.len()).extend_from_slice(data)
        }
    }

    /// Writes a string item, header and payload together, into the current
    /// chunk when it has room, otherwise header then payload separately.
    pub fn string(&mut self, major: u8, data: &[u8]) {
        let len = data.len() as u64;
        if header_len(len) + data.len() > self.room() {
            self.header(major, len);
            return self.bytes(data);
        }
        self.header(major, len);
        self.current.extend_from_slice(data)
    }

    /// Joins the chunks written so far, leaving them in place.
    pub fn output(&self) -> Result<Vec<u8>, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        let mut out = Vec::with_capacity(self.len());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out.extend_from_slice(&self.current);
        Ok(out)
    }

    /// Joins the chunks written so far and clears the writer for reuse.
    pub fn consume(&mut self) -> Result<Vec<u8>, Error> {
        let out = self.output()?;
        self.clear();
        Ok(out)
    }

    /// Takes the chunks written so far without joining them.
    pub fn output_chunks(&mut self) -> Result<Vec<Vec<u8>>, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        let mut chunks = core::mem::take(&mut self.chunks);
        let current = core::mem::take(&mut self.current);
        if !current.is_empty() {
            chunks.push(current);
        }
        self.clear();
        Ok(chunks)
    }

    /// Discards everything written and resets depth and error state. The
    /// current chunk's allocation is kept.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.current.clear();
        self.limit = self.limit.min(self.current.capacity());
        self.depth = 0;
        self.poisoned = false;
    }
}
