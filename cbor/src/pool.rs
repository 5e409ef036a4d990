/*!
A reusable encoding arena.

[`EncodePool`] keeps one [`Writer`] alive across calls so repeated encodes
reuse its chunk allocation. The owner decides when the pool is created, reset
and dropped.
*/

use super::*;

#[derive(Debug)]
pub struct EncodePool {
    writer: Writer,
    options: EncoderOptions,
}

impl Default for EncodePool {
    fn default() -> Self {
        Self::new(EncoderOptions::default())
    }
}

impl EncodePool {
    pub fn new(options: EncoderOptions) -> Self {
        Self {
            writer: Writer::from_config(&options.config),
            options,
        }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Encodes `value` and returns its bytes.
    ///
    /// A writer left poisoned by a failed call is reset first.
    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>, Error> {
        if self.writer.is_poisoned() {
            trace!("Resetting poisoned pool writer");
            self.writer.clear();
        }
        encode::write(&mut self.writer, value, &self.options)?;
        self.writer.consume()
    }

    /// Encodes `value` and returns its chunks without joining them.
    pub fn encode_chunks(&mut self, value: &Value) -> Result<Vec<Vec<u8>>, Error> {
        if self.writer.is_poisoned() {
            self.writer.clear();
        }
        encode::write(&mut self.writer, value, &self.options)?;
        self.writer.output_chunks()
    }

    /// Drops the writer's allocation.
    pub fn reset(&mut self) {
        self.writer = Writer::from_config(&self.options.config);
    }
}
