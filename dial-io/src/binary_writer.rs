//! Binary writer for encoding dialVM wire formats.
//!
//! Mirrors [`crate::binary_reader::BinaryReader`] byte-for-byte so that
//! `serialize(deserialize(bytes)) == bytes` for any well-formed `.dsb`.

use crate::IoResult;
use bytes::{BufMut, BytesMut};

/// A writer for serializing little-endian binary data.
pub struct BinaryWriter {
    buffer: BytesMut,
}

impl BinaryWriter {
    /// Creates a new, empty binary writer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Creates a new binary writer with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Returns whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) -> IoResult<()> {
        self.buffer.put_u8(value);
        Ok(())
    }

    /// Writes a signed byte.
    pub fn write_i8(&mut self, value: i8) -> IoResult<()> {
        self.write_u8(value as u8)
    }

    /// Writes a boolean as a single byte.
    pub fn write_bool(&mut self, value: bool) -> IoResult<()> {
        self.write_u8(if value { 1 } else { 0 })
    }

    /// Writes a raw byte slice verbatim.
    pub fn write_bytes(&mut self, value: &[u8]) -> IoResult<()> {
        self.buffer.put_slice(value);
        Ok(())
    }

    /// Writes an unsigned 16-bit integer in little-endian format.
    pub fn write_u16(&mut self, value: u16) -> IoResult<()> {
        self.buffer.put_u16_le(value);
        Ok(())
    }

    /// Writes a signed 16-bit integer in little-endian format.
    pub fn write_i16(&mut self, value: i16) -> IoResult<()> {
        self.buffer.put_i16_le(value);
        Ok(())
    }

    /// Writes an unsigned 32-bit integer in little-endian format.
    pub fn write_u32(&mut self, value: u32) -> IoResult<()> {
        self.buffer.put_u32_le(value);
        Ok(())
    }

    /// Writes a signed 32-bit integer in little-endian format.
    pub fn write_i32(&mut self, value: i32) -> IoResult<()> {
        self.buffer.put_i32_le(value);
        Ok(())
    }

    /// Writes an IEEE-754 32-bit float in little-endian format.
    pub fn write_f32(&mut self, value: f32) -> IoResult<()> {
        self.buffer.put_f32_le(value);
        Ok(())
    }

    /// Writes a `u16`-length-prefixed UTF-8 string.
    pub fn write_string_u16(&mut self, value: &str) -> IoResult<()> {
        let bytes = value.as_bytes();
        self.write_u16(bytes.len() as u16)?;
        self.write_bytes(bytes)
    }

    /// Returns the written buffer as an owned byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Clears the buffer, retaining capacity.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}
