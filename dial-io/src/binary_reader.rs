//! Binary reader for decoding dialVM wire formats.
//!
//! This module provides a cursor-based reader over an immutable byte buffer,
//! used by the bytecode loader to decode `.dsb` containers.

use crate::{IoError, IoResult};
use bytes::Bytes;

/// A reader for deserializing little-endian binary data.
pub struct BinaryReader {
    /// The data being read.
    data: Bytes,

    /// The current position in the data.
    position: usize,
}

impl BinaryReader {
    /// Creates a new binary reader from the given data.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the length of the data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the data is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns whether the end of the data has been reached.
    pub fn is_eof(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Returns the number of unread bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn end_of_stream(&self, context: &str, expected: usize) -> IoError {
        IoError::EndOfStream {
            expected,
            context: context.to_string(),
        }
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> IoResult<u8> {
        if self.is_eof() {
            return Err(self.end_of_stream("u8", 1));
        }
        let byte = self.data[self.position];
        self.position += 1;
        Ok(byte)
    }

    /// Reads a signed byte.
    pub fn read_i8(&mut self) -> IoResult<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Reads a boolean encoded as a single byte.
    pub fn read_bool(&mut self) -> IoResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a fixed-length byte array.
    pub fn read_bytes(&mut self, length: usize) -> IoResult<Vec<u8>> {
        if self.remaining() < length {
            return Err(self.end_of_stream("bytes", length));
        }
        let bytes = self.data.slice(self.position..self.position + length);
        self.position += length;
        Ok(bytes.to_vec())
    }

    /// Reads an unsigned 16-bit integer in little-endian format.
    pub fn read_u16(&mut self) -> IoResult<u16> {
        let buf = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([buf[0], buf[1]]))
    }

    /// Reads a signed 16-bit integer in little-endian format.
    pub fn read_i16(&mut self) -> IoResult<i16> {
        let buf = self.read_bytes(2)?;
        Ok(i16::from_le_bytes([buf[0], buf[1]]))
    }

    /// Reads an unsigned 32-bit integer in little-endian format.
    pub fn read_u32(&mut self) -> IoResult<u32> {
        let buf = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    /// Reads a signed 32-bit integer in little-endian format.
    pub fn read_i32(&mut self) -> IoResult<i32> {
        let buf = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    /// Reads an IEEE-754 32-bit float in little-endian format.
    pub fn read_f32(&mut self) -> IoResult<f32> {
        let buf = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    /// Reads a `u16`-length-prefixed UTF-8 string, as used throughout the
    /// `.dsb` metadata and constant pool sections.
    pub fn read_string_u16(&mut self) -> IoResult<String> {
        let length = self.read_u16()? as usize;
        let bytes = self.read_bytes(length)?;
        String::from_utf8(bytes).map_err(|e| IoError::InvalidData {
            context: "string_u16".to_string(),
            value: e.to_string(),
        })
    }

    /// Seeks to the given absolute position.
    pub fn seek(&mut self, position: usize) -> IoResult<()> {
        if position > self.data.len() {
            return Err(IoError::InvalidOperation {
                operation: "seek".to_string(),
                context: format!("position {position} out of bounds"),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Skips `count` bytes.
    pub fn skip(&mut self, count: usize) -> IoResult<()> {
        if self.remaining() < count {
            return Err(self.end_of_stream("skip", count));
        }
        self.position += count;
        Ok(())
    }

    /// Returns the raw bytes backing this reader.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
