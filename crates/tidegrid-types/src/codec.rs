//! Binary codec for configuration objects shipped between cluster members.
//!
//! Integers are fixed-width big-endian. Text is a u16 byte length followed by modified
//! UTF-8. There is no framing beyond each field's own encoding, so both sides must agree on
//! field order.

use crate::error::ConfigError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Longest text `write_utf` accepts, in encoded bytes.
pub const MAX_UTF_LENGTH: usize = u16::MAX as usize;

/// A value with a fixed binary field layout.
///
/// `read_data` overwrites the fields covered by the layout in place and leaves every other
/// field untouched.
pub trait DataSerializable {
    fn write_data(&self, out: &mut DataOutput) -> Result<(), ConfigError>;

    fn read_data(&mut self, input: &mut DataInput) -> Result<(), ConfigError>;

    /// Encode into a standalone buffer
    fn to_bytes(&self) -> Result<Bytes, ConfigError> {
        let mut out = DataOutput::new();
        self.write_data(&mut out)?;
        Ok(out.freeze())
    }

    /// Decode a default-constructed value from `bytes`
    fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError>
    where
        Self: Default + Sized,
    {
        let mut value = Self::default();
        let mut input = DataInput::new(bytes);
        value.read_data(&mut input)?;
        Ok(value)
    }
}

/// Growable output buffer.
#[derive(Debug, Default)]
pub struct DataOutput {
    buf: BytesMut,
}

impl DataOutput {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(64),
        }
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    /// Write `value` as u16-length-prefixed modified UTF-8.
    ///
    /// NUL is written as the two-byte form and supplementary characters as two three-byte
    /// surrogate sequences.
    pub fn write_utf(&mut self, value: &str) -> Result<(), ConfigError> {
        let encoded_len: usize = value.encode_utf16().map(modified_utf8_len).sum();
        if encoded_len > MAX_UTF_LENGTH {
            return Err(ConfigError::Serialization(format!(
                "encoded string too long: {} bytes",
                encoded_len
            )));
        }

        self.buf.reserve(2 + encoded_len);
        self.buf.put_u16(encoded_len as u16);
        for unit in value.encode_utf16() {
            match unit {
                0x0001..=0x007F => self.buf.put_u8(unit as u8),
                0x0000 | 0x0080..=0x07FF => {
                    self.buf.put_u8(0xC0 | ((unit >> 6) & 0x1F) as u8);
                    self.buf.put_u8(0x80 | (unit & 0x3F) as u8);
                }
                _ => {
                    self.buf.put_u8(0xE0 | ((unit >> 12) & 0x0F) as u8);
                    self.buf.put_u8(0x80 | ((unit >> 6) & 0x3F) as u8);
                    self.buf.put_u8(0x80 | (unit & 0x3F) as u8);
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

fn modified_utf8_len(unit: u16) -> usize {
    match unit {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

/// Cursor over an encoded buffer.
#[derive(Debug)]
pub struct DataInput<'a> {
    buf: &'a [u8],
}

impl<'a> DataInput<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize, what: &str) -> Result<(), ConfigError> {
        if self.buf.remaining() < needed {
            return Err(ConfigError::Deserialization(format!(
                "insufficient bytes for {}: need {}, have {}",
                what,
                needed,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_i32(&mut self) -> Result<i32, ConfigError> {
        self.ensure(4, "i32")?;
        Ok(self.buf.get_i32())
    }

    pub fn read_utf(&mut self) -> Result<String, ConfigError> {
        self.ensure(2, "string length")?;
        let len = self.buf.get_u16() as usize;
        self.ensure(len, "string body")?;

        let (body, rest) = self.buf.split_at(len);
        self.buf = rest;
        decode_modified_utf8(body)
    }
}

fn decode_modified_utf8(bytes: &[u8]) -> Result<String, ConfigError> {
    let malformed = |pos: usize| {
        ConfigError::Deserialization(format!("malformed modified UTF-8 at byte {}", pos))
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 >> 4 {
            0x0..=0x7 => {
                units.push(b0 as u16);
                i += 1;
            }
            0xC | 0xD => {
                let b1 = *bytes.get(i + 1).ok_or_else(|| malformed(i))?;
                if b1 & 0xC0 != 0x80 {
                    return Err(malformed(i + 1));
                }
                units.push((((b0 & 0x1F) as u16) << 6) | (b1 & 0x3F) as u16);
                i += 2;
            }
            0xE => {
                let b1 = *bytes.get(i + 1).ok_or_else(|| malformed(i))?;
                let b2 = *bytes.get(i + 2).ok_or_else(|| malformed(i))?;
                if b1 & 0xC0 != 0x80 || b2 & 0xC0 != 0x80 {
                    return Err(malformed(i + 1));
                }
                units.push(
                    (((b0 & 0x0F) as u16) << 12) | (((b1 & 0x3F) as u16) << 6) | (b2 & 0x3F) as u16,
                );
                i += 3;
            }
            _ => return Err(malformed(i)),
        }
    }

    String::from_utf16(&units)
        .map_err(|e| ConfigError::Deserialization(format!("invalid UTF-16 sequence: {}", e)))
}
