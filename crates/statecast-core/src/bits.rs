//! Bit-level stream codec
//!
//! Values are packed least-significant bit first. The final partial byte is
//! zero padded, and [`BitReader::finish`] rejects anything but zero padding
//! after the last value.

use crate::error::{DecodeError, Result};

/// Bits per varint chunk
const VARINT_CHUNK_BITS: u8 = 7;
/// Enough chunks to hold a `u32`
const VARINT_MAX_CHUNKS: u32 = 5;

/// Growable bit writer.
///
/// Can be cleared and reused between packets to keep its allocation.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    buffer: Vec<u8>,
    bits_written: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with room for `bytes` bytes
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(bytes),
            bits_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        let offset = self.bits_written % 8;
        if offset == 0 {
            self.buffer.push(0);
        }
        if bit {
            if let Some(last) = self.buffer.last_mut() {
                *last |= 1 << offset;
            }
        }
        self.bits_written += 1;
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_bit(value);
    }

    /// Write the low `count` bits of `value`
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32, "cannot write more than 32 bits at once");
        debug_assert!(
            count == 32 || value >> count == 0,
            "value {} does not fit in {} bits",
            value,
            count
        );
        let mut temp = value;
        for _ in 0..count {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bits(value as u32, 8);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bits(value as u32, 16);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bits(value, 32);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bits(value as u32, 32);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bits(value.to_bits(), 32);
    }

    /// Write an unsigned integer in 7-bit chunks, each prefixed by a
    /// "more follows" bit
    pub fn write_varint(&mut self, value: u32) {
        let mut value = value;
        loop {
            let proceed = value >> VARINT_CHUNK_BITS != 0;
            self.write_bit(proceed);
            self.write_bits(value & 0x7F, VARINT_CHUNK_BITS);
            value >>= VARINT_CHUNK_BITS;
            if !proceed {
                return;
            }
        }
    }

    /// Encoded size of `value` as a varint, in bits
    pub fn varint_bits(value: u32) -> u32 {
        let chunks = (32 - value.leading_zeros()).div_ceil(VARINT_CHUNK_BITS as u32).max(1);
        chunks * (VARINT_CHUNK_BITS as u32 + 1)
    }

    /// Zig-zag a signed integer into a varint
    pub fn write_varint_signed(&mut self, value: i32) {
        self.write_varint(((value << 1) ^ (value >> 31)) as u32);
    }

    pub fn bits_written(&self) -> u32 {
        self.bits_written
    }

    /// Bytes needed to hold everything written so far
    pub fn byte_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Reset for reuse, keeping the allocation
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.bits_written = 0;
    }
}

/// Bit reader over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    position: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn total_bits(&self) -> u32 {
        (self.bytes.len() as u32).saturating_mul(8)
    }

    /// Bits left before the end of the buffer (padding included)
    pub fn remaining_bits(&self) -> u32 {
        self.total_bits() - self.position
    }

    fn ensure(&self, needed: u32) -> Result<()> {
        let remaining = self.remaining_bits();
        if needed > remaining {
            return Err(DecodeError::Truncated { needed, remaining });
        }
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        self.ensure(1)?;
        let byte = self.bytes[(self.position / 8) as usize];
        let bit = (byte >> (self.position % 8)) & 1 != 0;
        self.position += 1;
        Ok(bit)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_bit()
    }

    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "cannot read more than 32 bits at once");
        self.ensure(count as u32)?;
        let mut value: u32 = 0;
        for index in 0..count {
            if self.read_bit()? {
                value |= 1 << index;
            }
        }
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bits(8).map(|v| v as u8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bits(16).map(|v| v as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bits(32)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_bits(32).map(|v| v as i32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_bits(32).map(f32::from_bits)
    }

    pub fn read_varint(&mut self) -> Result<u32> {
        let mut value: u64 = 0;
        for chunk in 0..VARINT_MAX_CHUNKS {
            let proceed = self.read_bit()?;
            let bits = self.read_bits(VARINT_CHUNK_BITS)? as u64;
            value |= bits << (chunk * VARINT_CHUNK_BITS as u32);
            if !proceed {
                if value > u32::MAX as u64 {
                    return Err(DecodeError::ValueOutOfRange {
                        value,
                        min: 0,
                        max: u32::MAX as u64,
                    });
                }
                return Ok(value as u32);
            }
        }
        Err(DecodeError::ValueOutOfRange {
            value,
            min: 0,
            max: u32::MAX as u64,
        })
    }

    pub fn read_varint_signed(&mut self) -> Result<i32> {
        let raw = self.read_varint()?;
        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }

    /// Read a count prefix and reject it if it is above `limit`
    pub fn read_count(&mut self, what: &'static str, limit: u32) -> Result<u32> {
        let count = self.read_varint()?;
        if count > limit {
            return Err(DecodeError::CountExceeded { what, count, limit });
        }
        Ok(count)
    }

    /// Check that only zero padding is left
    pub fn finish(self) -> Result<()> {
        let remaining = self.remaining_bits();
        if remaining >= 8 {
            return Err(DecodeError::TrailingData(remaining));
        }
        let mut reader = self;
        for _ in 0..remaining {
            if reader.read_bit()? {
                return Err(DecodeError::TrailingData(remaining));
            }
        }
        Ok(())
    }
}
