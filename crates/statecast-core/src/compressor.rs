//! Range compressors for packing bounded values into the fewest bits

use crate::bits::{BitReader, BitWriter};
use crate::error::{DecodeError, Result};

/// Bits needed to represent every value in `0..=max`
fn required_bits(max: u32) -> u8 {
    (32 - max.leading_zeros()) as u8
}

/// Packs integers from a closed range `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntCompressor {
    min: u32,
    max: u32,
    bits: u8,
}

impl IntCompressor {
    pub fn new(min: u32, max: u32) -> Self {
        assert!(min <= max, "IntCompressor range is empty: {}..={}", min, max);
        Self {
            min,
            max,
            bits: required_bits(max - min),
        }
    }

    /// Bits each value takes on the wire
    pub fn required_bits(&self) -> u8 {
        self.bits
    }

    pub fn write(&self, writer: &mut BitWriter, value: u32) {
        debug_assert!(
            value >= self.min && value <= self.max,
            "{} outside compressor range {}..={}",
            value,
            self.min,
            self.max
        );
        let clamped = value.clamp(self.min, self.max);
        writer.write_bits(clamped - self.min, self.bits);
    }

    pub fn read(&self, reader: &mut BitReader<'_>) -> Result<u32> {
        let value = reader.read_bits(self.bits)? as u64 + self.min as u64;
        if value > self.max as u64 {
            return Err(DecodeError::ValueOutOfRange {
                value,
                min: self.min as u64,
                max: self.max as u64,
            });
        }
        Ok(value as u32)
    }
}

/// Quantizes floats in `[min, max]` to a fixed precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatCompressor {
    min: f32,
    precision: f32,
    max_steps: u32,
    bits: u8,
}

impl FloatCompressor {
    pub fn new(min: f32, max: f32, precision: f32) -> Self {
        assert!(min < max, "FloatCompressor range is empty");
        assert!(precision > 0.0, "FloatCompressor precision must be positive");
        let max_steps = ((max - min) / precision).ceil() as u32;
        Self {
            min,
            precision,
            max_steps,
            bits: required_bits(max_steps),
        }
    }

    pub fn required_bits(&self) -> u8 {
        self.bits
    }

    pub fn write(&self, writer: &mut BitWriter, value: f32) {
        let steps = ((value - self.min) / self.precision).round();
        let steps = steps.clamp(0.0, self.max_steps as f32) as u32;
        writer.write_bits(steps, self.bits);
    }

    pub fn read(&self, reader: &mut BitReader<'_>) -> Result<f32> {
        let steps = reader.read_bits(self.bits)?;
        if steps > self.max_steps {
            return Err(DecodeError::ValueOutOfRange {
                value: steps as u64,
                min: 0,
                max: self.max_steps as u64,
            });
        }
        Ok(self.min + steps as f32 * self.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_bits() {
        assert_eq!(IntCompressor::new(0, 0).required_bits(), 0);
        assert_eq!(IntCompressor::new(0, 1).required_bits(), 1);
        assert_eq!(IntCompressor::new(0, 7).required_bits(), 3);
        assert_eq!(IntCompressor::new(0, 8).required_bits(), 4);
        assert_eq!(IntCompressor::new(10, 13).required_bits(), 2);
    }

    #[test]
    fn test_int_round_trip() {
        let compressor = IntCompressor::new(100, 200);
        let mut writer = BitWriter::new();
        compressor.write(&mut writer, 150);
        assert_eq!(writer.bits_written(), 7);

        let mut reader = BitReader::new(writer.as_bytes());
        assert_eq!(compressor.read(&mut reader).unwrap(), 150);
    }

    #[test]
    fn test_int_out_of_range_is_rejected() {
        let compressor = IntCompressor::new(0, 4);
        let mut reader = BitReader::new(&[0b0000_0111]);
        assert!(matches!(
            compressor.read(&mut reader),
            Err(DecodeError::ValueOutOfRange { value: 7, .. })
        ));
    }

    #[test]
    fn test_float_quantization() {
        let compressor = FloatCompressor::new(-100.0, 100.0, 0.01);
        let mut writer = BitWriter::new();
        compressor.write(&mut writer, 12.345);
        compressor.write(&mut writer, 500.0);

        let mut reader = BitReader::new(writer.as_bytes());
        let value = compressor.read(&mut reader).unwrap();
        assert!((value - 12.345).abs() <= 0.01);
        let clamped = compressor.read(&mut reader).unwrap();
        assert!((clamped - 100.0).abs() <= 0.01);
    }
}
