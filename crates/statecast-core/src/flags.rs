//! Fixed-width dirty-flag sets for mutable state fields

use crate::bits::{BitReader, BitWriter};
use crate::error::{DecodeError, Result};
use std::fmt;

/// Widest flag set a state may declare
pub const MAX_FLAG_BITS: u8 = 32;

/// One bit per mutable field (or field group) that differs from a basis.
///
/// The width is owned by the state that produced the set; the set itself only
/// stores the bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagSet(u32);

impl FlagSet {
    /// No fields changed
    pub const EMPTY: FlagSet = FlagSet(0);

    /// Every field in a `width`-bit space changed
    pub fn all(width: u8) -> Self {
        debug_assert!(width <= MAX_FLAG_BITS);
        if width >= MAX_FLAG_BITS {
            FlagSet(u32::MAX)
        } else {
            FlagSet((1u32 << width) - 1)
        }
    }

    /// Build from an ordered list of per-field comparisons, one bit each
    ///
    /// ```
    /// use statecast_core::FlagSet;
    ///
    /// let flags = FlagSet::from_changes([false, true, true]);
    /// assert_eq!(flags.bits(), 0b110);
    /// ```
    pub fn from_changes<I: IntoIterator<Item = bool>>(changes: I) -> Self {
        let mut bits = 0u32;
        for (index, changed) in changes.into_iter().enumerate() {
            debug_assert!(index < MAX_FLAG_BITS as usize, "too many flag fields");
            if changed && index < MAX_FLAG_BITS as usize {
                bits |= 1 << index;
            }
        }
        FlagSet(bits)
    }

    pub fn from_bits(bits: u32) -> Self {
        FlagSet(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether the field at `index` is flagged
    pub fn contains(&self, index: u8) -> bool {
        index < MAX_FLAG_BITS && self.0 & (1 << index) != 0
    }

    pub fn insert(&mut self, index: u8) {
        debug_assert!(index < MAX_FLAG_BITS);
        if index < MAX_FLAG_BITS {
            self.0 |= 1 << index;
        }
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Whether every set bit lies inside a `width`-bit space
    pub fn fits(&self, width: u8) -> bool {
        self.0 & !FlagSet::all(width).0 == 0
    }

    pub fn union(self, other: FlagSet) -> FlagSet {
        FlagSet(self.0 | other.0)
    }

    pub fn encode(&self, writer: &mut BitWriter, width: u8) {
        debug_assert!(self.fits(width), "flags {:?} exceed width {}", self, width);
        writer.write_bits(self.0 & FlagSet::all(width).0, width);
    }

    /// Read exactly `width` bits; a width above [`MAX_FLAG_BITS`] is rejected
    pub fn decode(reader: &mut BitReader<'_>, width: u8) -> Result<Self> {
        if width > MAX_FLAG_BITS {
            return Err(DecodeError::InvalidFlags(width));
        }
        reader.read_bits(width).map(FlagSet)
    }
}

impl fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlagSet({:#b})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all() {
        assert_eq!(FlagSet::all(0), FlagSet::EMPTY);
        assert_eq!(FlagSet::all(3).bits(), 0b111);
        assert_eq!(FlagSet::all(32).bits(), u32::MAX);
    }

    #[test]
    fn test_from_changes() {
        let flags = FlagSet::from_changes([true, false, true, false]);
        assert!(flags.contains(0));
        assert!(!flags.contains(1));
        assert!(flags.contains(2));
        assert_eq!(flags.count(), 2);
        assert!(FlagSet::from_changes([false, false]).is_empty());
    }

    #[test]
    fn test_fits() {
        assert!(FlagSet::from_bits(0b0111).fits(3));
        assert!(!FlagSet::from_bits(0b1000).fits(3));
        assert!(FlagSet::from_bits(u32::MAX).fits(32));
    }

    #[test]
    fn test_encode_uses_declared_width() {
        let mut writer = BitWriter::new();
        FlagSet::from_bits(0b101).encode(&mut writer, 5);
        assert_eq!(writer.bits_written(), 5);

        let mut reader = BitReader::new(writer.as_bytes());
        assert_eq!(FlagSet::decode(&mut reader, 5).unwrap().bits(), 0b101);
    }

    #[test]
    fn test_decode_rejects_oversized_width() {
        let bytes = [0u8; 8];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(
            FlagSet::decode(&mut reader, 33),
            Err(DecodeError::InvalidFlags(33))
        );
    }
}
