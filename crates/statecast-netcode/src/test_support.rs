//! Minimal state and command used by this crate's tests

use statecast_core::{BitReader, BitWriter, Command, FlagSet, Registry, Result, State};

pub const BEACON: u32 = 0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Beacon {
    // mutable
    pub level: u8,
    // immutable
    pub owner: u8,
}

impl State for Beacon {
    fn type_id(&self) -> u32 {
        BEACON
    }

    fn flag_bits(&self) -> u8 {
        1
    }

    fn compare_mutable(&self, basis: &Self) -> FlagSet {
        FlagSet::from_changes([self.level != basis.level])
    }

    fn is_controller_equal(&self, _basis: &Self) -> bool {
        true
    }

    fn apply_mutable_from(&mut self, source: &Self, flags: FlagSet) {
        if flags.contains(0) {
            self.level = source.level;
        }
    }

    fn apply_controller_from(&mut self, _source: &Self) {}

    fn apply_immutable_from(&mut self, source: &Self) {
        self.owner = source.owner;
    }

    fn encode_mutable(&self, writer: &mut BitWriter, flags: FlagSet) {
        if flags.contains(0) {
            writer.write_u8(self.level);
        }
    }

    fn encode_controller(&self, _writer: &mut BitWriter) {}

    fn encode_immutable(&self, writer: &mut BitWriter) {
        writer.write_u8(self.owner);
    }

    fn decode_mutable(&mut self, reader: &mut BitReader<'_>, flags: FlagSet) -> Result<()> {
        if flags.contains(0) {
            self.level = reader.read_u8()?;
        }
        Ok(())
    }

    fn decode_controller(&mut self, _reader: &mut BitReader<'_>) -> Result<()> {
        Ok(())
    }

    fn decode_immutable(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        self.owner = reader.read_u8()?;
        Ok(())
    }
}

pub fn registry() -> Registry<Beacon> {
    Registry::new().with(Beacon::default)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nudge(pub i32);

impl Command for Nudge {
    fn encode(&self, writer: &mut BitWriter) {
        writer.write_varint_signed(self.0);
    }

    fn decode(reader: &mut BitReader<'_>) -> Result<Self> {
        reader.read_varint_signed().map(Nudge)
    }
}
