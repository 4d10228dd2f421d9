//! Minimal state and command used by this crate's unit tests

use statecast_core::{BitReader, BitWriter, Command, FlagSet, Registry, Result, State};

pub const KNOB: u32 = 0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Knob {
    // mutable
    pub value: i32,
    // controller
    pub trim: i32,
    // immutable
    pub color: u8,
}

impl Knob {
    pub fn new(value: i32, trim: i32, color: u8) -> Self {
        Self { value, trim, color }
    }
}

impl State for Knob {
    fn type_id(&self) -> u32 {
        KNOB
    }

    fn flag_bits(&self) -> u8 {
        1
    }

    fn compare_mutable(&self, basis: &Self) -> FlagSet {
        FlagSet::from_changes([self.value != basis.value])
    }

    fn is_controller_equal(&self, basis: &Self) -> bool {
        self.trim == basis.trim
    }

    fn apply_mutable_from(&mut self, source: &Self, flags: FlagSet) {
        if flags.contains(0) {
            self.value = source.value;
        }
    }

    fn apply_controller_from(&mut self, source: &Self) {
        self.trim = source.trim;
    }

    fn apply_immutable_from(&mut self, source: &Self) {
        self.color = source.color;
    }

    fn encode_mutable(&self, writer: &mut BitWriter, flags: FlagSet) {
        if flags.contains(0) {
            writer.write_varint_signed(self.value);
        }
    }

    fn encode_controller(&self, writer: &mut BitWriter) {
        writer.write_varint_signed(self.trim);
    }

    fn encode_immutable(&self, writer: &mut BitWriter) {
        writer.write_u8(self.color);
    }

    fn decode_mutable(&mut self, reader: &mut BitReader<'_>, flags: FlagSet) -> Result<()> {
        if flags.contains(0) {
            self.value = reader.read_varint_signed()?;
        }
        Ok(())
    }

    fn decode_controller(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        self.trim = reader.read_varint_signed()?;
        Ok(())
    }

    fn decode_immutable(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        self.color = reader.read_u8()?;
        Ok(())
    }
}

pub fn registry() -> Registry<Knob> {
    Registry::new().with(Knob::default)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn(pub i32);

impl Command for Turn {
    fn encode(&self, writer: &mut BitWriter) {
        writer.write_varint_signed(self.0);
    }

    fn decode(reader: &mut BitReader<'_>) -> Result<Self> {
        reader.read_varint_signed().map(Turn)
    }
}
