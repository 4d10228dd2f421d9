//! Peer input commands

use crate::bits::{BitReader, BitWriter};
use crate::error::Result;
use crate::tick::{Tick, Timed};
use std::fmt;

/// Input payload a peer sends for the entity it controls
pub trait Command: Clone + fmt::Debug {
    fn encode(&self, writer: &mut BitWriter);

    fn decode(reader: &mut BitReader<'_>) -> Result<Self>
    where
        Self: Sized;
}

/// A command tagged with the client tick it was produced for
#[derive(Debug, Clone, PartialEq)]
pub struct TimedCommand<C> {
    pub tick: Tick,
    pub command: C,
}

impl<C: Command> TimedCommand<C> {
    pub fn new(tick: Tick, command: C) -> Self {
        Self { tick, command }
    }

    pub fn encode(&self, writer: &mut BitWriter) {
        self.tick.encode(writer);
        self.command.encode(writer);
    }

    pub fn decode(reader: &mut BitReader<'_>) -> Result<Self> {
        let tick = Tick::decode(reader)?;
        let command = C::decode(reader)?;
        Ok(Self { tick, command })
    }
}

impl<C> Timed for TimedCommand<C> {
    fn tick(&self) -> Tick {
        self.tick
    }
}
