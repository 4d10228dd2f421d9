//! Shared fixtures for the server integration tests: a small entity state,
//! a command, and a client that decodes server packets and acknowledges them.

#![allow(dead_code)]

use indexmap::IndexMap;
use statecast_core::{
    apply_delta, BitReader, BitWriter, Command, EntityId, FlagSet, Registry, Result, State, Tick, TimedCommand,
};
use statecast_netcode::{ClientPacket, CommandUpdate, PacketLimits, ServerPacket, View};

pub const PILOT: u32 = 0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pilot {
    pub x: i32,
    pub y: i32,
    pub fuel: u16,
    pub team: u8,
}

impl Pilot {
    pub fn new(x: i32, y: i32, team: u8) -> Self {
        Self { x, y, fuel: 100, team }
    }
}

impl State for Pilot {
    fn type_id(&self) -> u32 {
        PILOT
    }

    fn flag_bits(&self) -> u8 {
        2
    }

    fn compare_mutable(&self, basis: &Self) -> FlagSet {
        FlagSet::from_changes([self.x != basis.x, self.y != basis.y])
    }

    fn is_controller_equal(&self, basis: &Self) -> bool {
        self.fuel == basis.fuel
    }

    fn apply_mutable_from(&mut self, source: &Self, flags: FlagSet) {
        if flags.contains(0) {
            self.x = source.x;
        }
        if flags.contains(1) {
            self.y = source.y;
        }
    }

    fn apply_controller_from(&mut self, source: &Self) {
        self.fuel = source.fuel;
    }

    fn apply_immutable_from(&mut self, source: &Self) {
        self.team = source.team;
    }

    fn encode_mutable(&self, writer: &mut BitWriter, flags: FlagSet) {
        if flags.contains(0) {
            writer.write_varint_signed(self.x);
        }
        if flags.contains(1) {
            writer.write_varint_signed(self.y);
        }
    }

    fn encode_controller(&self, writer: &mut BitWriter) {
        writer.write_u16(self.fuel);
    }

    fn encode_immutable(&self, writer: &mut BitWriter) {
        writer.write_u8(self.team);
    }

    fn decode_mutable(&mut self, reader: &mut BitReader<'_>, flags: FlagSet) -> Result<()> {
        if flags.contains(0) {
            self.x = reader.read_varint_signed()?;
        }
        if flags.contains(1) {
            self.y = reader.read_varint_signed()?;
        }
        Ok(())
    }

    fn decode_controller(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        self.fuel = reader.read_u16()?;
        Ok(())
    }

    fn decode_immutable(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        self.team = reader.read_u8()?;
        Ok(())
    }
}

pub fn registry() -> Registry<Pilot> {
    Registry::new().with(Pilot::default)
}

/// Move the controlled pilot by a step
#[derive(Debug, Clone, PartialEq)]
pub struct Thrust {
    pub dx: i32,
    pub dy: i32,
}

impl Command for Thrust {
    fn encode(&self, writer: &mut BitWriter) {
        writer.write_varint_signed(self.dx);
        writer.write_varint_signed(self.dy);
    }

    fn decode(reader: &mut BitReader<'_>) -> Result<Self> {
        Ok(Thrust {
            dx: reader.read_varint_signed()?,
            dy: reader.read_varint_signed()?,
        })
    }
}

/// Client end of one connection, without prediction or smoothing
#[derive(Debug, Default)]
pub struct TestClient {
    pub tick: Tick,
    pub view: View,
    pub entities: IndexMap<EntityId, Pilot>,
    pub removed: Vec<EntityId>,
    pub last_command_ack: Tick,
    pub deltas_received: usize,
}

impl TestClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a server packet, apply its deltas and removals, and note them
    /// in the view
    pub fn receive(&mut self, bytes: &[u8]) -> ServerPacket<Pilot> {
        let packet = ServerPacket::decode(bytes, &registry(), &PacketLimits::default())
            .expect("server packets decode");
        for delta in &packet.deltas {
            let state = self.entities.entry(delta.entity_id()).or_default();
            apply_delta(state, delta);
            self.view.record(delta.entity_id(), packet.tick);
        }
        for notice in &packet.removals {
            if self.entities.shift_remove(&notice.entity_id).is_some() {
                self.removed.push(notice.entity_id);
            }
            self.view.record(notice.entity_id, packet.tick);
        }
        self.deltas_received += packet.deltas.len();
        self.last_command_ack = packet.command_ack;
        packet
    }

    /// Advance the client tick and build a packet carrying the view and any
    /// commands for `entity`
    pub fn packet(&mut self, entity: Option<(EntityId, Vec<Thrust>)>) -> Vec<u8> {
        self.tick = self.tick.next();
        let mut packet = ClientPacket::new(self.tick);
        if let Some((id, thrusts)) = entity {
            let commands = thrusts
                .into_iter()
                .map(|thrust| TimedCommand::new(self.tick, thrust))
                .collect();
            packet.command_updates.push(CommandUpdate::new(id, commands));
        }
        packet.view = self.view.clone();
        packet.to_bytes()
    }
}
