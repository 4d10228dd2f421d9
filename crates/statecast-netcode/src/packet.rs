//! Packet codecs
//!
//! Both directions use the bit stream from `statecast-core`, with every list
//! preceded by an explicit count:
//!
//! ```text
//! client -> server
//!   [tick][update count]{[entity id][command count]{[tick][command]}}
//!   [view count]{[entity id][tick]}
//!
//! server -> client
//!   [tick][command ack][delta count]{delta}
//!   [removal count]{[entity id][removed tick]}
//! ```
//!
//! The final byte is zero padded. Decoders reject counts above the configured
//! [`PacketLimits`] and any bytes left after the last section.

use crate::error::Result;
use crate::view::View;
use serde::{Deserialize, Serialize};
use statecast_core::{
    BitReader, BitWriter, Command, DecodeError, EntityId, Registry, State, StateDelta, Tick, TimedCommand,
};

/// Upper bounds enforced when encoding and decoding packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketLimits {
    /// Byte budget of one server packet; deltas that do not fit wait for the
    /// next send
    pub max_packet_bytes: usize,
    pub max_deltas: u32,
    pub max_removals: u32,
    pub max_command_updates: u32,
    pub max_commands_per_update: u32,
    pub max_view_entries: u32,
}

impl Default for PacketLimits {
    fn default() -> Self {
        Self {
            max_packet_bytes: 1200,
            max_deltas: 256,
            max_removals: 256,
            max_command_updates: 16,
            max_commands_per_update: 32,
            max_view_entries: 1024,
        }
    }
}

/// Commands a client sends for one entity, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct CommandUpdate<C> {
    pub entity_id: EntityId,
    pub commands: Vec<TimedCommand<C>>,
}

impl<C: Command> CommandUpdate<C> {
    pub fn new(entity_id: EntityId, commands: Vec<TimedCommand<C>>) -> Self {
        Self { entity_id, commands }
    }

    fn encode(&self, writer: &mut BitWriter) {
        self.entity_id.encode(writer);
        writer.write_varint(self.commands.len() as u32);
        for command in &self.commands {
            command.encode(writer);
        }
    }

    fn decode(reader: &mut BitReader<'_>, limits: &PacketLimits) -> std::result::Result<Self, DecodeError> {
        let entity_id = EntityId::decode(reader)?;
        let count = reader.read_count("command", limits.max_commands_per_update)?;
        let commands = (0..count)
            .map(|_| TimedCommand::decode(reader))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { entity_id, commands })
    }
}

/// Client to server packet
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPacket<C> {
    /// Client tick when the packet was sent
    pub tick: Tick,
    pub command_updates: Vec<CommandUpdate<C>>,
    /// Server ticks the client has received, per entity
    pub view: View,
}

impl<C: Command> ClientPacket<C> {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            command_updates: Vec::new(),
            view: View::new(),
        }
    }

    pub fn encode(&self, writer: &mut BitWriter) {
        self.tick.encode(writer);
        writer.write_varint(self.command_updates.len() as u32);
        for update in &self.command_updates {
            update.encode(writer);
        }
        self.view.encode(writer);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }

    /// Decode a whole datagram
    pub fn decode(bytes: &[u8], limits: &PacketLimits) -> Result<Self> {
        let mut reader = BitReader::new(bytes);
        let tick = Tick::decode(&mut reader)?;
        let count = reader.read_count("command update", limits.max_command_updates)?;
        let command_updates = (0..count)
            .map(|_| CommandUpdate::decode(&mut reader, limits))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let view = View::decode(&mut reader, limits.max_view_entries)?;
        reader.finish()?;
        Ok(Self {
            tick,
            command_updates,
            view,
        })
    }
}

/// Tells a client that an entity was destroyed at a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalNotice {
    pub entity_id: EntityId,
    pub removed_tick: Tick,
}

impl RemovalNotice {
    pub fn new(entity_id: EntityId, removed_tick: Tick) -> Self {
        Self {
            entity_id,
            removed_tick,
        }
    }

    fn encode(&self, writer: &mut BitWriter) {
        self.entity_id.encode(writer);
        self.removed_tick.encode(writer);
    }

    /// Encoded size in bits
    pub fn bit_len(&self) -> u32 {
        BitWriter::varint_bits(self.entity_id.raw()) + BitWriter::varint_bits(self.removed_tick.raw())
    }

    fn decode(reader: &mut BitReader<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            entity_id: EntityId::decode(reader)?,
            removed_tick: Tick::decode(reader)?,
        })
    }
}

/// Server to client packet
#[derive(Debug, Clone, PartialEq)]
pub struct ServerPacket<S> {
    /// Server tick when the packet was sent; every delta carries it
    pub tick: Tick,
    /// Newest client command tick the server has consumed
    pub command_ack: Tick,
    pub deltas: Vec<StateDelta<S>>,
    pub removals: Vec<RemovalNotice>,
}

impl<S: State> ServerPacket<S> {
    pub fn new(tick: Tick, command_ack: Tick) -> Self {
        Self {
            tick,
            command_ack,
            deltas: Vec::new(),
            removals: Vec::new(),
        }
    }

    pub fn encode(&self, registry: &Registry<S>, writer: &mut BitWriter) {
        self.tick.encode(writer);
        self.command_ack.encode(writer);
        writer.write_varint(self.deltas.len() as u32);
        for delta in &self.deltas {
            delta.encode(registry, writer);
        }
        writer.write_varint(self.removals.len() as u32);
        for removal in &self.removals {
            removal.encode(writer);
        }
    }

    /// Bits used by everything except the deltas, reserving room for a delta
    /// count of up to `max_deltas`
    pub fn overhead_bits(&self, max_deltas: u32) -> u32 {
        let mut writer = BitWriter::new();
        self.tick.encode(&mut writer);
        self.command_ack.encode(&mut writer);
        writer.write_varint(self.removals.len() as u32);
        for removal in &self.removals {
            removal.encode(&mut writer);
        }
        writer.bits_written() + BitWriter::varint_bits(max_deltas)
    }

    /// Decode a whole datagram
    pub fn decode(bytes: &[u8], registry: &Registry<S>, limits: &PacketLimits) -> Result<Self> {
        let mut reader = BitReader::new(bytes);
        let tick = Tick::decode(&mut reader)?;
        let command_ack = Tick::decode(&mut reader)?;

        let count = reader.read_count("delta", limits.max_deltas)?;
        let deltas = (0..count)
            .map(|_| StateDelta::decode(registry, &mut reader, tick))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let count = reader.read_count("removal", limits.max_removals)?;
        let removals = (0..count)
            .map(|_| RemovalNotice::decode(&mut reader))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        reader.finish()?;
        Ok(Self {
            tick,
            command_ack,
            deltas,
            removals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_support::{registry, Beacon, Nudge, BEACON};
    use statecast_core::create_delta;

    fn client_packet() -> ClientPacket<Nudge> {
        let mut packet = ClientPacket::new(Tick::new(42));
        packet.command_updates.push(CommandUpdate::new(
            EntityId(7),
            vec![
                TimedCommand::new(Tick::new(40), Nudge(-1)),
                TimedCommand::new(Tick::new(41), Nudge(3)),
            ],
        ));
        packet.view.record(EntityId(7), Tick::new(38));
        packet.view.record(EntityId(9), Tick::new(36));
        packet
    }

    #[test]
    fn test_client_packet_round_trip() {
        let packet = client_packet();
        let decoded = ClientPacket::decode(&packet.to_bytes(), &PacketLimits::default()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_client_packet_limits() {
        let bytes = client_packet().to_bytes();
        let limits = PacketLimits {
            max_commands_per_update: 1,
            ..PacketLimits::default()
        };
        assert!(matches!(
            ClientPacket::<Nudge>::decode(&bytes, &limits),
            Err(Error::Decode(DecodeError::CountExceeded { what: "command", .. }))
        ));
    }

    #[test]
    fn test_client_packet_trailing_bytes() {
        let mut bytes = client_packet().to_bytes();
        bytes.push(0xFF);
        assert!(matches!(
            ClientPacket::<Nudge>::decode(&bytes, &PacketLimits::default()),
            Err(Error::Decode(DecodeError::TrailingData(_)))
        ));
    }

    #[test]
    fn test_client_packet_truncated() {
        let bytes = client_packet().to_bytes();
        assert!(matches!(
            ClientPacket::<Nudge>::decode(&bytes[..3], &PacketLimits::default()),
            Err(Error::Decode(DecodeError::Truncated { .. }))
        ));
        assert!(ClientPacket::<Nudge>::decode(&[], &PacketLimits::default()).is_err());
    }

    #[test]
    fn test_server_packet_round_trip() {
        let registry = registry();
        let mut packet = ServerPacket::new(Tick::new(20), Tick::new(17));
        let beacon = Beacon { level: 4, owner: 2 };
        packet
            .deltas
            .extend(create_delta(&registry, Tick::new(20), EntityId(1), &beacon, None, true, true, false));
        packet.removals.push(RemovalNotice::new(EntityId(5), Tick::new(18)));

        let mut writer = BitWriter::new();
        packet.encode(&registry, &mut writer);
        let decoded = ServerPacket::decode(writer.as_bytes(), &registry, &PacketLimits::default()).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.deltas[0].state().type_id(), BEACON);
    }

    #[test]
    fn test_overhead_matches_encoding() {
        let registry = registry();
        let mut packet = ServerPacket::<Beacon>::new(Tick::new(300), Tick::new(5));
        packet.removals.push(RemovalNotice::new(EntityId(2), Tick::new(290)));

        let mut writer = BitWriter::new();
        packet.encode(&registry, &mut writer);
        assert_eq!(packet.overhead_bits(0), writer.bits_written());
        assert_eq!(packet.overhead_bits(200), writer.bits_written() + 8);
    }

    #[test]
    fn test_removal_notice_bit_len() {
        for notice in [
            RemovalNotice::new(EntityId(2), Tick::new(290)),
            RemovalNotice::new(EntityId(70_000), Tick::new(1)),
        ] {
            let mut writer = BitWriter::new();
            notice.encode(&mut writer);
            assert_eq!(notice.bit_len(), writer.bits_written());
        }
    }

    #[test]
    fn test_server_packet_rejects_sentinel_removal() {
        let mut writer = BitWriter::new();
        Tick::new(4).encode(&mut writer);
        Tick::INVALID.encode(&mut writer);
        writer.write_varint(0);
        writer.write_varint(1);
        writer.write_varint(0);
        writer.write_varint(4);
        assert!(matches!(
            ServerPacket::decode(writer.as_bytes(), &registry(), &PacketLimits::default()),
            Err(Error::Decode(DecodeError::InvalidEntityId))
        ));
    }
}
