//! Acknowledged view of the server's entities
//!
//! A client reports, per entity, the newest server tick it has received an
//! update for. The server uses that tick to pick the diff basis, and to know
//! when immutable data and removal notices no longer need sending.

use indexmap::IndexMap;
use statecast_core::{BitReader, BitWriter, DecodeError, EntityId, Tick};

/// Latest received server tick per entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    latest: IndexMap<EntityId, Tick>,
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `entity_id` was seen at `tick`, keeping the newest tick
    pub fn record(&mut self, entity_id: EntityId, tick: Tick) {
        if !tick.is_valid() {
            return;
        }
        let entry = self.latest.entry(entity_id).or_insert(tick);
        if tick > *entry {
            *entry = tick;
        }
    }

    /// Fold another view in, entity by entity
    pub fn integrate(&mut self, other: &View) {
        for (entity_id, tick) in &other.latest {
            self.record(*entity_id, *tick);
        }
    }

    /// Newest acknowledged tick for an entity
    pub fn latest_tick(&self, entity_id: EntityId) -> Option<Tick> {
        self.latest.get(&entity_id).copied()
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.latest.contains_key(&entity_id)
    }

    pub fn remove(&mut self, entity_id: EntityId) -> Option<Tick> {
        self.latest.shift_remove(&entity_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, Tick)> + '_ {
        self.latest.iter().map(|(id, tick)| (*id, *tick))
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }

    /// `[count]{[entity id][tick]}`
    pub fn encode(&self, writer: &mut BitWriter) {
        writer.write_varint(self.latest.len() as u32);
        for (entity_id, tick) in &self.latest {
            entity_id.encode(writer);
            tick.encode(writer);
        }
    }

    pub fn decode(reader: &mut BitReader<'_>, limit: u32) -> Result<Self, DecodeError> {
        let count = reader.read_count("view entry", limit)?;
        let mut view = View::new();
        for _ in 0..count {
            let entity_id = EntityId::decode(reader)?;
            let tick = Tick::decode(reader)?;
            view.record(entity_id, tick);
        }
        Ok(view)
    }
}

impl FromIterator<(EntityId, Tick)> for View {
    fn from_iter<I: IntoIterator<Item = (EntityId, Tick)>>(iter: I) -> Self {
        let mut view = View::new();
        for (entity_id, tick) in iter {
            view.record(entity_id, tick);
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_newest() {
        let mut view = View::new();
        view.record(EntityId(1), Tick::new(10));
        view.record(EntityId(1), Tick::new(6));
        view.record(EntityId(2), Tick::INVALID);

        assert_eq!(view.latest_tick(EntityId(1)), Some(Tick::new(10)));
        assert!(!view.contains(EntityId(2)));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_integrate_takes_max() {
        let mut acked: View = [(EntityId(1), Tick::new(4)), (EntityId(2), Tick::new(9))]
            .into_iter()
            .collect();
        let incoming: View = [(EntityId(1), Tick::new(8)), (EntityId(2), Tick::new(3))]
            .into_iter()
            .collect();

        acked.integrate(&incoming);
        assert_eq!(acked.latest_tick(EntityId(1)), Some(Tick::new(8)));
        assert_eq!(acked.latest_tick(EntityId(2)), Some(Tick::new(9)));
    }

    #[test]
    fn test_wire_round_trip() {
        let view: View = [(EntityId(3), Tick::new(40)), (EntityId(900), Tick::new(2))]
            .into_iter()
            .collect();
        let mut writer = BitWriter::new();
        view.encode(&mut writer);

        let mut reader = BitReader::new(writer.as_bytes());
        assert_eq!(View::decode(&mut reader, 8).unwrap(), view);
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_decode_enforces_limit() {
        let view: View = (1..=5).map(|i| (EntityId(i), Tick::new(i))).collect();
        let mut writer = BitWriter::new();
        view.encode(&mut writer);

        let mut reader = BitReader::new(writer.as_bytes());
        assert_eq!(
            View::decode(&mut reader, 4),
            Err(DecodeError::CountExceeded {
                what: "view entry",
                count: 5,
                limit: 4
            })
        );
    }
}
