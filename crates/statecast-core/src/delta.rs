//! State deltas and their wire encoding
//!
//! A delta is the minimal change of one entity since a basis record, plus the
//! privileged partitions when asked for. The encoded layout is fixed:
//!
//! ```text
//! [type id][entity id][has controller][has immutable][flags: flag_bits]
//! [mutable fields selected by flags][controller fields][immutable fields]
//! ```

use crate::bits::{BitReader, BitWriter};
use crate::error::Result;
use crate::flags::FlagSet;
use crate::identity::EntityId;
use crate::registry::Registry;
use crate::state::{State, StateRecord};
use crate::tick::{Tick, Timed};

/// One entity's change at one tick
#[derive(Debug, Clone, PartialEq)]
pub struct StateDelta<S> {
    tick: Tick,
    entity_id: EntityId,
    state: S,
    flags: FlagSet,
    has_controller_data: bool,
    has_immutable_data: bool,
}

impl<S: State> StateDelta<S> {
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Payload; only the partitions and fields flagged on this delta are
    /// meaningful
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn flags(&self) -> FlagSet {
        self.flags
    }

    pub fn has_controller_data(&self) -> bool {
        self.has_controller_data
    }

    pub fn has_immutable_data(&self) -> bool {
        self.has_immutable_data
    }

    pub fn encode(&self, registry: &Registry<S>, writer: &mut BitWriter) {
        let width = self.state.flag_bits();
        debug_assert!(self.flags.fits(width), "delta flags exceed state flag width");

        registry.type_compressor().write(writer, self.state.type_id());
        self.entity_id.encode(writer);
        writer.write_bool(self.has_controller_data);
        writer.write_bool(self.has_immutable_data);
        self.flags.encode(writer, width);

        self.state.encode_mutable(writer, self.flags);
        if self.has_controller_data {
            self.state.encode_controller(writer);
        }
        if self.has_immutable_data {
            self.state.encode_immutable(writer);
        }
    }

    /// Read one delta; the tick comes from the enclosing packet
    pub fn decode(registry: &Registry<S>, reader: &mut BitReader<'_>, packet_tick: Tick) -> Result<Self> {
        let type_id = registry.type_compressor().read(reader)?;
        let mut state = registry.create_state(type_id)?;
        let entity_id = EntityId::decode(reader)?;
        let has_controller_data = reader.read_bool()?;
        let has_immutable_data = reader.read_bool()?;
        let flags = FlagSet::decode(reader, state.flag_bits())?;

        state.decode_mutable(reader, flags)?;
        if has_controller_data {
            state.decode_controller(reader)?;
        }
        if has_immutable_data {
            state.decode_immutable(reader)?;
        }

        Ok(Self {
            tick: packet_tick,
            entity_id,
            state,
            flags,
            has_controller_data,
            has_immutable_data,
        })
    }

    /// Encoded size in bits
    pub fn bit_len(&self, registry: &Registry<S>) -> u32 {
        let mut writer = BitWriter::new();
        self.encode(registry, &mut writer);
        writer.bits_written()
    }
}

impl<S> Timed for StateDelta<S> {
    fn tick(&self) -> Tick {
        self.tick
    }
}

/// Diff `current` against `basis`.
///
/// Without a basis every mutable flag is set. Returns `None` when nothing
/// changed and none of the controller, immutable or forced inclusions were
/// requested.
#[allow(clippy::too_many_arguments)]
pub fn create_delta<S: State>(
    registry: &Registry<S>,
    tick: Tick,
    entity_id: EntityId,
    current: &S,
    basis: Option<&StateRecord<S>>,
    include_controller: bool,
    include_immutable: bool,
    forced: bool,
) -> Option<StateDelta<S>> {
    debug_assert!(entity_id.is_valid(), "delta requested for an invalid entity id");

    let flags = match basis {
        Some(basis) => {
            debug_assert_eq!(
                current.type_id(),
                basis.state().type_id(),
                "entity changed state type"
            );
            current.compare_mutable(basis.state())
        }
        None => FlagSet::all(current.flag_bits()),
    };

    if flags.is_empty() && !(forced || include_controller || include_immutable) {
        return None;
    }

    let mut state = match registry.create_state(current.type_id()) {
        Ok(blank) => blank,
        Err(_) => {
            debug_assert!(false, "state type {} is not registered", current.type_id());
            current.clone()
        }
    };
    state.apply_mutable_from(current, flags);
    if include_controller {
        state.apply_controller_from(current);
    }
    if include_immutable {
        state.apply_immutable_from(current);
    }

    Some(StateDelta {
        tick,
        entity_id,
        state,
        flags,
        has_controller_data: include_controller,
        has_immutable_data: include_immutable,
    })
}

/// Overwrite `target` with whatever `delta` carries
pub fn apply_delta<S: State>(target: &mut S, delta: &StateDelta<S>) {
    target.apply_mutable_from(&delta.state, delta.flags);
    if delta.has_controller_data {
        target.apply_controller_from(&delta.state);
    }
    if delta.has_immutable_data {
        target.apply_immutable_from(&delta.state);
    }
}
