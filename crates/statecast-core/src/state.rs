//! Partitioned entity state and retained records
//!
//! Every synchronized entity carries a state split into three partitions:
//!
//! - **mutable**: changes often, diffed field-by-field against a basis
//! - **controller**: only ever sent to the peer controlling the entity
//! - **immutable**: set once at spawn, sent until the peer acknowledges it
//!
//! A concrete state (usually an enum over the game's entity kinds) implements
//! [`State`] once; the engine only talks to it through that trait.

use crate::bits::{BitReader, BitWriter};
use crate::error::Result;
use crate::flags::FlagSet;
use crate::tick::{Tick, Timed};
use std::fmt;

/// Capability interface for one synchronized state variant
pub trait State: Clone + fmt::Debug {
    /// Factory type id, as registered in the [`Registry`](crate::Registry)
    fn type_id(&self) -> u32;

    /// Width of this state's mutable flag space
    fn flag_bits(&self) -> u8;

    /// Flags for every mutable field that differs from `basis`
    fn compare_mutable(&self, basis: &Self) -> FlagSet;

    fn is_controller_equal(&self, basis: &Self) -> bool;

    /// Copy the mutable fields selected by `flags` from `source`
    fn apply_mutable_from(&mut self, source: &Self, flags: FlagSet);

    fn apply_controller_from(&mut self, source: &Self);

    fn apply_immutable_from(&mut self, source: &Self);

    fn encode_mutable(&self, writer: &mut BitWriter, flags: FlagSet);

    fn encode_controller(&self, writer: &mut BitWriter);

    fn encode_immutable(&self, writer: &mut BitWriter);

    fn decode_mutable(&mut self, reader: &mut BitReader<'_>, flags: FlagSet) -> Result<()>;

    fn decode_controller(&mut self, reader: &mut BitReader<'_>) -> Result<()>;

    fn decode_immutable(&mut self, reader: &mut BitReader<'_>) -> Result<()>;

    /// Blend between two snapshots at interpolation parameter `t`.
    ///
    /// The default keeps the current values.
    fn apply_smoothed(&mut self, _first: &Self, _second: &Self, _t: f32) {}
}

/// A retained copy of an entity's state at a tick, used only as a diff basis
#[derive(Debug, Clone, PartialEq)]
pub struct StateRecord<S> {
    tick: Tick,
    state: S,
}

impl<S: State> StateRecord<S> {
    pub fn new(tick: Tick, state: S) -> Self {
        Self { tick, state }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

impl<S> Timed for StateRecord<S> {
    fn tick(&self) -> Tick {
        self.tick
    }
}

/// Snapshot `current` unless it matches `latest` on both the mutable and the
/// controller partitions
pub fn create_record<S: State>(
    tick: Tick,
    current: &S,
    latest: Option<&StateRecord<S>>,
) -> Option<StateRecord<S>> {
    if let Some(latest) = latest {
        let changed = !current.compare_mutable(&latest.state).is_empty()
            || !current.is_controller_equal(&latest.state);
        if !changed {
            return None;
        }
    }
    Some(StateRecord::new(tick, current.clone()))
}

/// Interpolation parameter of `real_time` between two timestamps.
///
/// Not clamped, so callers can extrapolate; equal timestamps give `0`.
pub fn compute_interp(first_time: f32, second_time: f32, real_time: f32) -> f32 {
    let span = second_time - first_time;
    if span.abs() <= f32::EPSILON {
        return 0.0;
    }
    (real_time - first_time) / span
}

/// Smooth `target` between two records, mapping wall-clock `real_time` onto
/// the records' ticks
pub fn apply_smoothed<S: State>(
    target: &mut S,
    first: &StateRecord<S>,
    second: &StateRecord<S>,
    real_time: f32,
    fixed_delta: f32,
) {
    let t = compute_interp(
        first.tick.time(fixed_delta),
        second.tick.time(fixed_delta),
        real_time,
    );
    target.apply_smoothed(&first.state, &second.state, t);
}

#[cfg(test)]
pub(crate) mod test_state {
    //! A two-variant state used across this crate's tests

    use super::*;
    use crate::compressor::FloatCompressor;

    pub const PAWN: u32 = 0;
    pub const CRATE: u32 = 1;

    fn coordinate() -> FloatCompressor {
        FloatCompressor::new(-512.0, 512.0, 0.25)
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Pawn {
        // mutable
        pub x: f32,
        pub y: f32,
        pub health: u8,
        // controller
        pub ammo: u16,
        // immutable
        pub team: u8,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Crate {
        pub open: bool,
        pub kind: u8,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum TestState {
        Pawn(Pawn),
        Crate(Crate),
    }

    impl TestState {
        pub fn pawn(x: f32, y: f32, health: u8, ammo: u16, team: u8) -> Self {
            TestState::Pawn(Pawn {
                x,
                y,
                health,
                ammo,
                team,
            })
        }

        pub fn blank_pawn() -> Self {
            TestState::Pawn(Pawn::default())
        }

        pub fn blank_crate() -> Self {
            TestState::Crate(Crate::default())
        }

        pub fn as_pawn(&self) -> &Pawn {
            match self {
                TestState::Pawn(p) => p,
                _ => panic!("not a pawn"),
            }
        }
    }

    impl State for TestState {
        fn type_id(&self) -> u32 {
            match self {
                TestState::Pawn(_) => PAWN,
                TestState::Crate(_) => CRATE,
            }
        }

        fn flag_bits(&self) -> u8 {
            match self {
                TestState::Pawn(_) => 3,
                TestState::Crate(_) => 1,
            }
        }

        fn compare_mutable(&self, basis: &Self) -> FlagSet {
            match (self, basis) {
                (TestState::Pawn(a), TestState::Pawn(b)) => {
                    FlagSet::from_changes([a.x != b.x, a.y != b.y, a.health != b.health])
                }
                (TestState::Crate(a), TestState::Crate(b)) => FlagSet::from_changes([a.open != b.open]),
                _ => FlagSet::all(self.flag_bits()),
            }
        }

        fn is_controller_equal(&self, basis: &Self) -> bool {
            match (self, basis) {
                (TestState::Pawn(a), TestState::Pawn(b)) => a.ammo == b.ammo,
                (TestState::Crate(_), TestState::Crate(_)) => true,
                _ => false,
            }
        }

        fn apply_mutable_from(&mut self, source: &Self, flags: FlagSet) {
            match (self, source) {
                (TestState::Pawn(a), TestState::Pawn(b)) => {
                    if flags.contains(0) {
                        a.x = b.x;
                    }
                    if flags.contains(1) {
                        a.y = b.y;
                    }
                    if flags.contains(2) {
                        a.health = b.health;
                    }
                }
                (TestState::Crate(a), TestState::Crate(b)) => {
                    if flags.contains(0) {
                        a.open = b.open;
                    }
                }
                _ => {}
            }
        }

        fn apply_controller_from(&mut self, source: &Self) {
            if let (TestState::Pawn(a), TestState::Pawn(b)) = (self, source) {
                a.ammo = b.ammo;
            }
        }

        fn apply_immutable_from(&mut self, source: &Self) {
            match (self, source) {
                (TestState::Pawn(a), TestState::Pawn(b)) => a.team = b.team,
                (TestState::Crate(a), TestState::Crate(b)) => a.kind = b.kind,
                _ => {}
            }
        }

        fn encode_mutable(&self, writer: &mut BitWriter, flags: FlagSet) {
            match self {
                TestState::Pawn(p) => {
                    if flags.contains(0) {
                        coordinate().write(writer, p.x);
                    }
                    if flags.contains(1) {
                        coordinate().write(writer, p.y);
                    }
                    if flags.contains(2) {
                        writer.write_u8(p.health);
                    }
                }
                TestState::Crate(c) => {
                    if flags.contains(0) {
                        writer.write_bool(c.open);
                    }
                }
            }
        }

        fn encode_controller(&self, writer: &mut BitWriter) {
            if let TestState::Pawn(p) = self {
                writer.write_u16(p.ammo);
            }
        }

        fn encode_immutable(&self, writer: &mut BitWriter) {
            match self {
                TestState::Pawn(p) => writer.write_u8(p.team),
                TestState::Crate(c) => writer.write_u8(c.kind),
            }
        }

        fn decode_mutable(&mut self, reader: &mut BitReader<'_>, flags: FlagSet) -> Result<()> {
            match self {
                TestState::Pawn(p) => {
                    if flags.contains(0) {
                        p.x = coordinate().read(reader)?;
                    }
                    if flags.contains(1) {
                        p.y = coordinate().read(reader)?;
                    }
                    if flags.contains(2) {
                        p.health = reader.read_u8()?;
                    }
                }
                TestState::Crate(c) => {
                    if flags.contains(0) {
                        c.open = reader.read_bool()?;
                    }
                }
            }
            Ok(())
        }

        fn decode_controller(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
            if let TestState::Pawn(p) = self {
                p.ammo = reader.read_u16()?;
            }
            Ok(())
        }

        fn decode_immutable(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
            match self {
                TestState::Pawn(p) => p.team = reader.read_u8()?,
                TestState::Crate(c) => c.kind = reader.read_u8()?,
            }
            Ok(())
        }

        fn apply_smoothed(&mut self, first: &Self, second: &Self, t: f32) {
            if let (TestState::Pawn(p), TestState::Pawn(a), TestState::Pawn(b)) = (self, first, second) {
                p.x = a.x + (b.x - a.x) * t;
                p.y = a.y + (b.y - a.y) * t;
            }
        }
    }
}
