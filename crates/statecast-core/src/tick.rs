//! Time system for tick-based synchronization
//!
//! Provides discrete time management for the protocol:
//! - `Tick` - Logical time unit with an `INVALID` sentinel
//! - `Timed` - Anything stamped with a tick (commands, records)

use crate::bits::{BitReader, BitWriter};
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A discrete simulation step.
///
/// Raw value `0` is reserved as [`Tick::INVALID`]; the first simulated tick is
/// [`Tick::START`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(u32);

impl Tick {
    /// Sentinel for "no tick"
    pub const INVALID: Tick = Tick(0);
    /// First valid tick of a simulation
    pub const START: Tick = Tick(1);

    /// Create a tick from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Create a tick from a signed counter; anything `<= 0` is invalid
    pub fn from_signed(value: i64) -> Self {
        if value <= 0 {
            Tick::INVALID
        } else {
            Tick(value.min(u32::MAX as i64) as u32)
        }
    }

    /// Get the raw tick value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Check if this is a real tick rather than the sentinel
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// The tick after this one
    pub fn next(&self) -> Self {
        Tick(self.0.saturating_add(1))
    }

    /// Step back `ticks`, bottoming out at [`Tick::INVALID`]
    pub fn saturating_sub(&self, ticks: u32) -> Self {
        Tick(self.0.saturating_sub(ticks))
    }

    /// Signed distance `self - other`
    pub fn diff(&self, other: Tick) -> i64 {
        self.0 as i64 - other.0 as i64
    }

    /// Whether packets go out on this tick.
    ///
    /// A `send_rate` of `n` means every `n`th tick is a send tick.
    pub fn is_send_tick(&self, send_rate: u32) -> bool {
        debug_assert!(send_rate > 0, "send rate must be positive");
        self.is_valid() && self.0 % send_rate.max(1) == 0
    }

    /// Convert to seconds of simulation time given the fixed step length
    pub fn time(&self, fixed_delta: f32) -> f32 {
        self.0 as f32 * fixed_delta
    }

    /// Write as a variable-length unsigned integer
    pub fn encode(&self, writer: &mut BitWriter) {
        writer.write_varint(self.0);
    }

    /// Read a tick written by [`Tick::encode`]
    pub fn decode(reader: &mut BitReader<'_>) -> Result<Self, DecodeError> {
        reader.read_varint().map(Tick)
    }
}

impl Default for Tick {
    fn default() -> Self {
        Tick::INVALID
    }
}

impl Add<u32> for Tick {
    type Output = Tick;

    fn add(self, rhs: u32) -> Tick {
        Tick(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "tick:{}", self.0)
        } else {
            write!(f, "tick:invalid")
        }
    }
}

/// A value stamped with the tick it belongs to
pub trait Timed {
    /// The tick this value is valid for
    fn tick(&self) -> Tick;
}
