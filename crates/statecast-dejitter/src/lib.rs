//! Statecast Dejitter - Tick-indexed ring buffer for jittery arrivals
//!
//! Values stamped with a [`Tick`] arrive late, early, duplicated or out of
//! order. A [`DejitterBuffer`] keeps the recent ones and answers "what was the
//! latest value as of tick T".
//!
//! # Features
//!
//! - **Bounded memory**: fixed slot count, entries older than the retention
//!   window are evicted
//! - **O(1) insertion**: a tick maps straight to its slot
//! - **Order tolerant**: out-of-order stores never make a newer query see an
//!   older value
//!
//! # Example
//!
//! ```rust
//! use statecast_core::{Tick, Timed};
//! use statecast_dejitter::DejitterBuffer;
//!
//! #[derive(Debug, Clone)]
//! struct Input(Tick);
//!
//! impl Timed for Input {
//!     fn tick(&self) -> Tick {
//!         self.0
//!     }
//! }
//!
//! let mut buffer = DejitterBuffer::new(32);
//! buffer.store(Input(Tick::new(11)));
//! buffer.store(Input(Tick::new(10)));
//!
//! assert_eq!(buffer.latest_at(Tick::new(10)).map(|i| i.tick()), Some(Tick::new(10)));
//! assert_eq!(buffer.latest_at(Tick::new(12)).map(|i| i.tick()), Some(Tick::new(11)));
//! ```

use statecast_core::{Tick, Timed};

/// A ring buffer of tick-stamped values
///
/// Slot of a tick is `(tick / divisor) % capacity`, so the buffer covers
/// `capacity * divisor` ticks. Use a divisor equal to the send rate when values
/// only ever land on send ticks.
#[derive(Debug, Clone)]
pub struct DejitterBuffer<T> {
    slots: Vec<Option<T>>,
    capacity: usize,
    divisor: u32,
    /// Newest tick ever accepted
    newest: Tick,
}

impl<T: Timed> DejitterBuffer<T> {
    /// Create a buffer with one slot per tick
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_divisor(capacity, 1)
    }

    /// Create a buffer where each slot spans `divisor` ticks
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `divisor` is zero.
    pub fn with_divisor(capacity: usize, divisor: u32) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        assert!(divisor > 0, "Divisor must be greater than 0");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
            divisor,
            newest: Tick::INVALID,
        }
    }

    fn tick_to_index(&self, tick: Tick) -> usize {
        (tick.raw() / self.divisor) as usize % self.capacity
    }

    /// Number of ticks behind the newest entry that are still kept
    pub fn retention(&self) -> u64 {
        self.capacity as u64 * self.divisor as u64
    }

    fn is_expired(&self, tick: Tick) -> bool {
        self.newest.is_valid() && self.newest.diff(tick) >= self.retention() as i64
    }

    /// Store a value, returning whether it was accepted
    ///
    /// Rejected: invalid ticks, ticks outside the retention window, and ticks
    /// whose slot already holds a newer tick. A value for an already stored
    /// tick replaces it.
    pub fn store(&mut self, value: T) -> bool {
        let tick = value.tick();
        if !tick.is_valid() || self.is_expired(tick) {
            return false;
        }

        let index = self.tick_to_index(tick);
        if let Some(existing) = &self.slots[index] {
            if existing.tick() > tick {
                return false;
            }
        }
        self.slots[index] = Some(value);

        if tick > self.newest {
            self.newest = tick;
            self.evict_expired();
        }
        true
    }

    fn evict_expired(&mut self) {
        let newest = self.newest;
        let retention = self.retention() as i64;
        for slot in &mut self.slots {
            if let Some(value) = slot {
                if newest.diff(value.tick()) >= retention {
                    *slot = None;
                }
            }
        }
    }

    /// The value with the greatest tick `<= tick`
    pub fn latest_at(&self, tick: Tick) -> Option<&T> {
        if !tick.is_valid() {
            return None;
        }
        self.entries()
            .filter(|value| value.tick() <= tick)
            .max_by_key(|value| value.tick())
    }

    /// The value with the greatest tick overall
    pub fn latest(&self) -> Option<&T> {
        self.entries().max_by_key(|value| value.tick())
    }

    /// The value stored for exactly `tick`
    pub fn get(&self, tick: Tick) -> Option<&T> {
        if !tick.is_valid() {
            return None;
        }
        self.slots[self.tick_to_index(tick)]
            .as_ref()
            .filter(|value| value.tick() == tick)
    }

    /// The value at or before `tick` and the first value after it
    ///
    /// Used for smoothing between two snapshots.
    pub fn latest_and_next(&self, tick: Tick) -> (Option<&T>, Option<&T>) {
        let next = self
            .entries()
            .filter(|value| value.tick() > tick)
            .min_by_key(|value| value.tick());
        (self.latest_at(tick), next)
    }

    /// All values, oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let mut values: Vec<_> = self.entries().collect();
        values.sort_by_key(|value| value.tick());
        values.into_iter()
    }

    fn entries(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    /// Drop every value and forget the newest tick
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.newest = Tick::INVALID;
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest and newest stored ticks
    pub fn tick_range(&self) -> Option<(Tick, Tick)> {
        let oldest = self.entries().map(Timed::tick).min()?;
        let newest = self.entries().map(Timed::tick).max()?;
        Some((oldest, newest))
    }
}

impl<T: Timed> Default for DejitterBuffer<T> {
    fn default() -> Self {
        Self::new(64)
    }
}
