//! Smoothing primitives for rendering remote entities
//!
//! Snapshots arrive once per send tick; rendering runs faster. These helpers
//! blend between the two newest snapshots. Deciding when to smooth, snap or
//! extrapolate for a given game is left to the caller.

use statecast_core::{apply_smoothed, State, StateRecord, Tick, Timed};

/// Linear interpolation without clamping `t`
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Blends one float channel, snapping across large discontinuities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatSmoother {
    /// Jumps larger than this are not blended
    pub snapping_distance: f32,
    /// Seconds past the newer snapshot the blend may extrapolate
    pub max_extrapolation_time: f32,
}

impl FloatSmoother {
    pub fn new(snapping_distance: f32, max_extrapolation_time: f32) -> Self {
        Self {
            snapping_distance,
            max_extrapolation_time,
        }
    }

    pub fn should_snap(&self, a: f32, b: f32) -> bool {
        (a - b) > self.snapping_distance || (b - a) > self.snapping_distance
    }

    /// Largest blend parameter for snapshots `interval` seconds apart
    pub fn max_t(&self, interval: f32) -> f32 {
        if interval > 0.0 {
            1.0 + self.max_extrapolation_time / interval
        } else {
            1.0
        }
    }

    /// Blend `from` toward `to` at parameter `t`, where the snapshots are
    /// `interval` seconds apart
    pub fn smooth(&self, from: f32, to: f32, t: f32, interval: f32) -> f32 {
        if self.should_snap(from, to) {
            return to;
        }
        lerp(from, to, t.min(self.max_t(interval)))
    }
}

impl Default for FloatSmoother {
    fn default() -> Self {
        Self::new(f32::MAX, f32::MAX)
    }
}

/// Keeps the two newest snapshots of one entity and blends between them
#[derive(Debug, Clone)]
pub struct Interpolator<S> {
    prev: Option<StateRecord<S>>,
    curr: Option<StateRecord<S>>,
}

impl<S: State> Interpolator<S> {
    pub fn new() -> Self {
        Self { prev: None, curr: None }
    }

    /// Push a newer snapshot; older or repeated ticks are ignored
    pub fn push(&mut self, tick: Tick, state: S) {
        if let Some(curr) = &self.curr {
            if curr.tick() >= tick {
                return;
            }
        }
        self.prev = self.curr.take();
        self.curr = Some(StateRecord::new(tick, state));
    }

    /// State at wall-clock `real_time`, blended by [`State::apply_smoothed`]
    pub fn interpolate(&self, real_time: f32, fixed_delta: f32) -> Option<S> {
        match (&self.prev, &self.curr) {
            (Some(prev), Some(curr)) => {
                let mut target = curr.state().clone();
                apply_smoothed(&mut target, prev, curr, real_time, fixed_delta);
                Some(target)
            }
            (None, Some(curr)) => Some(curr.state().clone()),
            (Some(prev), None) => Some(prev.state().clone()),
            (None, None) => None,
        }
    }

    pub fn can_interpolate(&self) -> bool {
        self.prev.is_some() && self.curr.is_some()
    }

    pub fn reset(&mut self) {
        self.prev = None;
        self.curr = None;
    }
}

impl<S: State> Default for Interpolator<S> {
    fn default() -> Self {
        Self::new()
    }
}
