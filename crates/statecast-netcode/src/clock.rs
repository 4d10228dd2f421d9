//! Remote clock estimation
//!
//! The remote peer announces its tick in every packet, but packets arrive
//! sparsely and with jitter. [`ClockEstimator`] turns those announcements into
//! an estimate of the remote tick that advances once per local tick and stays
//! a few ticks behind the newest announcement, so buffered remote data is
//! already there when the estimate reaches it.
//!
//! ```text
//!   estimated        desired window         latest
//!  ─────┼────────[delay_min ... delay_max]────┼──▶ remote ticks
//!       │◀──────────── delta ────────────────▶│
//! ```
//!
//! Each local tick the estimate moves by one. When a new announcement is
//! pending the distance is corrected: far outside the window it snaps to the
//! middle, slightly too far behind it skips a tick, slightly too close it
//! stalls a tick.

use log::debug;
use serde::{Deserialize, Serialize};
use statecast_core::Tick;

/// Delay window settings for a [`ClockEstimator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fewest ticks the estimate may trail the latest announcement
    pub delay_min: u32,
    /// Most ticks the estimate may trail the latest announcement
    pub delay_max: u32,
    /// How many local ticks pass between remote announcements
    pub remote_rate: u32,
}

impl ClockConfig {
    pub const DEFAULT_DELAY_MIN: u32 = 2;
    pub const DEFAULT_DELAY_MAX: u32 = 8;
    pub const DEFAULT_REMOTE_RATE: u32 = 2;

    /// Default delays for a remote that sends every `remote_rate` ticks
    pub fn with_remote_rate(remote_rate: u32) -> Self {
        Self {
            remote_rate,
            ..Self::default()
        }
    }

    /// Middle of the delay window, the target of a snap
    pub fn delay_desired(&self) -> u32 {
        (self.delay_max.saturating_sub(self.delay_min)) / 2 + self.delay_min
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            delay_min: Self::DEFAULT_DELAY_MIN,
            delay_max: Self::DEFAULT_DELAY_MAX,
            remote_rate: Self::DEFAULT_REMOTE_RATE,
        }
    }
}

/// Tracks a remote peer's tick from its announcements
#[derive(Debug, Clone)]
pub struct ClockEstimator {
    delay_min: i64,
    delay_max: i64,
    delay_desired: i64,
    remote_rate: i64,

    /// Counters are signed so corrections may dip below the first tick
    latest: i64,
    estimated: i64,

    update_pending: bool,
    should_tick: bool,
}

impl ClockEstimator {
    pub fn new(config: ClockConfig) -> Self {
        debug_assert!(config.delay_min <= config.delay_max, "inverted clock delay window");
        Self {
            delay_min: config.delay_min as i64,
            delay_max: config.delay_max as i64,
            delay_desired: config.delay_desired() as i64,
            remote_rate: config.remote_rate as i64,
            latest: 0,
            estimated: 0,
            update_pending: false,
            should_tick: false,
        }
    }

    /// Record a remote tick announcement; older or repeated ticks are ignored
    pub fn update_latest(&mut self, tick: Tick) {
        let tick = tick.raw() as i64;
        if tick > self.latest {
            self.latest = tick;
            self.update_pending = true;
            self.should_tick = true;
        }
    }

    /// Step the estimate for one local tick.
    ///
    /// Returns how many remote ticks the caller should process: 1 normally,
    /// 2 when catching up, 0 when stalling, snapping, or before any
    /// announcement arrived.
    pub fn advance(&mut self) -> u32 {
        if !self.should_tick {
            return 0;
        }

        self.estimated += 1;
        if !self.update_pending {
            return 1;
        }

        let delta = self.latest - self.estimated;
        if self.should_snap(delta) {
            debug!(
                "clock snap: latest {} estimated {} -> {}",
                self.latest,
                self.estimated,
                self.latest - self.delay_desired
            );
            self.estimated = self.latest - self.delay_desired;
            return 0;
        }
        if delta > self.delay_max {
            self.estimated += 1;
            return 2;
        }
        if delta < self.delay_min {
            self.estimated -= 1;
            return 0;
        }

        self.update_pending = false;
        1
    }

    fn should_snap(&self, delta: i64) -> bool {
        delta < self.delay_min - self.remote_rate || delta > self.delay_max + self.remote_rate
    }

    /// Current estimate of the remote tick
    pub fn estimated_remote(&self) -> Tick {
        Tick::from_signed(self.estimated)
    }

    /// Newest announced remote tick
    pub fn latest_remote(&self) -> Tick {
        Tick::from_signed(self.latest)
    }

    /// Whether any announcement has arrived yet
    pub fn should_tick(&self) -> bool {
        self.should_tick
    }
}

impl Default for ClockEstimator {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}
