//! Statecast Netcode - Network synchronization plumbing
//!
//! This crate provides the pieces that sit between the state model and the
//! wire:
//!
//! - **Clock estimation**: track a remote peer's tick from sparse, jittery
//!   announcements
//! - **Packets**: bit-exact client and server packet codecs with decode limits
//! - **Views**: per-entity acknowledgement of received server ticks
//! - **Transport**: the datagram-sending seam a host implements
//! - **Smoothing**: interpolation primitives for rendering snapshots
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────── Client ────────────────┐        ┌──────── Server ────────┐
//! │ commands + View ──▶ ClientPacket ──────┼───────▶│ ClockEstimator         │
//! │                                        │        │ command dejitter       │
//! │ Interpolator ◀── deltas ◀ ServerPacket ◀───────┤ deltas + removals      │
//! └────────────────────────────────────────┘        └────────────────────────┘
//! ```

pub mod clock;
mod error;
pub mod packet;
pub mod smoothing;
mod transport;
mod view;

#[cfg(test)]
mod test_support;

pub use clock::{ClockConfig, ClockEstimator};
pub use error::{Error, Result};
pub use packet::{ClientPacket, CommandUpdate, PacketLimits, RemovalNotice, ServerPacket};
pub use smoothing::{lerp, FloatSmoother, Interpolator};
pub use transport::{RecordingTransport, Transport};
pub use view::View;
