//! Statecast Core - Shared types for state synchronization
//!
//! This crate provides the pieces every other statecast crate builds on:
//! - `Tick` time with an invalid sentinel and send-rate cadence
//! - Entity and controller identifiers
//! - A bit-level codec with range compressors
//! - The partitioned `State` capability trait, dirty-flag `FlagSet`s,
//!   `StateDelta`/`StateRecord` and their exact binary encoding
//! - `Registry`, the explicit factory context used when decoding
//! - Peer `Command`s stamped with ticks
//!
//! ## State partitions
//!
//! ```text
//! ┌──────────── State ────────────┐
//! │ mutable     diffed per field  │──▶ every peer in scope, when changed
//! │ controller  compared as block │──▶ controlling peer only
//! │ immutable   written at spawn  │──▶ until the peer acknowledges the entity
//! └───────────────────────────────┘
//! ```

mod bits;
mod command;
mod compressor;
pub mod delta;
mod error;
mod flags;
mod identity;
mod registry;
pub mod state;
pub mod tick;

pub use bits::{BitReader, BitWriter};
pub use command::{Command, TimedCommand};
pub use compressor::{FloatCompressor, IntCompressor};
pub use delta::{apply_delta, create_delta, StateDelta};
pub use error::{DecodeError, Result};
pub use flags::{FlagSet, MAX_FLAG_BITS};
pub use identity::{ControllerId, EntityId};
pub use registry::{Registry, StateFactory};
pub use state::{apply_smoothed, compute_interp, create_record, State, StateRecord};
pub use tick::{Tick, Timed};
