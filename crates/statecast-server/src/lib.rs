//! Statecast Server - Authoritative state broadcast
//!
//! This crate runs the server half of statecast: a fixed-tick room of
//! entities, one session per connected client, and the per-client packets
//! that carry delta-compressed entity state out and timed commands back in.
//!
//! ## Architecture
//!
//! ```text
//! Server
//!  │
//!  ├── Room ← Simulation::server_update mutates this once per tick
//!  │    └── Entity[] ← state, controller, record history, queued commands
//!  │
//!  └── ServerPeer[] ← one per client key
//!       ├── ClockEstimator + command dejitter buffer
//!       ├── acked View
//!       └── Scope ← relevance and resend order
//! ```
//!
//! ## Key Components
//!
//! - [`Server`]: tick loop, peer roster, control assignment and routing
//! - [`Room`]: entities, tick and the controller roster
//! - [`ServerPeer`]: per-client session and packet builder
//! - [`Scope`]: per-client relevance and least-recently-sent ordering
//! - [`ServerConfig`]: RON-loadable tuning
//!
//! ## Control
//!
//! Commands reach an entity only while the sending peer controls it and the
//! entity is not being removed. The check runs on every packet, so a
//! reassignment takes effect at once.

mod config;
mod entity;
mod error;
mod peer;
mod room;
mod scope;
mod server;

#[cfg(test)]
mod test_support;

pub use config::ServerConfig;
pub use entity::Entity;
pub use error::{Error, Result};
pub use peer::ServerPeer;
pub use room::{Room, Simulation};
pub use scope::{AlwaysRelevant, Scope, ScopeEvaluator};
pub use server::Server;
