//! Error types for statecast-server

use statecast_core::{ControllerId, DecodeError, EntityId};
use thiserror::Error;

/// Result type for statecast-server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in statecast-server
#[derive(Debug, Error)]
pub enum Error {
    /// No connected peer has this key
    #[error("unknown peer {0}")]
    UnknownPeer(String),

    /// A peer with this key is already connected
    #[error("peer {0} is already connected")]
    DuplicatePeer(String),

    /// No live entity has this id
    #[error("{0} not found")]
    EntityNotFound(EntityId),

    /// A peer sent bytes that do not decode; the host should disconnect it
    #[error("malformed packet from {peer}: {source}")]
    Decode {
        peer: ControllerId,
        #[source]
        source: DecodeError,
    },

    /// Netcode error
    #[error("netcode error: {0}")]
    Netcode(#[from] statecast_netcode::Error),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid RON
    #[error("RON parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Config parsed but its values are unusable
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn unknown_peer(key: &impl std::fmt::Debug) -> Self {
        Error::UnknownPeer(format!("{:?}", key))
    }

    pub(crate) fn duplicate_peer(key: &impl std::fmt::Debug) -> Self {
        Error::DuplicatePeer(format!("{:?}", key))
    }

    /// The misbehaving peer, for errors a host should disconnect on
    pub fn offending_peer(&self) -> Option<ControllerId> {
        match self {
            Error::Decode { peer, .. } => Some(*peer),
            _ => None,
        }
    }
}

// Compile-time check that Error is Send + Sync for thread-safe error propagation.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
