//! Error types for statecast-netcode

use statecast_core::DecodeError;
use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Packet bytes did not decode
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Transport refused to send
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
