//! Error types for statecast-core

use thiserror::Error;

/// Structural decode failure.
///
/// Any of these means the sender is not speaking the same protocol version (or
/// is hostile); callers should drop the connection rather than try to recover.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Buffer truncated: needed {needed} more bits, {remaining} remaining")]
    Truncated { needed: u32, remaining: u32 },

    #[error("Unknown state type: {0}")]
    UnknownStateType(u32),

    #[error("Invalid entity id in stream")]
    InvalidEntityId,

    #[error("Invalid flag width {0}, at most 32 bits are supported")]
    InvalidFlags(u8),

    #[error("Value {value} out of range [{min}, {max}]")]
    ValueOutOfRange { value: u64, min: u64, max: u64 },

    #[error("Declared {what} count {count} exceeds limit {limit}")]
    CountExceeded {
        what: &'static str,
        count: u32,
        limit: u32,
    },

    #[error("Unexpected trailing data: {0} bits")]
    TrailingData(u32),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DecodeError>;
