//! Identity types for entities and controllers

use crate::bits::{BitReader, BitWriter};
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a synchronized entity within a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Sentinel for "no entity"
    pub const INVALID: EntityId = EntityId(0);

    /// Create a new entity ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Check that this is not the sentinel
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// The id following this one, used for monotonic allocation
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn encode(&self, writer: &mut BitWriter) {
        writer.write_varint(self.0);
    }

    /// Read an entity id, rejecting the sentinel
    pub fn decode(reader: &mut BitReader<'_>) -> Result<Self, DecodeError> {
        let id = EntityId(reader.read_varint()?);
        if !id.is_valid() {
            return Err(DecodeError::InvalidEntityId);
        }
        Ok(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Identifier of the controller owned by one connected peer.
///
/// Controller ids are handed out once and never reused, so an entity still
/// pointing at a departed peer's id can never match a newer peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub u32);

impl ControllerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller:{}", self.0)
    }
}
