//! Server Configuration - Rates, buffer sizes and packet limits
//!
//! Every field has a default, so a RON file only needs the values it changes:
//!
//! ```
//! use statecast_server::ServerConfig;
//!
//! let config = ServerConfig::from_ron_str("(server_send_rate: 3)").unwrap();
//! assert_eq!(config.server_send_rate, 3);
//! assert_eq!(config.client_send_rate, 2);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use statecast_netcode::{ClockConfig, PacketLimits};
use std::fs;
use std::path::Path;

/// Configuration for a [`Server`](crate::Server)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// The server sends on every `server_send_rate`th tick
    pub server_send_rate: u32,
    /// Ticks between client packets; drives each peer's clock window
    pub client_send_rate: u32,
    /// Fewest ticks a peer's command clock trails the newest client tick
    pub clock_delay_min: u32,
    /// Most ticks a peer's command clock trails the newest client tick
    pub clock_delay_max: u32,
    /// Slots in each peer's command dejitter buffer
    pub command_buffer_length: usize,
    /// Slots in each entity's record history; a slot spans one send interval
    pub record_buffer_length: usize,
    /// Ticks an entity must wait before being resent to the same peer.
    /// Controlled and never-sent entities are exempt.
    pub min_resend_interval: u32,
    /// Ticks a removal notice is kept for peers that have not acknowledged it
    pub removal_retention: u32,
    pub packet_limits: PacketLimits,
}

impl ServerConfig {
    /// Parse a RON document and validate it
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: ServerConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON file and validate it
    pub fn from_ron_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("tick_rate", self.tick_rate as usize),
            ("server_send_rate", self.server_send_rate as usize),
            ("client_send_rate", self.client_send_rate as usize),
            ("command_buffer_length", self.command_buffer_length),
            ("record_buffer_length", self.record_buffer_length),
            ("packet_limits.max_packet_bytes", self.packet_limits.max_packet_bytes),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(Error::InvalidConfig(format!("{} must be greater than 0", name)));
        }
        if self.clock_delay_min > self.clock_delay_max {
            return Err(Error::InvalidConfig(format!(
                "clock_delay_min ({}) exceeds clock_delay_max ({})",
                self.clock_delay_min, self.clock_delay_max
            )));
        }
        Ok(())
    }

    /// Seconds per tick
    pub fn fixed_delta(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Clock settings for estimating a client's tick
    pub fn client_clock(&self) -> ClockConfig {
        ClockConfig {
            delay_min: self.clock_delay_min,
            delay_max: self.clock_delay_max,
            remote_rate: self.client_send_rate,
        }
    }

    /// Export to pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 50,
            server_send_rate: 2,
            client_send_rate: 2,
            clock_delay_min: ClockConfig::DEFAULT_DELAY_MIN,
            clock_delay_max: ClockConfig::DEFAULT_DELAY_MAX,
            command_buffer_length: 50,
            record_buffer_length: 50,
            min_resend_interval: 0,
            removal_retention: 300,
            packet_limits: PacketLimits::default(),
        }
    }
}
