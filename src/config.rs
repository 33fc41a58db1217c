//! Build-time configuration of a node.
//!
//! The defaults reproduce the deployed pair (controller `211`, phaser `212`,
//! shared key, one second reply timeout). Firmware that needs different values
//! builds a config with struct update syntax:
//!
//! ```rust
//! use phaser_link::config::{LinkConfig, PhaserConfig};
//! use phaser_link::direction::AntennaKind;
//!
//! let config = PhaserConfig {
//!     antenna: AntennaKind::Comtek,
//!     ..PhaserConfig::default()
//! };
//! assert_eq!(config.link.peer_address, 211);
//!
//! let controller = LinkConfig {
//!     reply_timeout_ms: 2_000,
//!     ..LinkConfig::controller()
//! };
//! assert_eq!(controller.peer_address, 212);
//! ```

use crate::consts::{
    Address, CONTROLLER_ADDRESS, DEFAULT_AUTH_KEY, PHASER_ADDRESS, POLL_INTERVAL_MS,
    REFLECTED_POWER_CONVERSION_FACTOR, REPLY_TIMEOUT_MS,
};
use crate::direction::AntennaKind;

/// Addressing and timing shared by both node roles.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct LinkConfig {
    /// This node's address.
    pub this_address: Address,
    /// The only address this node talks to.
    pub peer_address: Address,
    /// Shared authentication key.
    pub auth_key: &'static [u8],
    /// How long the controller waits for a reply, in milliseconds.
    pub reply_timeout_ms: u32,
    /// Idle delay between polls of a service loop, in milliseconds.
    pub poll_interval_ms: u32,
}

impl LinkConfig {
    /// Defaults for the controller.
    pub const fn controller() -> Self {
        Self {
            this_address: CONTROLLER_ADDRESS,
            peer_address: PHASER_ADDRESS,
            auth_key: DEFAULT_AUTH_KEY,
            reply_timeout_ms: REPLY_TIMEOUT_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }

    /// Defaults for the phaser.
    pub const fn phaser() -> Self {
        Self {
            this_address: PHASER_ADDRESS,
            peer_address: CONTROLLER_ADDRESS,
            ..Self::controller()
        }
    }
}

/// Phaser-only settings on top of the link.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct PhaserConfig {
    /// Link settings.
    pub link: LinkConfig,
    /// Switch box driven by the relays.
    pub antenna: AntennaKind,
    /// Reflected power ADC count to coupler volts.
    pub conversion_factor: f32,
}

impl Default for PhaserConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::phaser(),
            antenna: AntennaKind::RemoteQth,
            conversion_factor: REFLECTED_POWER_CONVERSION_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_mirror_each_other() {
        let c = LinkConfig::controller();
        let p = LinkConfig::phaser();
        assert_eq!(c.this_address, p.peer_address);
        assert_eq!(c.peer_address, p.this_address);
        assert_eq!(c.auth_key, p.auth_key);
    }

    #[test]
    fn test_phaser_defaults() {
        let config = PhaserConfig::default();
        assert_eq!(config.link.this_address, PHASER_ADDRESS);
        assert_eq!(config.antenna, AntennaKind::RemoteQth);
        assert_eq!(config.conversion_factor, REFLECTED_POWER_CONVERSION_FACTOR);
    }
}
