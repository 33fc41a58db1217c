//! Volatile per-node state.

use crate::direction::Direction;

/// Direction bookkeeping of one node. Rebuilt at startup; never persisted.
///
/// Only the dispatch state machines mutate this, and only for authenticated,
/// decoded frames (phaser) or completed exchanges (controller).
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct NodeState {
    /// Where the antenna points. On the controller this is whatever the phaser
    /// last reported, never what was requested.
    pub current_direction: Direction,
    /// Staged direction awaiting a move command. Phaser only.
    pub target_direction: Direction,
    /// Frames handled, wrapping.
    pub packet_count: u16,
}

impl NodeState {
    /// Startup state: both directions north, no packets.
    pub const fn new() -> Self {
        Self {
            current_direction: Direction::N,
            target_direction: Direction::N,
            packet_count: 0,
        }
    }

    /// Counts one more frame, wrapping at `u16::MAX`.
    pub fn bump_packet_count(&mut self) -> u16 {
        self.packet_count = self.packet_count.wrapping_add(1);
        self.packet_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_count_wraps() {
        let mut state = NodeState {
            packet_count: u16::MAX,
            ..NodeState::new()
        };
        assert_eq!(state.bump_packet_count(), 0);
        assert_eq!(state.bump_packet_count(), 1);
    }

    #[test]
    fn test_startup_points_north() {
        assert_eq!(NodeState::new(), NodeState::default());
        assert_eq!(NodeState::new().current_direction, Direction::N);
    }
}
