//! Settlement debounce
//!
//! A die counts as stopped only after it has stayed below the rest threshold
//! for more than [`SETTLE_DEBOUNCE_CHECKS`] consecutive checks. Once latched
//! it stays stopped for the rest of the throw.

use crate::all_components_below;
use crate::consts::{SETTLE_DEBOUNCE_CHECKS, SETTLE_EPSILON};

use super::world::BodyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettleState {
    #[default]
    Moving,
    /// Below the threshold since the check at this iteration
    Resting { since: u32 },
    /// Latched
    Stopped,
}

impl SettleState {
    /// Feed one settlement check. Returns true once the die is latched.
    pub fn observe(&mut self, iteration: u32, at_rest: bool) -> bool {
        match *self {
            SettleState::Stopped => true,
            _ if !at_rest => {
                *self = SettleState::Moving;
                false
            }
            SettleState::Moving => {
                *self = SettleState::Resting { since: iteration };
                false
            }
            SettleState::Resting { since } => {
                let consecutive = iteration.saturating_sub(since) + 1;
                if consecutive > SETTLE_DEBOUNCE_CHECKS {
                    *self = SettleState::Stopped;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self == SettleState::Stopped
    }
}

/// Every linear and angular velocity component is below the rest threshold
pub fn is_at_rest(state: &BodyState) -> bool {
    all_components_below(state.velocity, SETTLE_EPSILON)
        && all_components_below(state.angular_velocity, SETTLE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_brief_pause_does_not_latch() {
        let mut s = SettleState::default();
        assert!(!s.observe(1, true));
        assert!(!s.observe(2, true));
        assert!(!s.observe(3, false));
        assert_eq!(s, SettleState::Moving);
    }

    #[test]
    fn test_sustained_rest_latches() {
        let mut s = SettleState::default();
        let latched: Vec<bool> = (10..16).map(|i| s.observe(i, true)).collect();
        assert_eq!(latched, [false, false, false, true, true, true]);
        assert!(s.is_stopped());
    }

    #[test]
    fn test_latch_survives_motion() {
        let mut s = SettleState::default();
        for i in 1..=4 {
            s.observe(i, true);
        }
        assert!(s.observe(5, false));
        assert!(s.is_stopped());
    }

    #[test]
    fn test_motion_restarts_the_count() {
        let mut s = SettleState::default();
        s.observe(1, true);
        s.observe(2, true);
        s.observe(3, true);
        s.observe(4, false);
        assert!(!s.observe(5, true));
        assert_eq!(s, SettleState::Resting { since: 5 });
    }

    #[test]
    fn test_is_at_rest_checks_every_component() {
        let mut state = BodyState::default();
        assert!(is_at_rest(&state));
        state.angular_velocity = Vec3::new(0.0, -6.5, 0.0);
        assert!(!is_at_rest(&state));
        state.angular_velocity = Vec3::ZERO;
        state.velocity = Vec3::new(5.9, -5.9, 5.9);
        assert!(is_at_rest(&state));
    }
}
