//! Dice Box - polyhedral dice with physics throws and forced results
//!
//! Core modules:
//! - `notation`: Dice notation parsing and result formatting
//! - `launch`: Initial kinematic state for each thrown die
//! - `sim`: Deterministic physics world, settling and the simulation driver
//! - `faces`: Reading the face that ended up on top, and relabeling faces
//! - `roller`: The dice box that sequences a whole throw
//! - `settings`: Explicit configuration threaded through all of the above

pub mod dice;
pub mod faces;
pub mod geometry;
pub mod launch;
pub mod notation;
pub mod roller;
pub mod scene;
pub mod settings;
pub mod sim;

pub use dice::DiceType;
pub use notation::{NotationError, RollOutcome, RollRequest};
pub use launch::Swipe;
pub use roller::{DiceBox, FnHooks, FrameStatus, NoHooks, RollHooks, RollPhase};
pub use settings::Settings;

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Nominal simulation timestep (60 Hz)
    pub const FRAME_RATE: f32 = 1.0 / 60.0;

    /// A die is at rest once every velocity component is below this
    pub const SETTLE_EPSILON: f32 = 6.0;
    /// A die latches after more than this many consecutive at-rest checks
    pub const SETTLE_DEBOUNCE_CHECKS: u32 = 3;
    /// Simulated seconds before a throw is declared finished regardless
    pub const MAX_THROW_SECONDS: f32 = 10.0;

    /// Frame gaps longer than this are treated as a single nominal frame
    pub const FRAME_OUTLIER_SECONDS: f32 = 3.0;
    /// Adaptive stepping keeps sub-stepping while the remainder exceeds frame * slack
    pub const ADAPTIVE_STEP_SLACK: f32 = 1.1;

    /// Half-width of the random arc applied to the throw direction (±18°)
    pub const LAUNCH_SPREAD: f32 = std::f32::consts::PI / 10.0;
    /// Start position as a fraction of the surface half extents
    pub const LAUNCH_MARGIN: f32 = 0.9;
    /// Start height band above the desk
    pub const LAUNCH_HEIGHT_MIN: f32 = 200.0;
    pub const LAUNCH_HEIGHT_BAND: f32 = 200.0;
    /// Fixed downward launch speed
    pub const LAUNCH_DROP_SPEED: f32 = 10.0;
    /// Random spin scale added on top of the per-type inertia
    pub const LAUNCH_SPIN: f32 = 5.0;

    /// Minimum swipe length as a fraction of the surface area (sqrt(w*h*k))
    pub const SWIPE_MIN_AREA_FRACTION: f32 = 0.01;
    /// Swipes longer than this (ms) are clamped
    pub const SWIPE_MAX_DURATION_MS: f32 = 2000.0;
    pub const SWIPE_BOOST_WINDOW_MS: f32 = 2500.0;

    /// Terms asking for more dice than this are rejected by the parser
    pub const MAX_TERM_COUNT: u32 = 1000;
}

/// Rotate a 2D vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate_vec2(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Component-wise "is this vector small" test used by settling
#[inline]
pub fn all_components_below(v: glam::Vec3, limit: f32) -> bool {
    v.x.abs() < limit && v.y.abs() < limit && v.z.abs() < limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_vec2_quarter_turn() {
        let v = rotate_vec2(Vec2::X, FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_components_below() {
        assert!(all_components_below(glam::Vec3::new(5.9, -5.9, 0.0), 6.0));
        assert!(!all_components_below(glam::Vec3::new(0.0, 0.0, -6.0), 6.0));
    }
}
