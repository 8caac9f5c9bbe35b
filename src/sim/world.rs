//! Physics world seam
//!
//! The driver only talks to physics through [`PhysicsWorld`], so any rigid
//! body engine that can add/remove bodies, step, and report poses can stand
//! in for the built-in [`DiceWorld`](super::DiceWorld).

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque id of a body inside a physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Pose and velocities of one body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }
}

/// Everything a world needs to create a die body
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub mass: f32,
    /// Bounding radius of the hull
    pub radius: f32,
    /// Convex hull vertices in body space
    pub hull: Vec<Vec3>,
    pub state: BodyState,
}

/// A steppable rigid body world
pub trait PhysicsWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Returns false if the handle was unknown
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    /// Returns false if the handle was unknown
    fn set_body_state(&mut self, handle: BodyHandle, state: BodyState) -> bool;

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Advance the world by `dt` seconds, exactly once
    fn step(&mut self, dt: f32);

    /// Resize the walled play surface (half extents, centered on the origin)
    fn set_surface(&mut self, half_width: f32, half_height: f32);

    fn body_count(&self) -> usize;
}
