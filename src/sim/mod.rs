//! Deterministic simulation module
//!
//! Everything that decides where dice end up lives here. It must stay
//! deterministic:
//! - Fixed timestep for anything that decides a result
//! - Randomness only through the launch vectors
//! - Stable iteration order (insertion order of bodies)
//! - No rendering or platform dependencies

pub mod contact;
pub mod dice_world;
pub mod driver;
pub mod settle;
pub mod world;

pub use contact::{ContactMaterial, Plane};
pub use dice_world::{DiceWorld, RigidBody};
pub use driver::{DieInstance, SimulationDriver};
pub use settle::{SettleState, is_at_rest};
pub use world::{BodyDesc, BodyHandle, BodyState, PhysicsWorld};
