//! Launch vectors
//!
//! Turns a throw (direction plus boost) into the starting position, velocity,
//! spin and orientation of every die. All randomness comes from the caller's
//! RNG, so a seeded box throws the same way every time.

use glam::{Quat, Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{
    LAUNCH_DROP_SPEED, LAUNCH_HEIGHT_BAND, LAUNCH_HEIGHT_MIN, LAUNCH_MARGIN, LAUNCH_SPIN,
    LAUNCH_SPREAD, SWIPE_BOOST_WINDOW_MS, SWIPE_MAX_DURATION_MS, SWIPE_MIN_AREA_FRACTION,
};
use crate::dice::DiceType;
use crate::rotate_vec2;

/// Starting state of one thrown die
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchVector {
    pub dice_type: DiceType,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Rotation axis of the starting orientation (not necessarily unit length)
    pub axis: Vec3,
    pub angle: f32,
}

impl LaunchVector {
    pub fn orientation(&self) -> Quat {
        Quat::from_axis_angle(self.axis.normalize_or(Vec3::Z), self.angle)
    }
}

/// Unit throw direction and speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throw {
    pub direction: Vec2,
    pub boost: f32,
}

/// A pointer drag across the surface, in surface pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swipe {
    pub start: Vec2,
    pub end: Vec2,
    pub duration_ms: f32,
}

/// Rotate `direction` by a random angle within the launch spread. Zero
/// components are nudged so later divisions stay finite.
fn perturb<R: Rng + ?Sized>(direction: Vec2, rng: &mut R) -> Vec2 {
    let angle = rng.random::<f32>() * 2.0 * LAUNCH_SPREAD - LAUNCH_SPREAD;
    let mut v = rotate_vec2(direction, angle);
    if v.x == 0.0 {
        v.x = 0.01;
    }
    if v.y == 0.0 {
        v.y = 0.01;
    }
    v
}

/// Launch vectors for `dice`, thrown along `direction` with speed `boost`
/// onto a surface with the given half extents.
///
/// Dice start near the corner opposite the throw direction, between
/// [`LAUNCH_HEIGHT_MIN`] and `LAUNCH_HEIGHT_MIN + LAUNCH_HEIGHT_BAND` above
/// the desk.
pub fn generate<R: Rng + ?Sized>(
    dice: &[DiceType],
    direction: Vec2,
    boost: f32,
    half_width: f32,
    half_height: f32,
    rng: &mut R,
) -> Vec<LaunchVector> {
    dice.iter()
        .map(|&dice_type| {
            let vec = perturb(direction, rng);

            let mut position = Vec3::new(
                half_width * if vec.x > 0.0 { -1.0 } else { 1.0 } * LAUNCH_MARGIN,
                half_height * if vec.y > 0.0 { -1.0 } else { 1.0 } * LAUNCH_MARGIN,
                rng.random::<f32>() * LAUNCH_HEIGHT_BAND + LAUNCH_HEIGHT_MIN,
            );
            let projector = (vec.x / vec.y).abs();
            if projector > 1.0 {
                position.y /= projector;
            } else {
                position.x *= projector;
            }

            let heading = perturb(direction, rng);
            let velocity = Vec3::new(heading.x * boost, heading.y * boost, -LAUNCH_DROP_SPEED);

            let inertia = dice_type.inertia();
            let angular_velocity = Vec3::new(
                -(rng.random::<f32>() * vec.y * LAUNCH_SPIN + inertia * vec.y),
                rng.random::<f32>() * vec.x * LAUNCH_SPIN + inertia * vec.x,
                0.0,
            );

            let axis = Vec3::new(rng.random(), rng.random(), rng.random());
            let angle = rng.random::<f32>() * std::f32::consts::TAU;

            LaunchVector {
                dice_type,
                position,
                velocity,
                angular_velocity,
                axis,
                angle,
            }
        })
        .collect()
}

/// A throw in a random direction with a random strength
pub fn random_throw<R: Rng + ?Sized>(half_width: f32, half_height: f32, rng: &mut R) -> Throw {
    let raw = Vec2::new(
        (rng.random::<f32>() * 2.0 - 1.0) * half_width,
        -(rng.random::<f32>() * 2.0 - 1.0) * half_height,
    );
    let dist = raw.length();
    let boost = (rng.random::<f32>() + 3.0) * dist;
    Throw {
        direction: raw.normalize_or(Vec2::X),
        boost,
    }
}

/// The throw a swipe describes, or `None` if it was too short to count
pub fn swipe_throw(swipe: &Swipe, half_width: f32, half_height: f32) -> Option<Throw> {
    let raw = Vec2::new(swipe.end.x - swipe.start.x, -(swipe.end.y - swipe.start.y));
    let dist = raw.length();
    let min_dist = (half_width * half_height * SWIPE_MIN_AREA_FRACTION).sqrt();
    if dist <= min_dist {
        log::debug!("Swipe of {dist:.1}px ignored (minimum {min_dist:.1}px)");
        return None;
    }

    let t = swipe.duration_ms.clamp(0.0, SWIPE_MAX_DURATION_MS);
    let boost = ((SWIPE_BOOST_WINDOW_MS - t) / SWIPE_BOOST_WINDOW_MS).sqrt() * dist * 2.0;
    Some(Throw {
        direction: raw.normalize_or(Vec2::X),
        boost,
    })
}
