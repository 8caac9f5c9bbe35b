//! Contact detection and response for convex dice
//!
//! Dice touch the desk and barriers through their hull vertices and touch
//! each other through bounding spheres. Vertex contacts are gathered once per
//! step and then solved over several passes with accumulated impulses: the
//! normal impulse never goes negative and friction is clamped against it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::dice_world::RigidBody;

/// Vertices closer than this to a plane count as touching it
pub const CONTACT_SLOP: f32 = 0.5;

/// An infinite plane; points with `normal · p >= offset` are on the open side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self {
            normal: normal.normalize(),
            offset,
        }
    }

    /// Positive on the open side, negative when penetrating
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }
}

/// Surface response between a die and something it hits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl ContactMaterial {
    pub const fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
        }
    }
}

#[inline]
fn effective_mass(body: &RigidBody, r: Vec3, dir: Vec3) -> f32 {
    let k = body.inv_mass + r.cross(dir).length_squared() * body.inv_inertia;
    if k > 0.0 { 1.0 / k } else { 0.0 }
}

/// One hull vertex touching (or about to touch) a plane during a step
#[derive(Debug, Clone, Copy)]
pub struct PlaneContact {
    /// Vertex offset from the body center, in world orientation
    pub r: Vec3,
    pub normal: Vec3,
    tangents: [Vec3; 2],
    normal_mass: f32,
    tangent_mass: [f32; 2],
    /// Normal velocity the solver drives the vertex towards
    target: f32,
    friction: f32,
    /// Accumulated normal impulse, never negative
    pub normal_impulse: f32,
    tangent_impulse: [f32; 2],
}

impl PlaneContact {
    /// Build the contact for the vertex at offset `r`, or `None` when the
    /// vertex stays clear of the plane for the whole step.
    ///
    /// A vertex that is touching and approaching faster than
    /// `bounce_threshold` bounces with the material's restitution. Any other
    /// contact is speculative: it may close the gap within `dt` but not
    /// cross the plane.
    pub fn new(
        body: &RigidBody,
        r: Vec3,
        plane: &Plane,
        material: &ContactMaterial,
        dt: f32,
        bounce_threshold: f32,
    ) -> Option<Self> {
        let n = plane.normal;
        let distance = plane.signed_distance(body.state.position + r);
        let vn = body.velocity_at(r).dot(n);
        if distance >= CONTACT_SLOP && distance + vn * dt >= CONTACT_SLOP {
            return None;
        }

        let target = if distance < CONTACT_SLOP && vn < -bounce_threshold {
            -material.restitution * vn
        } else {
            -distance.max(0.0) / dt
        };
        let (t1, t2) = n.any_orthonormal_pair();
        Some(Self {
            r,
            normal: n,
            tangents: [t1, t2],
            normal_mass: effective_mass(body, r, n),
            tangent_mass: [effective_mass(body, r, t1), effective_mass(body, r, t2)],
            target,
            friction: material.friction,
            normal_impulse: 0.0,
            tangent_impulse: [0.0, 0.0],
        })
    }

    /// One solver pass: friction first, then the normal
    pub fn solve(&mut self, body: &mut RigidBody) {
        let max_friction = self.friction * self.normal_impulse;
        for i in 0..2 {
            let vt = body.velocity_at(self.r).dot(self.tangents[i]);
            let total = (self.tangent_impulse[i] - vt * self.tangent_mass[i])
                .clamp(-max_friction, max_friction);
            let delta = total - self.tangent_impulse[i];
            self.tangent_impulse[i] = total;
            body.apply_impulse(self.tangents[i] * delta, self.r);
        }

        let vn = body.velocity_at(self.r).dot(self.normal);
        let total = (self.normal_impulse + (self.target - vn) * self.normal_mass).max(0.0);
        let delta = total - self.normal_impulse;
        self.normal_impulse = total;
        body.apply_impulse(self.normal * delta, self.r);
    }
}

/// Contacts for every hull vertex of `body` near `plane`, in hull order
pub fn plane_contacts(
    body: &RigidBody,
    plane: &Plane,
    material: &ContactMaterial,
    dt: f32,
    bounce_threshold: f32,
) -> impl Iterator<Item = PlaneContact> {
    body.hull.iter().filter_map(move |v| {
        let r = body.state.orientation * *v;
        PlaneContact::new(body, r, plane, material, dt, bounce_threshold)
    })
}

/// Move `body` out of `plane` along its normal and drop any velocity still
/// heading into it
pub fn push_out_of_plane(body: &mut RigidBody, plane: &Plane) {
    let deepest = body
        .hull
        .iter()
        .map(|v| plane.signed_distance(body.state.position + body.state.orientation * *v))
        .fold(f32::INFINITY, f32::min);
    if deepest < 0.0 {
        let n = plane.normal;
        body.state.position += n * -deepest;
        let vn = body.state.velocity.dot(n);
        if vn < 0.0 {
            body.state.velocity -= n * vn;
        }
    }
}

/// Overlap normal and depth of two bounding spheres, if they overlap
fn sphere_overlap(a: &RigidBody, b: &RigidBody) -> Option<(Vec3, f32)> {
    let d = b.state.position - a.state.position;
    let dist = d.length();
    let min_dist = a.radius + b.radius;
    if dist >= min_dist || dist <= 1e-6 || a.inv_mass + b.inv_mass <= 0.0 {
        return None;
    }
    Some((d / dist, min_dist - dist))
}

/// Velocity response between two dice whose bounding spheres overlap.
///
/// Like plane contacts, slow approaches get no restitution. Returns whether
/// an impulse was applied.
pub fn resolve_sphere_pair(
    a: &mut RigidBody,
    b: &mut RigidBody,
    material: &ContactMaterial,
    bounce_threshold: f32,
) -> bool {
    let Some((n, _)) = sphere_overlap(a, b) else {
        return false;
    };
    let vn = (b.state.velocity - a.state.velocity).dot(n);
    if vn >= 0.0 {
        return false;
    }
    let restitution = if vn < -bounce_threshold {
        material.restitution
    } else {
        0.0
    };
    let j = -(1.0 + restitution) * vn / (a.inv_mass + b.inv_mass);
    a.state.velocity -= n * j * a.inv_mass;
    b.state.velocity += n * j * b.inv_mass;
    true
}

/// Push two overlapping dice apart, split by inverse mass
pub fn separate_sphere_pair(a: &mut RigidBody, b: &mut RigidBody) -> bool {
    let Some((n, depth)) = sphere_overlap(a, b) else {
        return false;
    };
    let total_inv_mass = a.inv_mass + b.inv_mass;
    a.state.position -= n * depth * (a.inv_mass / total_inv_mass);
    b.state.position += n * depth * (b.inv_mass / total_inv_mass);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_RATE;
    use crate::sim::world::{BodyDesc, BodyHandle, BodyState};

    fn cube_body(position: Vec3, velocity: Vec3) -> RigidBody {
        let hull = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        RigidBody::new(
            BodyHandle(1),
            BodyDesc {
                mass: 1.0,
                radius: 3.0_f32.sqrt(),
                hull,
                state: BodyState {
                    position,
                    velocity,
                    ..Default::default()
                },
            },
        )
    }

    /// Gather contacts once, then run `passes` solver passes
    fn solve_against(
        body: &mut RigidBody,
        plane: &Plane,
        material: &ContactMaterial,
        bounce_threshold: f32,
        passes: usize,
    ) -> Vec<PlaneContact> {
        let mut contacts: Vec<_> =
            plane_contacts(body, plane, material, FRAME_RATE, bounce_threshold).collect();
        for _ in 0..passes {
            for contact in &mut contacts {
                contact.solve(body);
            }
        }
        contacts
    }

    #[test]
    fn test_plane_signed_distance() {
        let floor = Plane::new(Vec3::Z, 0.0);
        assert_eq!(floor.signed_distance(Vec3::new(5.0, 3.0, 2.0)), 2.0);
        let wall = Plane::new(Vec3::NEG_X, -10.0);
        assert_eq!(wall.signed_distance(Vec3::ZERO), 10.0);
        assert!(wall.signed_distance(Vec3::new(11.0, 0.0, 0.0)) < 0.0);
    }

    #[test]
    fn test_only_bottom_vertices_make_contact() {
        let floor = Plane::new(Vec3::Z, 0.0);
        let body = cube_body(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -5.0));
        let material = ContactMaterial::new(0.3, 0.0);
        let contacts: Vec<_> = plane_contacts(&body, &floor, &material, FRAME_RATE, 100.0).collect();
        assert_eq!(contacts.len(), 4);
        assert!(contacts.iter().all(|c| c.r.z < 0.0));
    }

    #[test]
    fn test_flat_landing_stops_downward_motion() {
        let floor = Plane::new(Vec3::Z, 0.0);
        let mut body = cube_body(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -5.0));
        let material = ContactMaterial::new(0.3, 0.0);
        let contacts = solve_against(&mut body, &floor, &material, 100.0, 8);
        assert!(body.state.velocity.z.abs() < 1e-3);
        assert!(body.state.angular_velocity.length() < 1e-3);
        assert!(contacts.iter().all(|c| c.normal_impulse >= 0.0));
    }

    #[test]
    fn test_fast_landing_bounces() {
        let floor = Plane::new(Vec3::Z, 0.0);
        let mut body = cube_body(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -50.0));
        let material = ContactMaterial::new(0.0, 0.5);
        solve_against(&mut body, &floor, &material, 10.0, 4);
        assert!(body.state.velocity.z > 0.0);
    }

    #[test]
    fn test_approach_only_closes_the_gap() {
        let floor = Plane::new(Vec3::Z, 0.0);
        let mut body = cube_body(Vec3::new(0.0, 0.0, 1.2), Vec3::new(0.0, 0.0, -50.0));
        let material = ContactMaterial::new(0.3, 0.5);
        solve_against(&mut body, &floor, &material, 100.0, 8);
        let allowed = -0.2 / FRAME_RATE;
        assert!((body.state.velocity.z - allowed).abs() < 1e-2, "{:?}", body.state);
        let bottom = body.state.position.z - 1.0 + body.state.velocity.z * FRAME_RATE;
        assert!(bottom > -1e-3);
    }

    #[test]
    fn test_friction_limited_by_normal_impulse() {
        let floor = Plane::new(Vec3::Z, 0.0);
        let mut body = cube_body(Vec3::new(0.0, 0.0, 1.0), Vec3::new(10.0, 0.0, -5.0));
        let material = ContactMaterial::new(0.1, 0.0);
        let contacts = solve_against(&mut body, &floor, &material, 100.0, 8);
        let normal: f32 = contacts.iter().map(|c| c.normal_impulse).sum();
        assert!(normal > 0.0);
        let lost = 10.0 - body.state.velocity.x;
        assert!(lost > 0.0);
        assert!(lost <= material.friction * normal + 1e-4);
    }

    #[test]
    fn test_separating_body_untouched() {
        let floor = Plane::new(Vec3::Z, 0.0);
        let mut body = cube_body(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 5.0));
        let material = ContactMaterial::new(0.3, 0.5);
        let contacts = solve_against(&mut body, &floor, &material, 10.0, 8);
        assert!(contacts.iter().all(|c| c.normal_impulse == 0.0));
        assert_eq!(body.state.velocity, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(body.state.angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_far_body_has_no_contacts() {
        let floor = Plane::new(Vec3::Z, 0.0);
        let body = cube_body(Vec3::new(0.0, 0.0, 50.0), Vec3::new(0.0, 0.0, -5.0));
        let material = ContactMaterial::new(0.3, 0.5);
        assert_eq!(plane_contacts(&body, &floor, &material, FRAME_RATE, 10.0).count(), 0);
    }

    #[test]
    fn test_push_out_of_plane() {
        let floor = Plane::new(Vec3::Z, 0.0);
        let mut body = cube_body(Vec3::new(0.0, 0.0, 0.25), Vec3::new(1.0, 0.0, -3.0));
        push_out_of_plane(&mut body, &floor);
        assert!((body.state.position.z - 1.0).abs() < 1e-5);
        assert_eq!(body.state.velocity, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_sphere_pair_bounces_and_separates() {
        let mut a = cube_body(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        let mut b = cube_body(Vec3::new(2.0, 0.0, 0.0), Vec3::new(-10.0, 0.0, 0.0));
        let material = ContactMaterial::new(0.0, 0.5);
        assert!(resolve_sphere_pair(&mut a, &mut b, &material, 1.0));
        assert!((a.state.velocity.x + 5.0).abs() < 1e-4);
        assert!((b.state.velocity.x - 5.0).abs() < 1e-4);
        assert!(!resolve_sphere_pair(&mut a, &mut b, &material, 1.0));

        assert!(separate_sphere_pair(&mut a, &mut b));
        let gap = (b.state.position - a.state.position).length();
        assert!((gap - 2.0 * 3.0_f32.sqrt()).abs() < 1e-4);
        assert!(!separate_sphere_pair(&mut a, &mut b));
    }

    #[test]
    fn test_slow_sphere_approach_does_not_bounce() {
        let mut a = cube_body(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let mut b = cube_body(Vec3::new(2.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let material = ContactMaterial::new(0.0, 0.5);
        assert!(resolve_sphere_pair(&mut a, &mut b, &material, 10.0));
        assert!(a.state.velocity.x.abs() < 1e-6);
        assert!(b.state.velocity.x.abs() < 1e-6);
    }
}
