//! Built-in rigid body world for dice
//!
//! A small deterministic impulse solver. Each step applies gravity and
//! damping, gathers hull vertex contacts against the desk and four barriers,
//! solves them together with the bounding spheres between dice over several
//! passes, then integrates. Bodies and contacts are kept in insertion order
//! and nothing is hashed, so identical inputs always give bit-identical
//! trajectories.

use glam::{Quat, Vec3};

use super::contact::{
    ContactMaterial, Plane, PlaneContact, plane_contacts, push_out_of_plane, resolve_sphere_pair,
    separate_sphere_pair,
};
use super::world::{BodyDesc, BodyHandle, BodyState, PhysicsWorld};
use crate::settings::PhysicsSettings;

/// Solid-sphere style inertia factor applied to the bounding radius
const INERTIA_FACTOR: f32 = 0.4;

/// One simulated die
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub handle: BodyHandle,
    pub state: BodyState,
    pub inv_mass: f32,
    /// Inverse of the (isotropic) moment of inertia
    pub inv_inertia: f32,
    pub radius: f32,
    pub hull: Vec<Vec3>,
}

impl RigidBody {
    pub fn new(handle: BodyHandle, desc: BodyDesc) -> Self {
        let inv_mass = if desc.mass > 0.0 { 1.0 / desc.mass } else { 0.0 };
        let inertia = INERTIA_FACTOR * desc.mass * desc.radius * desc.radius;
        let inv_inertia = if inertia > 0.0 { 1.0 / inertia } else { 0.0 };
        Self {
            handle,
            state: desc.state,
            inv_mass,
            inv_inertia,
            radius: desc.radius,
            hull: desc.hull,
        }
    }

    /// Velocity of the point at offset `r` from the center
    #[inline]
    pub fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.state.velocity + self.state.angular_velocity.cross(r)
    }

    /// Apply `impulse` at offset `r` from the center
    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vec3, r: Vec3) {
        self.state.velocity += impulse * self.inv_mass;
        self.state.angular_velocity += r.cross(impulse) * self.inv_inertia;
    }

    fn integrate(&mut self, dt: f32) {
        self.state.position += self.state.velocity * dt;
        let spin = Quat::from_scaled_axis(self.state.angular_velocity * dt);
        self.state.orientation = (spin * self.state.orientation).normalize();
    }
}

/// The dice box: a desk at z = 0 walled in by four barriers
#[derive(Debug, Clone)]
pub struct DiceWorld {
    settings: PhysicsSettings,
    bodies: Vec<RigidBody>,
    planes: Vec<(Plane, ContactMaterial)>,
    next_id: u32,
}

impl DiceWorld {
    pub fn new(settings: PhysicsSettings) -> Self {
        let mut world = Self {
            settings,
            bodies: Vec::new(),
            planes: Vec::new(),
            next_id: 1,
        };
        world.set_surface(400.0, 300.0);
        world
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    /// Desk first, then the four barriers
    pub fn planes(&self) -> impl Iterator<Item = &Plane> {
        self.planes.iter().map(|(plane, _)| plane)
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.iter().position(|b| b.handle == handle)
    }
}

impl Default for DiceWorld {
    fn default() -> Self {
        Self::new(PhysicsSettings::default())
    }
}

impl PhysicsWorld for DiceWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.bodies.push(RigidBody::new(handle, desc));
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        match self.index_of(handle) {
            Some(i) => {
                self.bodies.remove(i);
                true
            }
            None => false,
        }
    }

    fn set_body_state(&mut self, handle: BodyHandle, state: BodyState) -> bool {
        match self.index_of(handle) {
            Some(i) => {
                self.bodies[i].state = state;
                true
            }
            None => false,
        }
    }

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.index_of(handle).map(|i| self.bodies[i].state)
    }

    fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let s = &self.settings;
        let gravity = Vec3::new(0.0, 0.0, -s.gravity);
        let linear_decay = (1.0 - s.linear_damping).clamp(0.0, 1.0).powf(dt);
        let angular_decay = (1.0 - s.angular_damping).clamp(0.0, 1.0).powf(dt);
        // Anything gravity alone could build up in two steps is a resting contact
        let bounce_threshold = 2.0 * s.gravity.abs() * dt;

        for body in &mut self.bodies {
            body.state.velocity = (body.state.velocity + gravity * dt) * linear_decay;
            body.state.angular_velocity *= angular_decay;
        }

        let planes = &self.planes;
        let mut contacts: Vec<(usize, PlaneContact)> = Vec::new();
        for (i, body) in self.bodies.iter().enumerate() {
            for (plane, material) in planes {
                contacts.extend(
                    plane_contacts(body, plane, material, dt, bounce_threshold).map(|c| (i, c)),
                );
            }
        }

        for _ in 0..s.solver_iterations.max(1) {
            for (i, contact) in &mut contacts {
                contact.solve(&mut self.bodies[*i]);
            }
            for j in 1..self.bodies.len() {
                let (head, tail) = self.bodies.split_at_mut(j);
                for a in head.iter_mut() {
                    resolve_sphere_pair(a, &mut tail[0], &s.dice, bounce_threshold);
                }
            }
        }
        for j in 1..self.bodies.len() {
            let (head, tail) = self.bodies.split_at_mut(j);
            for a in head.iter_mut() {
                separate_sphere_pair(a, &mut tail[0]);
            }
        }

        for body in &mut self.bodies {
            body.integrate(dt);
            for (plane, _) in planes {
                push_out_of_plane(body, plane);
            }
        }
    }

    fn set_surface(&mut self, half_width: f32, half_height: f32) {
        let s = &self.settings;
        let bx = half_width * s.barrier_extent;
        let by = half_height * s.barrier_extent;
        self.planes = vec![
            (Plane::new(Vec3::Z, 0.0), s.desk),
            (Plane::new(Vec3::NEG_Y, -by), s.barrier),
            (Plane::new(Vec3::Y, -by), s.barrier),
            (Plane::new(Vec3::NEG_X, -bx), s.barrier),
            (Plane::new(Vec3::X, -bx), s.barrier),
        ];
        log::debug!("Dice world barriers at ±{bx:.1} x ±{by:.1}");
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::all_components_below;
    use crate::consts::{FRAME_RATE, SETTLE_EPSILON};
    use crate::dice::DiceType;
    use crate::geometry::DieGeometry;

    fn die_desc(dice_type: DiceType, state: BodyState) -> BodyDesc {
        let geom = DieGeometry::new(dice_type, 50.0);
        BodyDesc {
            mass: dice_type.mass(),
            radius: geom.radius,
            hull: geom.vertices.clone(),
            state,
        }
    }

    fn assert_inside(world: &DiceWorld) {
        for body in world.bodies() {
            for plane in world.planes() {
                for v in &body.hull {
                    let p = body.state.position + body.state.orientation * *v;
                    assert!(plane.signed_distance(p) > -1e-2, "vertex {p} outside {plane:?}");
                }
            }
        }
    }

    #[test]
    fn test_body_falls_under_gravity() {
        let mut world = DiceWorld::default();
        let h = world.add_body(die_desc(
            DiceType::D6,
            BodyState {
                position: Vec3::new(0.0, 0.0, 300.0),
                ..Default::default()
            },
        ));
        world.step(FRAME_RATE);
        let state = world.body_state(h).unwrap();
        assert!(state.velocity.z < 0.0);
        assert!(state.position.z < 300.0);
    }

    #[test]
    fn test_handles_and_removal() {
        let mut world = DiceWorld::default();
        let a = world.add_body(die_desc(DiceType::D6, BodyState::default()));
        let b = world.add_body(die_desc(DiceType::D8, BodyState::default()));
        assert_ne!(a, b);
        assert_eq!(world.body_count(), 2);
        assert!(world.remove_body(a));
        assert!(!world.remove_body(a));
        assert!(world.body_state(a).is_none());
        assert!(world.body_state(b).is_some());
        assert!(!world.set_body_state(a, BodyState::default()));
    }

    #[test]
    fn test_thrown_dice_stay_in_the_box() {
        let mut world = DiceWorld::default();
        let types = [DiceType::D4, DiceType::D6, DiceType::D20];
        for (i, t) in types.into_iter().enumerate() {
            world.add_body(die_desc(
                t,
                BodyState {
                    position: Vec3::new(-200.0 + 150.0 * i as f32, 100.0, 250.0),
                    orientation: Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), i as f32),
                    velocity: Vec3::new(1500.0, -900.0, -10.0),
                    angular_velocity: Vec3::new(20.0, -15.0, 0.0),
                },
            ));
        }
        for _ in 0..600 {
            world.step(FRAME_RATE);
            assert_inside(&world);
        }
    }

    #[test]
    fn test_flat_die_comes_to_rest() {
        let mut world = DiceWorld::default();
        let h = world.add_body(die_desc(
            DiceType::D6,
            BodyState {
                position: Vec3::new(0.0, 0.0, 60.0),
                ..Default::default()
            },
        ));
        for _ in 0..240 {
            world.step(FRAME_RATE);
        }
        let state = world.body_state(h).unwrap();
        assert!(all_components_below(state.velocity, SETTLE_EPSILON), "{state:?}");
        assert!(all_components_below(state.angular_velocity, SETTLE_EPSILON), "{state:?}");
    }

    #[test]
    fn test_tumbling_die_lands_on_a_face() {
        for dice_type in [DiceType::D6, DiceType::D8, DiceType::D12, DiceType::D20] {
            let mut world = DiceWorld::default();
            let h = world.add_body(die_desc(
                dice_type,
                BodyState {
                    position: Vec3::new(0.0, 0.0, 150.0),
                    orientation: Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 0.5),
                    velocity: Vec3::new(300.0, 0.0, 0.0),
                    angular_velocity: Vec3::new(3.0, -2.0, 0.0),
                },
            ));
            for _ in 0..300 {
                world.step(FRAME_RATE);
            }
            let state = world.body_state(h).unwrap();
            assert!(all_components_below(state.velocity, SETTLE_EPSILON), "{dice_type}: {state:?}");
            assert!(
                all_components_below(state.angular_velocity, SETTLE_EPSILON),
                "{dice_type}: {state:?}"
            );

            let geom = DieGeometry::new(dice_type, 50.0);
            let tilt = geom
                .faces
                .iter()
                .map(|f| (state.orientation * f.normal).angle_between(Vec3::NEG_Z))
                .fold(f32::INFINITY, f32::min);
            assert!(tilt.to_degrees() < 1.0, "{dice_type} resting {} degrees off a face", tilt.to_degrees());
        }
    }

    #[test]
    fn test_identical_inputs_identical_trajectories() {
        let run = || {
            let mut world = DiceWorld::default();
            let h = world.add_body(die_desc(
                DiceType::D12,
                BodyState {
                    position: Vec3::new(100.0, -50.0, 300.0),
                    orientation: Quat::from_axis_angle(Vec3::X, 0.7),
                    velocity: Vec3::new(-800.0, 400.0, -10.0),
                    angular_velocity: Vec3::new(5.0, 9.0, 0.0),
                },
            ));
            for _ in 0..300 {
                world.step(FRAME_RATE);
            }
            world.body_state(h).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_non_positive_dt_is_ignored() {
        let mut world = DiceWorld::default();
        let h = world.add_body(die_desc(
            DiceType::D6,
            BodyState {
                position: Vec3::new(0.0, 0.0, 300.0),
                ..Default::default()
            },
        ));
        let before = world.body_state(h).unwrap();
        world.step(0.0);
        world.step(-1.0);
        world.step(f32::NAN);
        assert_eq!(world.body_state(h).unwrap(), before);
    }
}
