//! Simulation driver
//!
//! Owns the physics world and the dice in it. The same stepping and
//! settlement path backs both the headless pre-simulation ([`emulate`]) and
//! the animated frames ([`advance_frame`] + [`check_finished`]), so a throw
//! replayed from identical launch vectors with fixed steps lands exactly as
//! it did when emulated.
//!
//! [`emulate`]: SimulationDriver::emulate
//! [`advance_frame`]: SimulationDriver::advance_frame
//! [`check_finished`]: SimulationDriver::check_finished

use std::sync::Arc;

use super::dice_world::DiceWorld;
use super::settle::{SettleState, is_at_rest};
use super::world::{BodyDesc, BodyHandle, BodyState, PhysicsWorld};
use crate::consts::{ADAPTIVE_STEP_SLACK, FRAME_OUTLIER_SECONDS, MAX_THROW_SECONDS};
use crate::dice::DiceType;
use crate::faces::{FACE_FAULT, FaceLabels, force_value, resolve_value};
use crate::geometry::{DieGeometry, GeometryCache};
use crate::launch::LaunchVector;
use crate::scene::{NullScene, RenderScene};
use crate::settings::Appearance;

/// A die currently in the world
#[derive(Debug, Clone)]
pub struct DieInstance {
    pub dice_type: DiceType,
    pub body: BodyHandle,
    pub settle: SettleState,
    pub labels: FaceLabels,
    pub geometry: Arc<DieGeometry>,
}

pub struct SimulationDriver<W: PhysicsWorld = DiceWorld> {
    world: W,
    scene: Box<dyn RenderScene>,
    geometry: GeometryCache,
    dice: Vec<DieInstance>,
    iteration: u32,
    frame_rate: f32,
    timed_out: bool,
}

impl<W: PhysicsWorld> SimulationDriver<W> {
    pub fn new(world: W, dice_scale: f32, frame_rate: f32) -> Self {
        Self {
            world,
            scene: Box::new(NullScene),
            geometry: GeometryCache::new(dice_scale),
            dice: Vec::new(),
            iteration: 0,
            frame_rate,
            timed_out: false,
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn dice(&self) -> &[DieInstance] {
        &self.dice
    }

    /// Steps taken since the current dice were instantiated
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn dice_scale(&self) -> f32 {
        self.geometry.scale()
    }

    /// Iterations after which a throw is finished whether or not it settled
    pub fn iteration_budget(&self) -> u32 {
        (MAX_THROW_SECONDS / self.frame_rate).round() as u32
    }

    /// The last finished throw ran out of iterations before every die settled
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn set_scene(&mut self, scene: Box<dyn RenderScene>) {
        self.scene = scene;
    }

    pub fn configure_scene(&mut self, appearance: &Appearance) {
        self.scene.configure(appearance, self.geometry.scale());
    }

    /// Change the die scale. Dice already in the world keep their geometry.
    pub fn set_dice_scale(&mut self, scale: f32) -> bool {
        self.geometry.set_scale(scale)
    }

    pub fn set_surface(&mut self, half_width: f32, half_height: f32) {
        self.world.set_surface(half_width, half_height);
    }

    /// Replace the dice in the world with fresh bodies at `vectors`
    pub fn instantiate(&mut self, vectors: &[LaunchVector]) {
        self.clear();
        for v in vectors {
            let geometry = self.geometry.get(v.dice_type);
            let body = self.world.add_body(BodyDesc {
                mass: v.dice_type.mass(),
                radius: geometry.radius,
                hull: geometry.vertices.clone(),
                state: BodyState {
                    position: v.position,
                    orientation: v.orientation(),
                    velocity: v.velocity,
                    angular_velocity: v.angular_velocity,
                },
            });
            let labels = FaceLabels::new(&geometry);
            self.scene.add_die(body, v.dice_type, &labels);
            self.dice.push(DieInstance {
                dice_type: v.dice_type,
                body,
                settle: SettleState::Moving,
                labels,
                geometry,
            });
        }
        log::debug!("Instantiated {} dice", self.dice.len());
    }

    /// Remove every die and reset the iteration counter
    pub fn clear(&mut self) {
        for die in self.dice.drain(..) {
            self.world.remove_body(die.body);
            self.scene.remove_die(die.body);
        }
        self.iteration = 0;
        self.timed_out = false;
        self.scene.render();
    }

    /// Advance physics by `dt`, exactly once
    pub fn step(&mut self, dt: f32) {
        self.world.step(dt);
    }

    /// One animated frame: count the iteration, step the world, push poses.
    ///
    /// Adaptive mode covers `elapsed` with fixed sub-steps plus a remainder;
    /// otherwise the world advances by one nominal frame.
    pub fn advance_frame(&mut self, elapsed: f32, adaptive: bool) {
        let frame = self.frame_rate;
        let mut elapsed = if elapsed.is_finite() && elapsed > 0.0 && elapsed <= FRAME_OUTLIER_SECONDS {
            elapsed
        } else {
            frame
        };

        self.iteration += 1;
        if adaptive {
            while elapsed > frame * ADAPTIVE_STEP_SLACK {
                self.step(frame);
                elapsed -= frame;
            }
            self.step(elapsed);
        } else {
            self.step(frame);
        }
        self.sync_scene();
    }

    /// Run one settlement check. True once every die is latched or the
    /// iteration budget is spent.
    pub fn check_finished(&mut self) -> bool {
        if self.iteration >= self.iteration_budget() {
            if !self.is_settled() {
                self.timed_out = true;
                log::warn!("Throw did not settle within {} iterations", self.iteration);
            }
            return true;
        }

        let mut finished = true;
        for die in &mut self.dice {
            let at_rest = self.world.body_state(die.body).is_none_or(|s| is_at_rest(&s));
            if !die.settle.observe(self.iteration, at_rest) {
                finished = false;
            }
        }
        finished
    }

    /// Every die is latched stopped
    pub fn is_settled(&self) -> bool {
        self.dice.iter().all(|d| d.settle.is_stopped())
    }

    /// Step headlessly with fixed frames until finished, then read the values
    pub fn emulate(&mut self) -> Vec<i32> {
        loop {
            self.iteration += 1;
            self.step(self.frame_rate);
            if self.check_finished() {
                break;
            }
        }
        log::debug!("Emulated throw finished after {} iterations", self.iteration);
        self.values()
    }

    /// Current value of every die, in instantiation order
    pub fn values(&self) -> Vec<i32> {
        self.dice
            .iter()
            .map(|die| match self.world.body_state(die.body) {
                Some(state) => resolve_value(state.orientation, &die.geometry, &die.labels),
                None => FACE_FAULT,
            })
            .collect()
    }

    /// Relabel die `index` so its `natural` value reads as `desired`
    pub fn relabel(&mut self, index: usize, desired: i32, natural: i32) -> bool {
        let Some(die) = self.dice.get_mut(index) else {
            return false;
        };
        if !force_value(&mut die.labels, desired, natural) {
            return false;
        }
        self.scene.relabel_die(die.body, &die.labels);
        true
    }

    /// Push every die's pose to the scene and render
    pub fn sync_scene(&mut self) {
        for die in &self.dice {
            if let Some(state) = self.world.body_state(die.body) {
                self.scene.set_pose(die.body, state.position, state.orientation);
            }
        }
        self.scene.render();
    }
}
