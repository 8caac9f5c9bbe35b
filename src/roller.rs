//! The dice box
//!
//! Sequences a whole throw: parse the notation, generate launch vectors, ask
//! the before-roll hook for desired results, pre-simulate and relabel when
//! there are any, animate frame by frame, then resolve and report.
//!
//! ```text
//! Idle -> VectorsGenerated -> [PreSimulated -> Relabeled] -> Animating -> Resolved -> Idle
//! ```

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::launch::{self, LaunchVector, Swipe, Throw};
use crate::notation::{NotationError, RollOutcome, RollRequest};
use crate::scene::RenderScene;
use crate::settings::Settings;
use crate::sim::{DiceWorld, PhysicsWorld, SimulationDriver};

/// Where the box is in its throw lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollPhase {
    #[default]
    Idle,
    VectorsGenerated,
    PreSimulated,
    Relabeled,
    Animating,
    Resolved,
}

impl RollPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollPhase::Idle => "idle",
            RollPhase::VectorsGenerated => "vectors generated",
            RollPhase::PreSimulated => "pre-simulated",
            RollPhase::Relabeled => "relabeled",
            RollPhase::Animating => "animating",
            RollPhase::Resolved => "resolved",
        }
    }
}

/// Caller hooks around one throw
pub trait RollHooks {
    /// Desired face values for this throw, or `None` to keep whatever the
    /// notation's `@` segment asked for
    fn before_roll(&mut self, _request: &RollRequest) -> Option<Vec<i32>> {
        None
    }

    /// Called once the throw has been resolved
    fn after_roll(&mut self, _request: &RollRequest, _outcome: &RollOutcome) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl RollHooks for NoHooks {}

/// Hooks built from a pair of closures
pub struct FnHooks<B, A> {
    before: B,
    after: A,
}

impl<B, A> FnHooks<B, A>
where
    B: FnMut(&RollRequest) -> Option<Vec<i32>>,
    A: FnMut(&RollRequest, &RollOutcome),
{
    pub fn new(before: B, after: A) -> Self {
        Self { before, after }
    }
}

impl<B, A> RollHooks for FnHooks<B, A>
where
    B: FnMut(&RollRequest) -> Option<Vec<i32>>,
    A: FnMut(&RollRequest, &RollOutcome),
{
    fn before_roll(&mut self, request: &RollRequest) -> Option<Vec<i32>> {
        (self.before)(request)
    }

    fn after_roll(&mut self, request: &RollRequest, outcome: &RollOutcome) {
        (self.after)(request, outcome)
    }
}

/// Result of driving one frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    /// No throw in flight
    Idle,
    /// Still animating. With fixed stepping, `delay` is how long to wait
    /// before the next frame when this one came early.
    Running { delay: Option<Duration> },
    /// The throw just resolved
    Finished(RollOutcome),
}

struct ActiveThrow {
    request: RollRequest,
    hooks: Box<dyn RollHooks>,
}

/// A dice box: one throw at a time on a walled surface
pub struct DiceBox<W: PhysicsWorld = DiceWorld> {
    settings: Settings,
    driver: SimulationDriver<W>,
    rng: Pcg32,
    seed: u64,
    notation: String,
    phase: RollPhase,
    active: Option<ActiveThrow>,
    last_vectors: Vec<LaunchVector>,
    /// Fixed stepping forced for a throw with desired results
    adaptive_suspended: bool,
    last_frame: Option<f64>,
    half_width: f32,
    half_height: f32,
}

impl DiceBox<DiceWorld> {
    /// A box with the built-in physics world and a random seed
    pub fn new(settings: Settings) -> Self {
        let seed = rand::rng().random();
        Self::with_seed(settings, seed)
    }

    /// A box with the built-in physics world and a fixed seed
    pub fn with_seed(settings: Settings, seed: u64) -> Self {
        let world = DiceWorld::new(settings.physics.clone());
        Self::with_world(settings, world, seed)
    }
}

impl<W: PhysicsWorld> DiceBox<W> {
    pub fn with_world(settings: Settings, world: W, seed: u64) -> Self {
        let (half_width, half_height) = settings.surface.half_extents();
        let scale = settings.dice_scale_for(half_width, half_height);
        let mut driver = SimulationDriver::new(world, scale, settings.effective_frame_rate());
        driver.set_surface(half_width, half_height);
        driver.configure_scene(&settings.appearance);
        log::info!(
            "Dice box {}x{} (die scale {:.1}), seed {}",
            settings.surface.width,
            settings.surface.height,
            scale,
            seed
        );

        Self {
            settings,
            driver,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            notation: String::new(),
            phase: RollPhase::Idle,
            active: None,
            last_vectors: Vec::new(),
            adaptive_suspended: false,
            last_frame: None,
            half_width,
            half_height,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> RollPhase {
        self.phase
    }

    pub fn is_rolling(&self) -> bool {
        self.active.is_some()
    }

    pub fn notation(&self) -> &str {
        &self.notation
    }

    pub fn driver(&self) -> &SimulationDriver<W> {
        &self.driver
    }

    /// Launch vectors of the most recent throw
    pub fn launch_vectors(&self) -> &[LaunchVector] {
        &self.last_vectors
    }

    /// Whether the next frame will use adaptive stepping
    pub fn adaptive_timestep_active(&self) -> bool {
        self.settings.use_adaptive_timestep && !self.adaptive_suspended
    }

    pub fn set_scene(&mut self, scene: Box<dyn RenderScene>) {
        self.driver.set_scene(scene);
        self.driver.configure_scene(&self.settings.appearance);
    }

    /// Resize the play surface. The die scale follows the surface unless it
    /// is fixed in the settings.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.settings.surface.width = width;
        self.settings.surface.height = height;
        let (half_width, half_height) = self.settings.surface.half_extents();
        self.half_width = half_width;
        self.half_height = half_height;
        self.driver.set_surface(half_width, half_height);

        let scale = self.settings.dice_scale_for(half_width, half_height);
        if self.driver.set_dice_scale(scale) {
            log::debug!("Die scale now {scale:.1}");
            self.driver.configure_scene(&self.settings.appearance);
        }
    }

    /// Set the notation for the next throws
    pub fn set_dice(&mut self, notation: &str) -> Result<RollRequest, NotationError> {
        let request = RollRequest::parse(notation);
        if request.dice.len() > self.settings.max_dice {
            return Err(NotationError::TooManyDice {
                count: request.dice.len(),
                limit: self.settings.max_dice,
            });
        }
        if request.error {
            log::warn!("Ignoring malformed terms in \"{notation}\"");
        }
        self.notation = notation.to_string();
        Ok(request)
    }

    /// Throw in a random direction. Returns false if the throw was rejected.
    pub fn start_throw(&mut self, hooks: impl RollHooks + 'static) -> bool {
        if self.reject_if_rolling() {
            return false;
        }
        let throw = launch::random_throw(self.half_width, self.half_height, &mut self.rng);
        self.throw_dice(throw, Box::new(hooks))
    }

    /// Throw along a swipe. Returns false if the swipe was too short or the
    /// throw was rejected.
    pub fn throw_from_swipe(&mut self, swipe: &Swipe, hooks: impl RollHooks + 'static) -> bool {
        if self.reject_if_rolling() {
            return false;
        }
        let Some(throw) = launch::swipe_throw(swipe, self.half_width, self.half_height) else {
            return false;
        };
        self.throw_dice(throw, Box::new(hooks))
    }

    fn reject_if_rolling(&self) -> bool {
        if self.is_rolling() {
            log::warn!("Throw rejected: dice are already rolling");
        }
        self.is_rolling()
    }

    fn set_phase(&mut self, phase: RollPhase) {
        log::debug!("Roll phase: {} -> {}", self.phase.as_str(), phase.as_str());
        self.phase = phase;
    }

    fn throw_dice(&mut self, throw: Throw, mut hooks: Box<dyn RollHooks>) -> bool {
        let request = RollRequest::parse(&self.notation);
        if request.is_empty() {
            log::warn!("Throw rejected: nothing to roll in \"{}\"", self.notation);
            return false;
        }

        let vectors = launch::generate(
            &request.dice,
            throw.direction,
            throw.boost,
            self.half_width,
            self.half_height,
            &mut self.rng,
        );
        self.set_phase(RollPhase::VectorsGenerated);

        let desired = hooks
            .before_roll(&request)
            .unwrap_or_else(|| request.desired.clone());

        if desired.is_empty() {
            self.driver.instantiate(&vectors);
        } else {
            self.adaptive_suspended = true;
            self.driver.instantiate(&vectors);
            let natural = self.driver.emulate();
            log::debug!("Natural results {natural:?}, desired {desired:?}");
            self.set_phase(RollPhase::PreSimulated);

            self.driver.instantiate(&vectors);
            for (i, (&want, &got)) in desired.iter().zip(&natural).enumerate() {
                self.driver.relabel(i, want, got);
            }
            self.set_phase(RollPhase::Relabeled);
        }

        log::info!("Throwing {request}");
        self.last_vectors = vectors;
        self.last_frame = None;
        self.active = Some(ActiveThrow { request, hooks });
        self.set_phase(RollPhase::Animating);
        true
    }

    /// Drive one frame at wall-clock time `now` (seconds)
    pub fn frame(&mut self, now: f64) -> FrameStatus {
        if self.phase != RollPhase::Animating {
            return FrameStatus::Idle;
        }

        let frame_rate = self.driver.frame_rate();
        let elapsed = match self.last_frame {
            Some(last) => (now - last) as f32,
            None => frame_rate,
        };
        self.last_frame = Some(now);

        let adaptive = self.adaptive_timestep_active();
        self.driver.advance_frame(elapsed, adaptive);
        if self.driver.check_finished() {
            return match self.resolve() {
                Some(outcome) => FrameStatus::Finished(outcome),
                None => FrameStatus::Idle,
            };
        }

        let delay = (!adaptive && elapsed >= 0.0 && elapsed < frame_rate)
            .then(|| Duration::from_secs_f32(frame_rate - elapsed));
        FrameStatus::Running { delay }
    }

    fn resolve(&mut self) -> Option<RollOutcome> {
        let mut active = self.active.take()?;
        self.set_phase(RollPhase::Resolved);

        let outcome = RollOutcome::new(
            self.driver.values(),
            active.request.constant,
            self.driver.timed_out(),
        );
        if outcome.is_fault() {
            log::warn!("Could not read every die: {:?}", outcome.values);
        }
        log::info!("Rolled {}: {}", active.request, outcome.display);

        active.hooks.after_roll(&active.request, &outcome);
        self.adaptive_suspended = false;
        self.set_phase(RollPhase::Idle);
        Some(outcome)
    }

    /// Drive frames on a virtual clock until the current throw resolves
    pub fn roll_to_completion(&mut self) -> Option<RollOutcome> {
        let frame_rate = f64::from(self.driver.frame_rate());
        let mut now = 0.0;
        loop {
            match self.frame(now) {
                FrameStatus::Running { .. } => now += frame_rate,
                FrameStatus::Finished(outcome) => return Some(outcome),
                FrameStatus::Idle => return None,
            }
        }
    }

    /// Remove every die from the table. Ignored while rolling.
    pub fn clear(&mut self) -> bool {
        if self.is_rolling() {
            log::warn!("Clear ignored: dice are still rolling");
            return false;
        }
        self.driver.clear();
        true
    }
}
