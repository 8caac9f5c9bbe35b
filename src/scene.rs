//! Render scene seam
//!
//! The simulation pushes die poses and label changes into a [`RenderScene`]
//! and never reads anything back. Every method defaults to a no-op so a
//! headless box needs nothing beyond [`NullScene`].

use glam::{Quat, Vec3};

use crate::dice::DiceType;
use crate::faces::FaceLabels;
use crate::settings::Appearance;
use crate::sim::BodyHandle;

pub trait RenderScene {
    /// Called on construction and whenever the die scale changes
    fn configure(&mut self, _appearance: &Appearance, _dice_scale: f32) {}

    fn add_die(&mut self, _body: BodyHandle, _dice_type: DiceType, _labels: &FaceLabels) {}

    /// The die's printed labels changed
    fn relabel_die(&mut self, _body: BodyHandle, _labels: &FaceLabels) {}

    fn remove_die(&mut self, _body: BodyHandle) {}

    fn set_pose(&mut self, _body: BodyHandle, _position: Vec3, _orientation: Quat) {}

    /// Present the current frame
    fn render(&mut self) {}
}

/// Scene that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScene;

impl RenderScene for NullScene {}
