//! Face resolution and relabeling
//!
//! A die's value is the label of the face whose world-space normal is closest
//! to "up" (down for the d4, which is read from its resting face). Relabeling
//! cyclically shifts every printed label so that a known resting orientation
//! shows a chosen value, without touching the motion.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::dice::DiceType;
use crate::geometry::DieGeometry;

/// Sentinel value for a die whose up face could not be determined
pub const FACE_FAULT: i32 = -1;

/// Corner numbers printed on each d4 face (indexed by label - 1), one table
/// per arrangement. Shifting a d4 selects a different arrangement instead of
/// recoloring single faces.
pub static D4_CORNER_LABELS: [[[u8; 3]; 4]; 4] = [
    [[2, 4, 3], [1, 3, 4], [2, 1, 4], [1, 2, 3]],
    [[2, 3, 4], [3, 1, 4], [2, 4, 1], [3, 2, 1]],
    [[4, 3, 2], [3, 4, 1], [4, 2, 1], [3, 1, 2]],
    [[4, 2, 3], [1, 4, 3], [4, 1, 2], [1, 3, 2]],
];

/// Current label assignment for every face of one die
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceLabels {
    dice_type: DiceType,
    /// Label per geometry face; `None` marks a blank face
    labels: Vec<Option<i32>>,
    /// Selected d4 corner arrangement (always 0 for other types)
    d4_arrangement: usize,
}

impl FaceLabels {
    /// Labels as printed by default on `geometry`
    pub fn new(geometry: &DieGeometry) -> Self {
        Self {
            dice_type: geometry.dice_type,
            labels: geometry.faces.iter().map(|f| f.label).collect(),
            d4_arrangement: 0,
        }
    }

    pub fn dice_type(&self) -> DiceType {
        self.dice_type
    }

    pub fn label(&self, face: usize) -> Option<i32> {
        self.labels.get(face).copied().flatten()
    }

    pub fn labels(&self) -> &[Option<i32>] {
        &self.labels
    }

    /// Corner numbers to draw on each d4 face, `None` for other types
    pub fn d4_corners(&self) -> Option<&'static [[u8; 3]; 4]> {
        (self.dice_type == DiceType::D4).then(|| &D4_CORNER_LABELS[self.d4_arrangement])
    }

    /// Shift every printed label by `shift`, wrapping within the die's range.
    /// Blank faces never move.
    pub fn shift(&mut self, shift: i32) {
        let dice_type = self.dice_type;
        for label in self.labels.iter_mut().flatten() {
            *label = dice_type.wrap_label(*label + shift);
        }
        if dice_type == DiceType::D4 && shift != 0 {
            self.d4_arrangement = (self.d4_arrangement as i32 + shift).rem_euclid(4) as usize;
        }
    }
}

/// World-space direction the result face is compared against
pub(crate) fn reference_axis(dice_type: DiceType) -> Vec3 {
    if dice_type == DiceType::D4 {
        Vec3::NEG_Z
    } else {
        Vec3::Z
    }
}

/// Index of the labeled face most nearly aligned with the reference axis
pub fn up_face(orientation: Quat, geometry: &DieGeometry, labels: &FaceLabels) -> Option<usize> {
    let axis = reference_axis(geometry.dice_type);
    let mut closest = None;
    let mut closest_angle = std::f32::consts::TAU;

    for (i, face) in geometry.faces.iter().enumerate() {
        if labels.label(i).is_none() {
            continue;
        }
        let angle = (orientation * face.normal).angle_between(axis);
        // NaN orientations never compare less, leaving `closest` empty
        if angle < closest_angle {
            closest_angle = angle;
            closest = Some(i);
        }
    }
    closest
}

/// Displayed value of a die at `orientation`, or [`FACE_FAULT`]
pub fn resolve_value(orientation: Quat, geometry: &DieGeometry, labels: &FaceLabels) -> i32 {
    match up_face(orientation, geometry, labels).and_then(|i| labels.label(i)) {
        Some(label) => geometry.dice_type.display_value(label),
        None => {
            log::warn!("Could not find the up face of a {}", geometry.dice_type);
            FACE_FAULT
        }
    }
}

/// Relabel `labels` so a die that naturally shows `natural` shows `desired`
/// instead. Out-of-range desired values (and faulted natural values) leave
/// the labels untouched; returns whether a relabel happened.
pub fn force_value(labels: &mut FaceLabels, desired: i32, natural: i32) -> bool {
    let dice_type = labels.dice_type;
    let Some(desired_label) = dice_type.label_for_value(desired) else {
        log::debug!("Ignoring desired {} for {}: out of range", desired, dice_type);
        return false;
    };
    let Some(natural_label) = dice_type.label_for_value(natural) else {
        log::debug!("Cannot relabel {} from unreadable value {}", dice_type, natural);
        return false;
    };

    let shift = dice_type.wrap_label(dice_type.face_range().0 + desired_label - natural_label)
        - dice_type.face_range().0;
    labels.shift(shift);
    true
}
