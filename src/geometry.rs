//! Polyhedron geometry for each dice type
//!
//! Vertices are unit-normalized and scaled by the die radius. Each face
//! carries the label printed on it; blank faces (the second half of each d10
//! kite) have no label and never count as a result.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::dice::DiceType;

/// Marker for a face without a printed label in the raw tables
const BLANK: i32 = -1;

/// One polygonal face of a die
#[derive(Debug, Clone)]
pub struct Face {
    /// Indices into [`DieGeometry::vertices`]
    pub indices: Vec<usize>,
    /// Outward unit normal in body space
    pub normal: Vec3,
    /// Printed label, `None` for blank faces
    pub label: Option<i32>,
}

/// Body-space geometry of one die
#[derive(Debug, Clone)]
pub struct DieGeometry {
    pub dice_type: DiceType,
    /// Distance from the center to every vertex
    pub radius: f32,
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
}

impl DieGeometry {
    /// Build the geometry for `dice_type` at the given box scale
    pub fn new(dice_type: DiceType, scale: f32) -> Self {
        let radius = scale * dice_type.size_factor();
        let (raw_vertices, raw_faces) = match dice_type {
            DiceType::D4 => (d4_vertices(), D4_FACES),
            DiceType::D6 => (d6_vertices(), D6_FACES),
            DiceType::D8 => (d8_vertices(), D8_FACES),
            DiceType::D9 | DiceType::D10 | DiceType::D100 => (d10_vertices(), D10_FACES),
            DiceType::D12 => (d12_vertices(), D12_FACES),
            DiceType::D20 => (d20_vertices(), D20_FACES),
        };

        let vertices: Vec<Vec3> = raw_vertices
            .into_iter()
            .map(|v| v.normalize() * radius)
            .collect();

        let faces = raw_faces
            .iter()
            .map(|raw| {
                let (label, indices) = raw.split_last().map_or((BLANK, &[][..]), |(l, i)| (*l, i));
                let indices: Vec<usize> = indices.iter().map(|i| *i as usize).collect();
                let normal = outward_normal(&vertices, &indices);
                Face {
                    indices,
                    normal,
                    label: (label != BLANK).then_some(label),
                }
            })
            .collect();

        Self {
            dice_type,
            radius,
            vertices,
            faces,
        }
    }

    /// Faces that carry a label
    pub fn labeled_faces(&self) -> impl Iterator<Item = (usize, &Face)> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.label.is_some())
    }
}

/// Normal of a planar polygon, flipped if needed so it points away from the
/// body center
fn outward_normal(vertices: &[Vec3], indices: &[usize]) -> Vec3 {
    if indices.len() < 3 {
        return Vec3::ZERO;
    }
    let a = vertices[indices[0]];
    let b = vertices[indices[1]];
    let c = vertices[indices[2]];
    let normal = (b - a).cross(c - a).normalize_or_zero();

    let centroid = indices.iter().map(|i| vertices[*i]).sum::<Vec3>() / indices.len() as f32;
    if normal.dot(centroid) < 0.0 { -normal } else { normal }
}

fn d4_vertices() -> Vec<Vec3> {
    vec![
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
    ]
}

const D4_FACES: &[&[i32]] = &[&[1, 0, 2, 1], &[0, 1, 3, 2], &[0, 3, 2, 3], &[1, 2, 3, 4]];

fn d6_vertices() -> Vec<Vec3> {
    vec![
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
    ]
}

const D6_FACES: &[&[i32]] = &[
    &[0, 3, 2, 1, 1],
    &[1, 2, 6, 5, 2],
    &[0, 1, 5, 4, 3],
    &[3, 7, 6, 2, 4],
    &[0, 4, 7, 3, 5],
    &[4, 5, 6, 7, 6],
];

fn d8_vertices() -> Vec<Vec3> {
    vec![
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ]
}

const D8_FACES: &[&[i32]] = &[
    &[0, 2, 4, 1],
    &[0, 4, 3, 2],
    &[0, 3, 5, 3],
    &[0, 5, 2, 4],
    &[1, 3, 4, 5],
    &[1, 4, 2, 6],
    &[1, 2, 5, 7],
    &[1, 5, 3, 8],
];

/// Pentagonal trapezohedron: a zig-zag ring of ten vertices plus two poles
fn d10_vertices() -> Vec<Vec3> {
    let step = std::f32::consts::TAU / 10.0;
    let h = 0.105;
    let mut vertices: Vec<Vec3> = (0..10)
        .map(|i| {
            let b = step * i as f32;
            let z = if i % 2 == 1 { h } else { -h };
            Vec3::new(b.cos(), b.sin(), z)
        })
        .collect();
    vertices.push(Vec3::NEG_Z);
    vertices.push(Vec3::Z);
    vertices
}

const D10_FACES: &[&[i32]] = &[
    &[5, 7, 11, 0],
    &[4, 2, 10, 1],
    &[1, 3, 11, 2],
    &[0, 8, 10, 3],
    &[7, 9, 11, 4],
    &[8, 6, 10, 5],
    &[9, 1, 11, 6],
    &[2, 0, 10, 7],
    &[3, 5, 11, 8],
    &[6, 4, 10, 9],
    &[1, 0, 2, BLANK],
    &[1, 2, 3, BLANK],
    &[3, 2, 4, BLANK],
    &[3, 4, 5, BLANK],
    &[5, 4, 6, BLANK],
    &[5, 6, 7, BLANK],
    &[7, 6, 8, BLANK],
    &[7, 8, 9, BLANK],
    &[9, 8, 0, BLANK],
    &[9, 0, 1, BLANK],
];

fn d12_vertices() -> Vec<Vec3> {
    let p = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let q = 1.0 / p;
    vec![
        Vec3::new(0.0, q, p),
        Vec3::new(0.0, q, -p),
        Vec3::new(0.0, -q, p),
        Vec3::new(0.0, -q, -p),
        Vec3::new(p, 0.0, q),
        Vec3::new(p, 0.0, -q),
        Vec3::new(-p, 0.0, q),
        Vec3::new(-p, 0.0, -q),
        Vec3::new(q, p, 0.0),
        Vec3::new(q, -p, 0.0),
        Vec3::new(-q, p, 0.0),
        Vec3::new(-q, -p, 0.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, -1.0),
    ]
}

const D12_FACES: &[&[i32]] = &[
    &[2, 14, 4, 12, 0, 1],
    &[15, 9, 11, 19, 3, 2],
    &[16, 10, 17, 7, 6, 3],
    &[6, 7, 19, 11, 18, 4],
    &[6, 18, 2, 0, 16, 5],
    &[18, 11, 9, 14, 2, 6],
    &[1, 17, 10, 8, 13, 7],
    &[1, 13, 5, 15, 3, 8],
    &[13, 8, 12, 4, 5, 9],
    &[5, 4, 14, 9, 15, 10],
    &[0, 12, 8, 10, 16, 11],
    &[3, 19, 7, 17, 1, 12],
];

fn d20_vertices() -> Vec<Vec3> {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    vec![
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
}

const D20_FACES: &[&[i32]] = &[
    &[0, 11, 5, 1],
    &[0, 5, 1, 2],
    &[0, 1, 7, 3],
    &[0, 7, 10, 4],
    &[0, 10, 11, 5],
    &[1, 5, 9, 6],
    &[5, 11, 4, 7],
    &[11, 10, 2, 8],
    &[10, 7, 6, 9],
    &[7, 1, 8, 10],
    &[3, 9, 4, 11],
    &[3, 4, 2, 12],
    &[3, 2, 6, 13],
    &[3, 6, 8, 14],
    &[3, 8, 9, 15],
    &[4, 9, 5, 16],
    &[2, 4, 11, 17],
    &[6, 2, 10, 18],
    &[8, 6, 7, 19],
    &[9, 8, 1, 20],
];

/// Memoized per-type geometry, rebuilt only when the dice scale changes
#[derive(Debug, Clone)]
pub struct GeometryCache {
    scale: f32,
    entries: HashMap<DiceType, Arc<DieGeometry>>,
}

impl GeometryCache {
    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            entries: HashMap::new(),
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Geometry for `dice_type`, built on first use
    pub fn get(&mut self, dice_type: DiceType) -> Arc<DieGeometry> {
        let scale = self.scale;
        self.entries
            .entry(dice_type)
            .or_insert_with(|| Arc::new(DieGeometry::new(dice_type, scale)))
            .clone()
    }

    /// Change the scale; drops every cached entry if it actually changed.
    /// Returns whether the cache was invalidated.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        if (scale - self.scale).abs() <= f32::EPSILON * self.scale.abs().max(1.0) {
            return false;
        }
        log::debug!("Dice scale {} -> {}, dropping cached geometry", self.scale, scale);
        self.scale = scale;
        self.entries.clear();
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_face_counts_match_ranges() {
        for t in DiceType::ALL {
            let geom = DieGeometry::new(t, 100.0);
            let mut labels: Vec<i32> = geom.labeled_faces().filter_map(|(_, f)| f.label).collect();
            labels.sort_unstable();
            let (lo, hi) = t.face_range();
            let expected: Vec<i32> = (lo..=hi).collect();
            assert_eq!(labels, expected, "{t} labels");
        }
    }

    #[test]
    fn test_d10_has_blank_faces() {
        let geom = DieGeometry::new(DiceType::D10, 100.0);
        assert_eq!(geom.faces.len(), 20);
        assert_eq!(geom.faces.iter().filter(|f| f.label.is_none()).count(), 10);
    }

    #[test]
    fn test_normals_are_unit_and_outward() {
        for t in DiceType::ALL {
            let geom = DieGeometry::new(t, 50.0);
            for face in &geom.faces {
                assert!((face.normal.length() - 1.0).abs() < 1e-4, "{t} normal not unit");
                let centroid = face.indices.iter().map(|i| geom.vertices[*i]).sum::<Vec3>()
                    / face.indices.len() as f32;
                assert!(face.normal.dot(centroid) > 0.0, "{t} normal points inward");
            }
        }
    }

    #[test]
    fn test_vertices_lie_on_radius() {
        let geom = DieGeometry::new(DiceType::D12, 80.0);
        assert!((geom.radius - 72.0).abs() < 1e-4);
        for v in &geom.vertices {
            assert!((v.length() - geom.radius).abs() < 1e-3);
        }
    }

    #[test]
    fn test_cache_memoizes_and_invalidates_on_scale() {
        let mut cache = GeometryCache::new(100.0);
        let a = cache.get(DiceType::D6);
        let b = cache.get(DiceType::D6);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        assert!(!cache.set_scale(100.0));
        assert_eq!(cache.len(), 1);

        assert!(cache.set_scale(120.0));
        assert!(cache.is_empty());
        let c = cache.get(DiceType::D6);
        assert!(!Arc::ptr_eq(&a, &c));
        assert!((c.radius - 132.0).abs() < 1e-3);
    }
}
