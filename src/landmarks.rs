//! The iBUG 68-point landmark convention.
//!
//! Indices 0-16 trace the jawline from the subject's right cheek (image left)
//! to the subject's left cheek (image right). The anchor extrapolation only
//! needs the two outermost points on each side, so those are given names here
//! instead of being scattered through the code as bare indices.

use crate::types::{BoundingBox, LandmarkSet, Point};

/// Number of points in a landmark set.
pub const LANDMARK_COUNT: usize = 68;

/// Landmark positions the placement pipeline reads by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkRole {
    /// Outermost jaw point on the image-left side (index 0).
    LeftCheekOuter,
    /// Second jaw point on the image-left side (index 1).
    LeftCheekInner,
    /// Second-to-last jaw point on the image-right side (index 15).
    RightCheekInner,
    /// Outermost jaw point on the image-right side (index 16).
    RightCheekOuter,
}

impl LandmarkRole {
    pub const fn index(self) -> usize {
        match self {
            LandmarkRole::LeftCheekOuter => 0,
            LandmarkRole::LeftCheekInner => 1,
            LandmarkRole::RightCheekInner => 15,
            LandmarkRole::RightCheekOuter => 16,
        }
    }
}

impl LandmarkSet {
    /// Point for a named role.
    pub fn role(&self, role: LandmarkRole) -> Point {
        self[role.index()]
    }
}

/// Approximate iBUG landmark positions in a unit face box, used when a
/// detector only reports boxes.
#[rustfmt::skip]
const MEAN_FACE: [(f32, f32); LANDMARK_COUNT] = [
    // jaw 0-16
    (0.10, 0.35), (0.11, 0.45), (0.12, 0.55), (0.14, 0.65), (0.18, 0.73),
    (0.24, 0.80), (0.32, 0.85), (0.41, 0.88), (0.50, 0.89), (0.59, 0.88),
    (0.68, 0.85), (0.76, 0.80), (0.82, 0.73), (0.86, 0.65), (0.88, 0.55),
    (0.89, 0.45), (0.90, 0.35),
    // brows 17-26
    (0.20, 0.26), (0.25, 0.22), (0.32, 0.21), (0.38, 0.23), (0.43, 0.27),
    (0.57, 0.27), (0.62, 0.23), (0.68, 0.21), (0.75, 0.22), (0.80, 0.26),
    // nose 27-35
    (0.50, 0.32), (0.50, 0.40), (0.50, 0.48), (0.50, 0.55),
    (0.40, 0.58), (0.45, 0.60), (0.50, 0.62), (0.55, 0.60), (0.60, 0.58),
    // eyes 36-47
    (0.24, 0.32), (0.28, 0.29), (0.34, 0.29), (0.38, 0.33), (0.34, 0.35), (0.28, 0.35),
    (0.62, 0.33), (0.66, 0.29), (0.72, 0.29), (0.76, 0.32), (0.72, 0.35), (0.66, 0.35),
    // lips 48-67
    (0.32, 0.72), (0.38, 0.68), (0.44, 0.66), (0.50, 0.67), (0.56, 0.66), (0.62, 0.68),
    (0.68, 0.72), (0.62, 0.78), (0.56, 0.80), (0.50, 0.81), (0.44, 0.80), (0.38, 0.78),
    (0.36, 0.72), (0.44, 0.70), (0.50, 0.70), (0.56, 0.70),
    (0.64, 0.72), (0.56, 0.74), (0.50, 0.75), (0.44, 0.74),
];

/// Place the mean face shape inside `bbox`.
///
/// The result is upright: it carries the box's size and position but no head
/// tilt.
pub fn mean_face_in(bbox: &BoundingBox) -> LandmarkSet {
    LandmarkSet::from_array(MEAN_FACE.map(|(x, y)| bbox.denormalize_point(Point::new(x, y))))
}
