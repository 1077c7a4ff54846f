//! Rigid scale + rotation placement of a prop onto a face.

use serde::Serialize;

use crate::anchors::AnchorPair;
use crate::asset::ReferenceAnchors;
use crate::types::Point;

/// How a prop asset is laid onto one face.
///
/// The prop is scaled uniformly by `scale` and rotated by `rotation` about
/// `pivot` (asset space), and the pivot is then moved to `translation`
/// (image space).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementTransform {
    pub scale: f32,
    /// Radians, positive turning +x toward +y.
    pub rotation: f32,
    pub pivot: Point,
    pub translation: Point,
}

impl PlacementTransform {
    /// Map a point from asset space into image space.
    pub fn apply(&self, asset_point: Point) -> Point {
        self.translation + ((asset_point - self.pivot) * self.scale).rotated(self.rotation)
    }

    /// Map a point from image space back into asset space.
    ///
    /// Returns `None` when the scale is zero or not finite.
    pub fn invert(&self, image_point: Point) -> Option<Point> {
        if !self.is_invertible() {
            return None;
        }
        let local = (image_point - self.translation).rotated(-self.rotation) * (1.0 / self.scale);
        Some(self.pivot + local)
    }

    pub fn is_invertible(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0 && self.rotation.is_finite()
    }
}

/// Solve the placement that lands the prop's left reference anchor exactly on
/// the face's left anchor and lines the brim up with the face anchor span.
///
/// The right anchor matches only as far as a rigid scale and rotation allows.
pub fn solve(face: &AnchorPair, prop: &ReferenceAnchors) -> PlacementTransform {
    let face_span = face.span();
    let prop_span = prop.span();

    PlacementTransform {
        scale: face_span.length() / prop_span.length(),
        rotation: face_span.angle() - prop_span.angle(),
        pivot: prop.left(),
        translation: face.left,
    }
}
