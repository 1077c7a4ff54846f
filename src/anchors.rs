//! Hat brim anchors extrapolated from the jawline.
//!
//! The two outermost jaw points on each side run roughly up the cheek toward
//! the temple. Continuing that line outward by one and a half segment lengths
//! lands close to where a hat brim sits, whatever the head tilt.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::landmarks::LandmarkRole;
use crate::types::{DetectedFace, LandmarkSet, Point};

/// How far past the outer cheek point the anchor is pushed, in multiples of
/// the outer cheek segment length.
pub const EXTRAPOLATION_FACTOR: f32 = 1.5;

/// Which cheek of the face, as seen in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Left and right placement anchors in image space.
///
/// `left.x < right.x` holds for an upright, front-facing face but is not
/// checked; a mirrored landmark set yields anchors that rotate the prop by
/// roughly half a turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnchorPair {
    pub left: Point,
    pub right: Point,
}

impl AnchorPair {
    pub const fn new(left: Point, right: Point) -> Self {
        Self { left, right }
    }

    /// Vector from the left anchor to the right anchor.
    pub fn span(&self) -> Point {
        self.right - self.left
    }
}

/// Compute the brim anchors for one detected face.
///
/// Fails with [`Error::DegenerateLandmarks`] when either cheek segment has
/// zero length or a cheek point is not finite, and with
/// [`Error::DegenerateAnchors`] when the two anchors coincide or are too far
/// apart to measure. A returned pair always has a finite, non-zero span.
pub fn anchors(face: &DetectedFace) -> Result<AnchorPair> {
    anchors_from_landmarks(&face.landmarks)
}

pub fn anchors_from_landmarks(landmarks: &LandmarkSet) -> Result<AnchorPair> {
    let left = extrapolate(
        landmarks.role(LandmarkRole::LeftCheekOuter),
        landmarks.role(LandmarkRole::LeftCheekInner),
        Side::Left,
    )?;
    let right = extrapolate(
        landmarks.role(LandmarkRole::RightCheekOuter),
        landmarks.role(LandmarkRole::RightCheekInner),
        Side::Right,
    )?;
    let pair = AnchorPair { left, right };
    let span = pair.span().length();
    if !span.is_finite() || span == 0.0 {
        return Err(Error::DegenerateAnchors);
    }
    Ok(pair)
}

/// Extend the segment `inner -> outer` past `outer`.
fn extrapolate(outer: Point, inner: Point, side: Side) -> Result<Point> {
    let direction = outer - inner;
    if !outer.is_finite() || !inner.is_finite() || direction.length() == 0.0 {
        return Err(Error::DegenerateLandmarks { side });
    }

    let anchor = outer + direction * EXTRAPOLATION_FACTOR;
    if !anchor.is_finite() {
        return Err(Error::DegenerateLandmarks { side });
    }
    Ok(anchor)
}
