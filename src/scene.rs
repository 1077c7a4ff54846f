//! The layered scene for one image: base photo, one prop per face, and an
//! optional debug overlay.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::anchors::{anchors, AnchorPair};
use crate::asset::PropAsset;
use crate::error::{Error, Result};
use crate::transform::{solve, PlacementTransform};
use crate::types::{BoundingBox, DetectedFace, Point, SourceImage};

/// One prop laid onto one face.
#[derive(Debug, Clone)]
pub struct Placement {
    /// Position of the face in detection order.
    pub face_index: usize,
    pub anchors: AnchorPair,
    pub transform: PlacementTransform,
    pub prop: Arc<PropAsset>,
}

/// A single debug annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugMark {
    FaceBox(BoundingBox),
    /// A landmark point with its index in the landmark set.
    Landmark { point: Point, index: usize },
    /// A brim anchor labelled `L<face>` or `R<face>`.
    Anchor { point: Point, label: String },
}

/// Annotations drawn over the props when debugging is visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugLayer {
    pub marks: Vec<DebugMark>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    base: SourceImage,
    placements: Vec<Placement>,
    debug: Option<DebugLayer>,
}

impl Scene {
    pub fn base(&self) -> &SourceImage {
        &self.base
    }

    /// Placements in draw order: later entries cover earlier ones.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn debug_layer(&self) -> Option<&DebugLayer> {
        self.debug.as_ref()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.base.width(), self.base.height())
    }
}

/// Place `prop` on every face, in detection order.
///
/// Any face whose anchors cannot be computed fails the whole build; there is
/// no partially hatted scene.
pub fn build(image: &SourceImage, faces: &[DetectedFace], prop: &Arc<PropAsset>) -> Result<Scene> {
    let mut placements = Vec::with_capacity(faces.len());
    for (face_index, face) in faces.iter().enumerate() {
        let anchors = anchors(face).inspect_err(|err| {
            warn!(face = face_index, error = %err, "cannot anchor prop to face");
        })?;
        let transform = solve(&anchors, prop.anchors());
        if !transform.is_invertible() {
            warn!(face = face_index, scale = transform.scale, "prop scale out of range");
            return Err(Error::DegenerateAnchors);
        }
        debug!(
            face = face_index,
            scale = transform.scale,
            rotation = transform.rotation,
            "placed prop"
        );
        placements.push(Placement {
            face_index,
            anchors,
            transform,
            prop: Arc::clone(prop),
        });
    }

    Ok(Scene {
        base: image.clone(),
        placements,
        debug: None,
    })
}

/// Add the debug overlay for `faces`: each face's box, every landmark with its
/// index, and both brim anchors.
///
/// Placements are left untouched.
pub fn with_debug_layer(mut scene: Scene, faces: &[DetectedFace]) -> Result<Scene> {
    let mut layer = scene.debug.take().unwrap_or_default();
    for (face_index, face) in faces.iter().enumerate() {
        layer.marks.push(DebugMark::FaceBox(face.bbox));
        layer.marks.extend(
            face.landmarks
                .points()
                .iter()
                .enumerate()
                .map(|(index, &point)| DebugMark::Landmark { point, index }),
        );

        let pair = anchors(face)?;
        layer.marks.push(DebugMark::Anchor {
            point: pair.left,
            label: format!("L{face_index}"),
        });
        layer.marks.push(DebugMark::Anchor {
            point: pair.right,
            label: format!("R{face_index}"),
        });
    }
    scene.debug = Some(layer);
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::PropManifest;
    use crate::landmarks::mean_face_in;
    use image::RgbaImage;

    fn prop() -> Arc<PropAsset> {
        Arc::new(
            PropAsset::new("hat", RgbaImage::new(1113, 846), &PropManifest::santa_hat()).unwrap(),
        )
    }

    fn face_at(x: f32, y: f32, size: f32) -> DetectedFace {
        let bbox = BoundingBox::new(x, y, size, size);
        DetectedFace::new(bbox, mean_face_in(&bbox), 0.9)
    }

    fn image() -> SourceImage {
        SourceImage::new(RgbaImage::new(400, 300)).unwrap()
    }

    #[test]
    fn each_face_matches_its_independent_transform() {
        let prop = prop();
        let faces = vec![face_at(20.0, 50.0, 100.0), face_at(220.0, 80.0, 140.0)];
        let scene = build(&image(), &faces, &prop).unwrap();

        assert_eq!(scene.placements().len(), 2);
        for (i, face) in faces.iter().enumerate() {
            let alone = build(&image(), std::slice::from_ref(face), &prop).unwrap();
            let placement = &scene.placements()[i];
            assert_eq!(placement.face_index, i);
            assert_eq!(placement.transform, alone.placements()[0].transform);
            assert_eq!(placement.anchors, alone.placements()[0].anchors);
        }
    }

    #[test]
    fn placements_share_one_prop() {
        let prop = prop();
        let faces = vec![face_at(0.0, 0.0, 50.0), face_at(100.0, 0.0, 50.0)];
        let scene = build(&image(), &faces, &prop).unwrap();
        for placement in scene.placements() {
            assert!(Arc::ptr_eq(&placement.prop, &prop));
        }
    }

    #[test]
    fn one_degenerate_face_fails_the_build() {
        let good = face_at(0.0, 0.0, 80.0);
        let mut points = good.landmarks.points().to_vec();
        points[1] = points[0];
        let bad = DetectedFace::new(
            good.bbox,
            crate::types::LandmarkSet::new(points).unwrap(),
            0.9,
        );

        let err = build(&image(), &[good, bad], &prop()).unwrap_err();
        assert!(matches!(err, Error::DegenerateLandmarks { .. }));
    }

    #[test]
    fn coincident_anchors_fail_the_build() {
        let good = face_at(0.0, 0.0, 80.0);
        let mut points = good.landmarks.points().to_vec();
        points[0] = Point::new(10.0, 0.0);
        points[1] = Point::new(12.0, 0.0);
        points[15] = Point::new(2.0, 0.0);
        points[16] = Point::new(4.0, 0.0);
        let bad = DetectedFace::new(
            good.bbox,
            crate::types::LandmarkSet::new(points).unwrap(),
            0.9,
        );

        let err = build(&image(), &[good, bad], &prop()).unwrap_err();
        assert!(matches!(err, Error::DegenerateAnchors));
    }

    #[test]
    fn unmeasurable_scale_fails_the_build() {
        let tiny = PropManifest {
            image: "speck.png".into(),
            width: 1,
            height: 1,
            left: Point::new(0.0, 0.0),
            right: Point::new(1.0e-38, 0.0),
        };
        let speck = Arc::new(PropAsset::new("speck", RgbaImage::new(1, 1), &tiny).unwrap());

        let err = build(&image(), &[face_at(20.0, 50.0, 100.0)], &speck).unwrap_err();
        assert!(matches!(err, Error::DegenerateAnchors));
    }

    #[test]
    fn debug_layer_lists_boxes_landmarks_and_anchors() {
        let faces = vec![face_at(20.0, 50.0, 100.0), face_at(220.0, 80.0, 140.0)];
        let scene = build(&image(), &faces, &prop()).unwrap();
        let before: Vec<PlacementTransform> =
            scene.placements().iter().map(|p| p.transform).collect();

        let scene = with_debug_layer(scene, &faces).unwrap();
        let layer = scene.debug_layer().unwrap();
        assert_eq!(layer.marks.len(), 2 * (1 + 68 + 2));

        assert_eq!(layer.marks[0], DebugMark::FaceBox(faces[0].bbox));
        assert!(matches!(layer.marks[1], DebugMark::Landmark { index: 0, .. }));
        assert!(matches!(layer.marks[68], DebugMark::Landmark { index: 67, .. }));
        let labels: Vec<&str> = layer
            .marks
            .iter()
            .filter_map(|m| match m {
                DebugMark::Anchor { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["L0", "R0", "L1", "R1"]);

        let after: Vec<PlacementTransform> =
            scene.placements().iter().map(|p| p.transform).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn empty_face_list_builds_empty_scene() {
        let scene = build(&image(), &[], &prop()).unwrap();
        assert!(scene.placements().is_empty());
        assert_eq!(scene.dimensions(), (400, 300));
    }
}
