//! Detector that replays detections stored in a JSON file.
//!
//! Useful when faces and landmarks come from another tool, and for tests. The
//! file looks like:
//!
//! ```json
//! {
//!   "faces": [
//!     {
//!       "score": 0.97,
//!       "bbox": { "x": 120, "y": 80, "width": 200, "height": 220 },
//!       "landmarks": [ { "x": 130.5, "y": 150.0 }, ... 68 points ... ]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detector::FaceDetector;
use crate::error::Result;
use crate::types::{DetectedFace, SourceImage};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidecarFile {
    pub faces: Vec<DetectedFace>,
}

/// Serves a fixed list of faces regardless of the image it is given.
#[derive(Debug, Clone, Default)]
pub struct SidecarDetector {
    faces: Vec<DetectedFace>,
}

impl SidecarDetector {
    pub fn new(faces: Vec<DetectedFace>) -> Self {
        Self { faces }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: SidecarFile = serde_json::from_str(text)?;
        Ok(Self::new(file.faces))
    }

    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let detector = Self::from_json(&text)?;
        debug!(
            path = %path.as_ref().display(),
            faces = detector.faces.len(),
            "loaded sidecar detections"
        );
        Ok(detector)
    }
}

#[async_trait(?Send)]
impl FaceDetector for SidecarDetector {
    async fn detect_all(
        &self,
        _image: &SourceImage,
        min_confidence: f32,
    ) -> Result<Vec<DetectedFace>> {
        Ok(self
            .faces
            .iter()
            .filter(|face| face.score >= min_confidence)
            .cloned()
            .collect())
    }

    async fn detect_best(
        &self,
        _image: &SourceImage,
        min_confidence: f32,
    ) -> Result<Option<DetectedFace>> {
        Ok(self
            .faces
            .iter()
            .filter(|face| face.score >= min_confidence)
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::mean_face_in;
    use crate::types::BoundingBox;
    use image::RgbaImage;

    fn face(x: f32, score: f32) -> DetectedFace {
        let bbox = BoundingBox::new(x, 0.0, 30.0, 30.0);
        DetectedFace::new(bbox, mean_face_in(&bbox), score)
    }

    fn image() -> SourceImage {
        SourceImage::new(RgbaImage::new(4, 4)).unwrap()
    }

    #[tokio::test]
    async fn filters_by_confidence_in_file_order() {
        let detector = SidecarDetector::new(vec![face(0.0, 0.6), face(40.0, 0.2), face(80.0, 0.9)]);
        let faces = detector.detect_all(&image(), 0.5).await.unwrap();
        let xs: Vec<f32> = faces.iter().map(|f| f.bbox.x).collect();
        assert_eq!(xs, vec![0.0, 80.0]);
    }

    #[tokio::test]
    async fn best_picks_highest_score() {
        let detector = SidecarDetector::new(vec![face(0.0, 0.3), face(40.0, 0.4), face(80.0, 0.1)]);
        let best = detector.detect_best(&image(), 0.05).await.unwrap().unwrap();
        assert_eq!(best.bbox.x, 40.0);

        assert!(detector.detect_best(&image(), 0.5).await.unwrap().is_none());
    }

    #[test]
    fn parses_json_and_defaults_score() {
        let bbox = BoundingBox::new(5.0, 6.0, 50.0, 60.0);
        let landmarks = serde_json::to_string(&mean_face_in(&bbox)).unwrap();
        let text = format!(
            r#"{{"faces": [{{"bbox": {{"x": 5, "y": 6, "width": 50, "height": 60}}, "landmarks": {landmarks}}}]}}"#
        );

        let detector = SidecarDetector::from_json(&text).unwrap();
        assert_eq!(detector.faces.len(), 1);
        assert_eq!(detector.faces[0].score, 1.0);
        assert_eq!(detector.faces[0].bbox, bbox);
    }

    #[test]
    fn rejects_wrong_landmark_count() {
        let text = r#"{"faces": [{"bbox": {"x": 0, "y": 0, "width": 1, "height": 1}, "landmarks": [{"x": 0, "y": 0}]}]}"#;
        assert!(SidecarDetector::from_json(text).is_err());
    }
}
