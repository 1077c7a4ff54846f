//! SeetaFace frontal detector via `rustface`.
//!
//! SeetaFace reports boxes only, so each box gets the mean 68-point face
//! fitted into it. The hat then follows the box's size and position but not
//! head tilt.

use std::cell::RefCell;
use std::path::PathBuf;

use async_trait::async_trait;
use rustface::{Detector, ImageData};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detector::FaceDetector;
use crate::error::{Error, Result};
use crate::landmarks::mean_face_in;
use crate::types::{BoundingBox, DetectedFace, SourceImage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeetaOptions {
    pub model: PathBuf,
    pub min_face_size: u32,
    /// Raw score floor handed to the detector. Kept low so that weak
    /// candidates still reach the single-face fallback.
    pub score_thresh: f64,
    /// Raw score that maps to confidence 0.5.
    pub confidence_pivot: f64,
    pub pyramid_scale_factor: f32,
    pub slide_window_step: u32,
}

impl Default for SeetaOptions {
    fn default() -> Self {
        Self {
            model: PathBuf::from("seeta_fd_frontal_v1.0.bin"),
            min_face_size: 20,
            score_thresh: 0.0,
            confidence_pivot: 2.0,
            pyramid_scale_factor: 0.8,
            slide_window_step: 4,
        }
    }
}

pub struct SeetaDetector {
    inner: RefCell<Box<dyn Detector>>,
    confidence_pivot: f64,
}

impl SeetaDetector {
    pub fn new(options: &SeetaOptions) -> Result<Self> {
        let model = options.model.to_str().ok_or_else(|| {
            Error::DetectorUnavailable(format!("invalid model path {:?}", options.model))
        })?;
        let mut detector = rustface::create_detector(model).map_err(|e| {
            Error::DetectorUnavailable(format!("failed to load {}: {}", model, e))
        })?;
        detector.set_min_face_size(options.min_face_size);
        detector.set_score_thresh(options.score_thresh);
        detector.set_pyramid_scale_factor(options.pyramid_scale_factor);
        detector.set_slide_window_step(options.slide_window_step, options.slide_window_step);

        Ok(Self {
            inner: RefCell::new(detector),
            confidence_pivot: options.confidence_pivot,
        })
    }

    /// Run the detector and return faces with confidences, in detector order.
    fn run(&self, image: &SourceImage) -> Vec<DetectedFace> {
        let gray = image::imageops::grayscale(image.pixels());
        let data = ImageData::new(gray.as_raw(), gray.width(), gray.height());
        let found = self.inner.borrow_mut().detect(&data);
        debug!(candidates = found.len(), "seeta detection finished");

        found
            .iter()
            .map(|info| {
                let rect = info.bbox();
                let bbox = BoundingBox::new(
                    rect.x() as f32,
                    rect.y() as f32,
                    rect.width() as f32,
                    rect.height() as f32,
                );
                let score = score_to_confidence(info.score(), self.confidence_pivot);
                DetectedFace::new(bbox, mean_face_in(&bbox), score)
            })
            .collect()
    }
}

/// Logistic squashing of an unbounded SeetaFace score into (0, 1).
fn score_to_confidence(score: f64, pivot: f64) -> f32 {
    (1.0 / (1.0 + (pivot - score).exp())) as f32
}

#[async_trait(?Send)]
impl FaceDetector for SeetaDetector {
    async fn detect_all(
        &self,
        image: &SourceImage,
        min_confidence: f32,
    ) -> Result<Vec<DetectedFace>> {
        let mut faces = self.run(image);
        faces.retain(|face| face.score >= min_confidence);
        Ok(faces)
    }

    async fn detect_best(
        &self,
        image: &SourceImage,
        min_confidence: f32,
    ) -> Result<Option<DetectedFace>> {
        Ok(self
            .run(image)
            .into_iter()
            .filter(|face| face.score >= min_confidence)
            .max_by(|a, b| a.score.total_cmp(&b.score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_score_is_even_odds() {
        assert!((score_to_confidence(2.0, 2.0) - 0.5).abs() < 1e-6);
        assert!(score_to_confidence(10.0, 2.0) > 0.99);
        assert!(score_to_confidence(-10.0, 2.0) < 0.01);
        assert!(score_to_confidence(-10.0, 2.0) > 0.0);
    }

    #[test]
    fn missing_model_is_unavailable() {
        let options = SeetaOptions {
            model: PathBuf::from("/nonexistent/seeta.bin"),
            ..SeetaOptions::default()
        };
        assert!(matches!(
            SeetaDetector::new(&options),
            Err(Error::DetectorUnavailable(_))
        ));
    }
}
