//! Face detector capability and the two-step detection policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{DetectedFace, SourceImage};

/// Something that can find faces and their 68 landmarks in an image.
///
/// The pipeline runs on a single thread and suspends at each call, so
/// implementations need not be `Send`.
#[async_trait(?Send)]
pub trait FaceDetector {
    /// Every face whose confidence is at least `min_confidence`, in detection order.
    async fn detect_all(
        &self,
        image: &SourceImage,
        min_confidence: f32,
    ) -> Result<Vec<DetectedFace>>;

    /// The single most confident face meeting `min_confidence`, if any.
    async fn detect_best(
        &self,
        image: &SourceImage,
        min_confidence: f32,
    ) -> Result<Option<DetectedFace>>;
}

/// Confidence thresholds for [`detect`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionPolicy {
    /// Threshold for the multi-face pass.
    pub multi_face_min_confidence: f32,
    /// Threshold for the single-face fallback.
    pub fallback_min_confidence: f32,
}

impl DetectionPolicy {
    pub const MULTI_FACE_MIN_CONFIDENCE: f32 = 0.5;

    /// Smallest positive `f32`: the fallback accepts any candidate at all.
    pub fn lowest_confidence() -> f32 {
        f32::from_bits(1)
    }
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            multi_face_min_confidence: Self::MULTI_FACE_MIN_CONFIDENCE,
            fallback_min_confidence: Self::lowest_confidence(),
        }
    }
}

/// Find the faces to hat.
///
/// Multi-face detection runs first. Only when it finds nothing does a single
/// best-candidate pass run at the fallback threshold. If that finds nothing
/// either, the result is [`Error::NoFaceFound`]. There are no further retries.
pub async fn detect<D>(
    detector: &D,
    image: &SourceImage,
    policy: &DetectionPolicy,
) -> Result<Vec<DetectedFace>>
where
    D: FaceDetector + ?Sized,
{
    let faces = detector
        .detect_all(image, policy.multi_face_min_confidence)
        .await?;
    if !faces.is_empty() {
        info!(faces = faces.len(), "multi-face detection succeeded");
        return Ok(faces);
    }

    debug!(
        min_confidence = policy.fallback_min_confidence,
        "multi-face detection found nothing, falling back to best single face"
    );
    match detector
        .detect_best(image, policy.fallback_min_confidence)
        .await?
    {
        Some(face) => {
            info!(score = face.score, "fallback detection found one face");
            Ok(vec![face])
        }
        None => {
            info!("no face found");
            Err(Error::NoFaceFound)
        }
    }
}
