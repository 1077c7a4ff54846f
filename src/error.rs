use thiserror::Error;

use crate::anchors::Side;
use crate::pipeline::PipelineState;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no face found in image")]
    NoFaceFound,

    #[error("degenerate landmarks: {side} cheek points coincide")]
    DegenerateLandmarks { side: Side },

    #[error("degenerate anchors: brim span is zero or not finite")]
    DegenerateAnchors,

    #[error("invalid landmark set: expected {expected} points, found {found}")]
    LandmarkCount { expected: usize, found: usize },

    #[error("prop asset misconfigured: {0}")]
    AssetConfiguration(String),

    #[error("face detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("face detection failed: {0}")]
    Detection(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("image must be at least 1x1, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("cannot {action} while pipeline is {state:?}")]
    InvalidState {
        state: PipelineState,
        action: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl Error {
    /// Whether the user should be told that no face was found.
    ///
    /// Degenerate landmarks and anchors are reported the same way as an empty
    /// detection.
    pub fn is_no_face(&self) -> bool {
        matches!(
            self,
            Error::NoFaceFound | Error::DegenerateLandmarks { .. } | Error::DegenerateAnchors
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
