//! # hatter
//!
//! Put a hat on every face in a photo.
//!
//! This crate provides:
//! - **Detection**: a [`FaceDetector`] capability with a multi-face pass and a
//!   best-single-face fallback ([`detect`])
//! - **Anchoring**: two brim anchors extrapolated from the jawline of the
//!   68-point landmark set ([`anchors`])
//! - **Placement**: the uniform scale + rotation that lays the prop's own
//!   brim points onto those anchors ([`solve`])
//! - **Scenes**: one placement per face plus an optional debug overlay,
//!   flattened into a single raster ([`build`], [`flatten`])
//! - **Sessions**: a [`Pipeline`] state machine that ignores detection results
//!   arriving for an image that has since been replaced or reset
//!
//! ## Algorithm Overview
//!
//! 1. Detect faces; if none pass the 0.5 confidence bar, accept the single
//!    best candidate at any confidence
//! 2. For each face, extend the outer cheek segments (landmarks 1→0 and
//!    15→16) outward by 1.5x their length to get the left and right anchors
//! 3. Scale the prop by `|face span| / |prop span|`, rotate it by the angle
//!    between the spans about its left brim point, and pin that point to the
//!    face's left anchor
//! 4. Draw the photo, then each prop in detection order, then (optionally)
//!    the debug overlay
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use hatter::{
//!     build, flatten, landmarks::mean_face_in, BoundingBox, DetectedFace, PropAsset,
//!     PropManifest, SourceImage,
//! };
//! use image::RgbaImage;
//!
//! let photo = SourceImage::new(RgbaImage::new(640, 480)).unwrap();
//! let hat = Arc::new(
//!     PropAsset::new("santa_hat", RgbaImage::new(1113, 846), &PropManifest::santa_hat()).unwrap(),
//! );
//!
//! // Faces normally come from a `FaceDetector`.
//! let bbox = BoundingBox::new(200.0, 150.0, 180.0, 200.0);
//! let face = DetectedFace::new(bbox, mean_face_in(&bbox), 0.9);
//!
//! let scene = build(&photo, &[face], &hat).unwrap();
//! let raster = flatten(&scene, false).unwrap();
//! assert_eq!(raster.dimensions(), (640, 480));
//! ```

pub mod anchors;
pub mod asset;
pub mod config;
pub mod detector;
mod error;
pub mod export;
mod glyphs;
pub mod landmarks;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod seeta;
pub mod sidecar;
pub mod transform;
mod types;

pub use anchors::{anchors, AnchorPair, Side};
pub use asset::{AssetLoader, DirAssetLoader, PropAsset, PropManifest, ReferenceAnchors};
pub use config::Settings;
pub use detector::{detect, DetectionPolicy, FaceDetector};
pub use error::{Error, Result};
pub use pipeline::{Completion, Generation, Pipeline, PipelineState};
pub use render::{flatten, Compositor, RasterCompositor};
pub use scene::{build, with_debug_layer, Scene};
pub use seeta::{SeetaDetector, SeetaOptions};
pub use sidecar::SidecarDetector;
pub use transform::{solve, PlacementTransform};
pub use types::{BoundingBox, DetectedFace, LandmarkSet, Point, SourceImage};
