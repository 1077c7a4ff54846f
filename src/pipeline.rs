//! Session state machine.
//!
//! ```text
//! AwaitingAssets --load_assets--> Idle --begin--> Detecting --complete--> Ready
//!                                                     |                    |
//!                                                     +------> Error <-----+ (export failure)
//! Ready/Error --reset--> Idle
//! ```
//!
//! Every image gets a new [`Generation`]. Detection runs detached from the
//! pipeline as a [`DetectionJob`], and its [`DetectionReport`] is only applied
//! if its generation is still the current one; a report that outlives a reset
//! or a newer image is dropped.

use std::rc::Rc;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::asset::{AssetLoader, PropAsset};
use crate::detector::{detect, DetectionPolicy, FaceDetector};
use crate::error::{Error, Result};
use crate::render::{Compositor, RasterCompositor};
use crate::scene::{build, with_debug_layer, Scene};
use crate::types::{DetectedFace, SourceImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No image loaded.
    Idle,
    /// Prop and detector assets not yet available.
    AwaitingAssets,
    /// Detection in flight for the current image.
    Detecting,
    /// Scene built; export may be requested any number of times.
    Ready,
    /// The current session failed. Reset or load a new image to continue.
    Error,
}

/// Identifies one image session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Outcome of applying a detection report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The scene for the current image is built.
    Ready { faces: usize },
    /// The report belonged to a session that no longer exists.
    Discarded,
}

/// Detection for one session, runnable without borrowing the pipeline.
pub struct DetectionJob<D: ?Sized> {
    generation: Generation,
    image: SourceImage,
    detector: Rc<D>,
    policy: DetectionPolicy,
}

impl<D: FaceDetector + ?Sized> DetectionJob<D> {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub async fn run(self) -> DetectionReport {
        let result = detect(self.detector.as_ref(), &self.image, &self.policy).await;
        DetectionReport {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct DetectionReport {
    pub generation: Generation,
    pub result: Result<Vec<DetectedFace>>,
}

struct Session {
    generation: Generation,
    image: SourceImage,
    faces: Vec<DetectedFace>,
    scene: Option<Scene>,
}

pub struct Pipeline<D: ?Sized, C = RasterCompositor> {
    detector: Rc<D>,
    policy: DetectionPolicy,
    compositor: C,
    prop: Option<Arc<PropAsset>>,
    state: PipelineState,
    last_generation: u64,
    session: Option<Session>,
}

impl<D: FaceDetector + ?Sized> Pipeline<D, RasterCompositor> {
    pub fn new(detector: Rc<D>, policy: DetectionPolicy) -> Self {
        Self::with_compositor(detector, policy, RasterCompositor::default())
    }
}

impl<D: FaceDetector + ?Sized, C: Compositor> Pipeline<D, C> {
    pub fn with_compositor(detector: Rc<D>, policy: DetectionPolicy, compositor: C) -> Self {
        Self {
            detector,
            policy,
            compositor,
            prop: None,
            state: PipelineState::AwaitingAssets,
            last_generation: 0,
            session: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Generation of the current session, if one exists.
    pub fn generation(&self) -> Option<Generation> {
        self.session.as_ref().map(|s| s.generation)
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.session.as_ref().and_then(|s| s.scene.as_ref())
    }

    pub fn faces(&self) -> &[DetectedFace] {
        self.session
            .as_ref()
            .map(|s| s.faces.as_slice())
            .unwrap_or_default()
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.session.as_ref().map(|s| &s.image)
    }

    pub fn prop(&self) -> Option<&Arc<PropAsset>> {
        self.prop.as_ref()
    }

    /// Load the prop once for the life of the pipeline.
    ///
    /// A failure leaves the pipeline in `Error` with no prop. After a
    /// [`reset`](Self::reset) it is back in `AwaitingAssets`.
    pub async fn load_assets<L>(&mut self, loader: &L, prop_id: &str) -> Result<()>
    where
        L: AssetLoader + ?Sized,
    {
        if self.state != PipelineState::AwaitingAssets {
            return Err(self.invalid("load assets"));
        }
        match loader.load(prop_id).await {
            Ok(prop) => {
                self.prop = Some(prop);
                self.state = PipelineState::Idle;
                info!(prop = prop_id, "assets ready");
                Ok(())
            }
            Err(err) => {
                warn!(prop = prop_id, error = %err, "asset load failed");
                self.state = PipelineState::Error;
                Err(err)
            }
        }
    }

    /// Start a session for `image`, releasing any previous one.
    ///
    /// The returned job must be run and its report passed to
    /// [`complete`](Self::complete).
    pub fn begin(&mut self, image: SourceImage) -> Result<DetectionJob<D>> {
        if self.prop.is_none() {
            return Err(self.invalid("load an image"));
        }

        self.session = None;
        self.last_generation += 1;
        let generation = Generation(self.last_generation);
        self.session = Some(Session {
            generation,
            image: image.clone(),
            faces: Vec::new(),
            scene: None,
        });
        self.state = PipelineState::Detecting;
        debug!(
            generation = generation.0,
            width = image.width(),
            height = image.height(),
            "session started"
        );

        Ok(DetectionJob {
            generation,
            image,
            detector: Rc::clone(&self.detector),
            policy: self.policy,
        })
    }

    /// Apply a finished detection to its session.
    pub fn complete(&mut self, report: DetectionReport) -> Result<Completion> {
        let current = self.generation();
        if current != Some(report.generation) || self.state != PipelineState::Detecting {
            debug!(
                generation = report.generation.0,
                current = ?current.map(|g| g.0),
                "discarding stale detection result"
            );
            return Ok(Completion::Discarded);
        }

        match self.place(report.result) {
            Ok(faces) => {
                self.state = PipelineState::Ready;
                info!(generation = report.generation.0, faces, "scene ready");
                Ok(Completion::Ready { faces })
            }
            Err(err) => {
                warn!(generation = report.generation.0, error = %err, "session failed");
                self.state = PipelineState::Error;
                Err(err)
            }
        }
    }

    fn place(&mut self, result: Result<Vec<DetectedFace>>) -> Result<usize> {
        let faces = result?;
        let (Some(prop), Some(session)) = (self.prop.as_ref(), self.session.as_mut()) else {
            return Err(Error::InvalidState {
                state: self.state,
                action: "build scene",
            });
        };
        let scene = build(&session.image, &faces, prop)?;
        let scene = with_debug_layer(scene, &faces)?;
        let count = faces.len();
        session.faces = faces;
        session.scene = Some(scene);
        Ok(count)
    }

    /// Begin, detect and complete in one call.
    pub async fn process(&mut self, image: SourceImage) -> Result<Completion> {
        let job = self.begin(image)?;
        let report = job.run().await;
        self.complete(report)
    }

    /// Drop the current image and scene.
    pub fn reset(&mut self) {
        self.session = None;
        self.state = if self.prop.is_some() {
            PipelineState::Idle
        } else {
            PipelineState::AwaitingAssets
        };
        debug!(state = ?self.state, "pipeline reset");
    }

    /// Flatten the current scene. Does not change state unless rendering fails.
    pub fn export(&mut self, debug_visible: bool) -> Result<RgbaImage> {
        if self.state != PipelineState::Ready {
            return Err(self.invalid("export"));
        }
        let Some(scene) = self.scene() else {
            return Err(self.invalid("export"));
        };
        let (width, height) = scene.dimensions();
        match self.compositor.compose(scene, width, height, debug_visible) {
            Ok(raster) => Ok(raster),
            Err(err) => {
                warn!(error = %err, "export failed");
                self.state = PipelineState::Error;
                Err(err)
            }
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidState {
            state: self.state,
            action,
        }
    }
}
