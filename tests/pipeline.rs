//! End-to-end tests: stock prop from `assets/`, scripted detector, full session.

use std::path::PathBuf;
use std::rc::Rc;

use async_trait::async_trait;
use hatter::{
    anchors, build, flatten, landmarks::mean_face_in, solve, AssetLoader, BoundingBox, Completion,
    DetectedFace, DetectionPolicy, DirAssetLoader, Error, FaceDetector, LandmarkSet, Pipeline,
    PipelineState, Point, SourceImage,
};
use image::{Rgba, RgbaImage};

fn assets_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets")
}

fn photo() -> SourceImage {
    SourceImage::new(RgbaImage::from_pixel(640, 480, Rgba([90, 120, 150, 255]))).unwrap()
}

fn face_at(x: f32, y: f32, size: f32, score: f32) -> DetectedFace {
    let bbox = BoundingBox::new(x, y, size, size * 1.1);
    DetectedFace::new(bbox, mean_face_in(&bbox), score)
}

/// Returns canned answers for each detection pass.
struct Scripted {
    all: Vec<DetectedFace>,
    best: Option<DetectedFace>,
}

#[async_trait(?Send)]
impl FaceDetector for Scripted {
    async fn detect_all(
        &self,
        _image: &SourceImage,
        min_confidence: f32,
    ) -> hatter::Result<Vec<DetectedFace>> {
        Ok(self
            .all
            .iter()
            .filter(|f| f.score >= min_confidence)
            .cloned()
            .collect())
    }

    async fn detect_best(
        &self,
        _image: &SourceImage,
        min_confidence: f32,
    ) -> hatter::Result<Option<DetectedFace>> {
        Ok(self.best.clone().filter(|f| f.score >= min_confidence))
    }
}

async fn ready_pipeline(detector: Scripted) -> Pipeline<Scripted> {
    let mut pipeline = Pipeline::new(Rc::new(detector), DetectionPolicy::default());
    pipeline
        .load_assets(&DirAssetLoader::new(assets_dir()), "santa_hat")
        .await
        .unwrap();
    pipeline
}

#[tokio::test]
async fn stock_santa_hat_loads() {
    let prop = DirAssetLoader::new(assets_dir())
        .load("santa_hat")
        .await
        .unwrap();
    assert_eq!(prop.image().dimensions(), (1113, 846));
    assert_eq!(prop.anchors().left(), Point::new(240.0, 557.0));
    assert_eq!(prop.anchors().right(), Point::new(855.0, 563.0));
}

#[tokio::test]
async fn low_confidence_face_is_hatted_by_fallback() {
    let weak = face_at(200.0, 150.0, 180.0, 0.05);
    let mut pipeline = ready_pipeline(Scripted {
        all: vec![weak.clone()],
        best: Some(weak),
    })
    .await;

    let completion = pipeline.process(photo()).await.unwrap();
    assert_eq!(completion, Completion::Ready { faces: 1 });
    assert_eq!(pipeline.state(), PipelineState::Ready);

    let raster = pipeline.export(false).unwrap();
    assert_eq!(raster.dimensions(), (640, 480));
    assert_ne!(&raster, photo().pixels());
}

#[tokio::test]
async fn no_face_ends_in_error_state() {
    let mut pipeline = ready_pipeline(Scripted {
        all: Vec::new(),
        best: None,
    })
    .await;

    let err = pipeline.process(photo()).await.unwrap_err();
    assert!(matches!(err, Error::NoFaceFound));
    assert!(err.is_no_face());
    assert_eq!(pipeline.state(), PipelineState::Error);
    assert!(pipeline.scene().is_none());
    assert!(pipeline.export(false).is_err());

    pipeline.reset();
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[tokio::test]
async fn every_face_gets_its_own_placement() {
    let faces = vec![
        face_at(40.0, 200.0, 120.0, 0.9),
        face_at(400.0, 100.0, 200.0, 0.8),
    ];
    let mut pipeline = ready_pipeline(Scripted {
        all: faces.clone(),
        best: None,
    })
    .await;

    pipeline.process(photo()).await.unwrap();
    let scene = pipeline.scene().unwrap();
    assert_eq!(scene.placements().len(), 2);

    let prop = pipeline.prop().unwrap();
    for (i, face) in faces.iter().enumerate() {
        let alone = solve(&anchors(face).unwrap(), prop.anchors());
        let placement = &scene.placements()[i];
        assert_eq!(placement.face_index, i);
        assert_eq!(placement.transform, alone);
    }

    // Larger face, larger hat.
    assert!(scene.placements()[1].transform.scale > scene.placements()[0].transform.scale);
}

#[tokio::test]
async fn debug_overlay_leaves_hats_unchanged() {
    let face = face_at(200.0, 150.0, 180.0, 0.9);
    let mut pipeline = ready_pipeline(Scripted {
        all: vec![face.clone()],
        best: None,
    })
    .await;
    pipeline.process(photo()).await.unwrap();

    let plain = pipeline.export(false).unwrap();
    let with_debug = pipeline.export(true).unwrap();
    assert_ne!(plain, with_debug);

    let without_layer = build(&photo(), &[face], pipeline.prop().unwrap()).unwrap();
    assert!(without_layer.debug_layer().is_none());
    assert_eq!(flatten(&without_layer, false).unwrap(), plain);
    assert_eq!(flatten(&without_layer, true).unwrap(), plain);

    // Export does not consume the scene.
    assert_eq!(pipeline.state(), PipelineState::Ready);
    assert_eq!(pipeline.export(false).unwrap(), plain);
}

#[tokio::test]
async fn result_for_a_replaced_image_is_ignored() {
    let face = face_at(200.0, 150.0, 180.0, 0.9);
    let mut pipeline = ready_pipeline(Scripted {
        all: vec![face],
        best: None,
    })
    .await;

    let first = pipeline.begin(photo()).unwrap();
    let second = pipeline.begin(photo()).unwrap();
    assert!(second.generation() > first.generation());

    let stale = first.run().await;
    assert_eq!(pipeline.complete(stale).unwrap(), Completion::Discarded);
    assert_eq!(pipeline.state(), PipelineState::Detecting);
    assert!(pipeline.scene().is_none());

    let fresh = second.run().await;
    assert_eq!(
        pipeline.complete(fresh).unwrap(),
        Completion::Ready { faces: 1 }
    );
}

#[tokio::test]
async fn coincident_cheek_points_fail_the_session() {
    let good = face_at(200.0, 150.0, 180.0, 0.9);
    let mut points = good.landmarks.points().to_vec();
    points[1] = points[0];
    let broken = DetectedFace::new(good.bbox, LandmarkSet::new(points).unwrap(), 0.9);

    let mut pipeline = ready_pipeline(Scripted {
        all: vec![good, broken],
        best: None,
    })
    .await;

    let err = pipeline.process(photo()).await.unwrap_err();
    assert!(matches!(err, Error::DegenerateLandmarks { .. }));
    assert!(err.is_no_face());
    assert_eq!(pipeline.state(), PipelineState::Error);
    assert!(pipeline.scene().is_none());
}

#[tokio::test]
async fn coincident_anchors_fail_the_session() {
    let good = face_at(200.0, 150.0, 180.0, 0.9);
    let mut points = good.landmarks.points().to_vec();
    points[0] = Point::new(10.0, 0.0);
    points[1] = Point::new(12.0, 0.0);
    points[15] = Point::new(2.0, 0.0);
    points[16] = Point::new(4.0, 0.0);
    let collapsed = DetectedFace::new(good.bbox, LandmarkSet::new(points).unwrap(), 0.9);

    let mut pipeline = ready_pipeline(Scripted {
        all: vec![collapsed],
        best: None,
    })
    .await;

    let err = pipeline.process(photo()).await.unwrap_err();
    assert!(matches!(err, Error::DegenerateAnchors));
    assert!(err.is_no_face());
    assert_eq!(pipeline.state(), PipelineState::Error);
    assert!(pipeline.export(false).is_err());
}
