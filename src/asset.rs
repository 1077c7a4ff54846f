//! The prop image and the two brim points it is aligned by.
//!
//! A prop is described by a small JSON manifest next to its raster:
//!
//! ```json
//! {
//!   "image": "santa_hat.png",
//!   "width": 1113,
//!   "height": 846,
//!   "left": { "x": 240, "y": 557 },
//!   "right": { "x": 855, "y": 563 }
//! }
//! ```
//!
//! Anchor coordinates are in the raster's own pixel space with the origin at
//! the top-left corner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::Point;

/// The prop's two brim points, validated to be finite and distinct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceAnchors {
    left: Point,
    right: Point,
}

impl ReferenceAnchors {
    pub fn new(left: Point, right: Point) -> Result<Self> {
        if !left.is_finite() || !right.is_finite() {
            return Err(Error::AssetConfiguration(
                "reference anchors must be finite".into(),
            ));
        }
        if left.distance(&right) == 0.0 {
            return Err(Error::AssetConfiguration(format!(
                "reference anchors coincide at ({}, {})",
                left.x, left.y
            )));
        }
        Ok(Self { left, right })
    }

    pub fn left(&self) -> Point {
        self.left
    }

    pub fn right(&self) -> Point {
        self.right
    }

    /// Vector from the left anchor to the right anchor. Never zero-length.
    pub fn span(&self) -> Point {
        self.right - self.left
    }
}

/// On-disk description of a prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropManifest {
    /// Raster path, relative to the manifest's directory.
    pub image: PathBuf,
    pub width: u32,
    pub height: u32,
    pub left: Point,
    pub right: Point,
}

impl PropManifest {
    /// The stock santa hat.
    pub fn santa_hat() -> Self {
        Self {
            image: PathBuf::from("santa_hat.png"),
            width: 1113,
            height: 846,
            left: Point::new(240.0, 557.0),
            right: Point::new(855.0, 563.0),
        }
    }
}

/// A loaded prop, shared read-only by every placement.
#[derive(Debug)]
pub struct PropAsset {
    id: String,
    image: RgbaImage,
    anchors: ReferenceAnchors,
}

impl PropAsset {
    /// Build a prop from a decoded raster and its manifest.
    ///
    /// The raster must have exactly the manifest's dimensions and the anchors
    /// must be usable; anything else is [`Error::AssetConfiguration`].
    pub fn new(id: impl Into<String>, image: RgbaImage, manifest: &PropManifest) -> Result<Self> {
        let id = id.into();
        if image.dimensions() != (manifest.width, manifest.height) {
            return Err(Error::AssetConfiguration(format!(
                "prop '{}' raster is {}x{} but manifest declares {}x{}",
                id,
                image.width(),
                image.height(),
                manifest.width,
                manifest.height
            )));
        }
        let anchors = ReferenceAnchors::new(manifest.left, manifest.right)?;
        Ok(Self { id, image, anchors })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn anchors(&self) -> &ReferenceAnchors {
        &self.anchors
    }
}

/// Resolves a prop id to a loaded prop. Called once per process.
#[async_trait(?Send)]
pub trait AssetLoader {
    async fn load(&self, prop_id: &str) -> Result<Arc<PropAsset>>;
}

/// Loads `<dir>/<id>.json` and the raster it names.
#[derive(Debug, Clone)]
pub struct DirAssetLoader {
    dir: PathBuf,
}

impl DirAssetLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn manifest_path(&self, prop_id: &str) -> PathBuf {
        self.dir.join(format!("{prop_id}.json"))
    }

    fn resolve(&self, image: &Path) -> PathBuf {
        if image.is_absolute() {
            image.to_path_buf()
        } else {
            self.dir.join(image)
        }
    }
}

#[async_trait(?Send)]
impl AssetLoader for DirAssetLoader {
    async fn load(&self, prop_id: &str) -> Result<Arc<PropAsset>> {
        let manifest_path = self.manifest_path(prop_id);
        debug!(path = %manifest_path.display(), "reading prop manifest");
        let manifest: PropManifest = serde_json::from_slice(&tokio::fs::read(&manifest_path).await?)?;

        let image_path = self.resolve(&manifest.image);
        debug!(path = %image_path.display(), "decoding prop raster");
        let raster = image::load_from_memory(&tokio::fs::read(&image_path).await?)?.to_rgba8();

        let asset = PropAsset::new(prop_id, raster, &manifest)?;
        info!(
            prop = prop_id,
            width = manifest.width,
            height = manifest.height,
            "prop loaded"
        );
        Ok(Arc::new(asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};

    #[test]
    fn coincident_anchors_are_rejected() {
        let p = Point::new(12.0, 34.0);
        assert!(matches!(
            ReferenceAnchors::new(p, p),
            Err(Error::AssetConfiguration(_))
        ));
        assert!(matches!(
            ReferenceAnchors::new(Point::new(f32::INFINITY, 0.0), p),
            Err(Error::AssetConfiguration(_))
        ));
    }

    #[test]
    fn raster_must_match_manifest() {
        let manifest = PropManifest::santa_hat();
        let err = PropAsset::new("hat", RgbaImage::new(10, 10), &manifest).unwrap_err();
        assert!(matches!(err, Error::AssetConfiguration(_)));

        let asset = PropAsset::new("hat", RgbaImage::new(1113, 846), &manifest).unwrap();
        assert_eq!(asset.anchors().left(), Point::new(240.0, 557.0));
        assert_eq!(asset.anchors().right(), Point::new(855.0, 563.0));
    }

    #[tokio::test]
    async fn loads_manifest_and_raster_from_dir() {
        let dir = std::env::temp_dir().join(format!("hatter-asset-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let raster = RgbaImage::from_pixel(8, 6, Rgba([200, 10, 10, 255]));
        raster
            .save_with_format(dir.join("cap.png"), ImageFormat::Png)
            .unwrap();
        let manifest = PropManifest {
            image: PathBuf::from("cap.png"),
            width: 8,
            height: 6,
            left: Point::new(1.0, 5.0),
            right: Point::new(7.0, 5.0),
        };
        std::fs::write(dir.join("cap.json"), serde_json::to_vec(&manifest).unwrap()).unwrap();

        let loader = DirAssetLoader::new(&dir);
        let asset = loader.load("cap").await.unwrap();
        assert_eq!(asset.id(), "cap");
        assert_eq!(asset.image().dimensions(), (8, 6));
        assert_eq!(asset.anchors().span(), Point::new(6.0, 0.0));

        assert!(loader.load("missing").await.is_err());

        std::fs::remove_dir_all(dir).ok();
    }
}
