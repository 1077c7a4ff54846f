//! Writing the flattened result to disk.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tracing::info;

use crate::error::Result;

pub const DEFAULT_SUFFIX: &str = "-hatted";

/// File name for the exported image: the source name with its last extension
/// replaced by `<suffix>.png`.
///
/// `portrait.jpg` becomes `portrait-hatted.png`; a name with nothing before
/// the extension falls back to `image`.
pub fn output_name(source: &Path, suffix: &str) -> String {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && !s.starts_with('.'))
        .unwrap_or("image");
    format!("{stem}{suffix}.png")
}

/// Output path next to `source`.
pub fn output_path(source: &Path, suffix: &str) -> PathBuf {
    source.with_file_name(output_name(source, suffix))
}

pub fn save_png(raster: &RgbaImage, path: &Path) -> Result<()> {
    raster.save_with_format(path, ImageFormat::Png)?;
    info!(path = %path.display(), "image exported");
    Ok(())
}
