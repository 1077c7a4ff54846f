//! Layered settings: built-in defaults, an optional config file, then
//! `HATTER__`-prefixed environment variables (`HATTER__ASSETS__PROP=top_hat`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detector::DetectionPolicy;
use crate::error::Result;
use crate::export::DEFAULT_SUFFIX;
use crate::seeta::SeetaOptions;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detection: DetectionPolicy,
    pub assets: AssetSettings,
    pub seeta: SeetaOptions,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Directory holding prop manifests and rasters.
    pub dir: PathBuf,
    /// Prop id, the manifest file name without `.json`.
    pub prop: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            prop: "santa_hat".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Appended to the source file stem when naming the export.
    pub suffix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl Settings {
    /// Load settings, reading `file` when given. The file format follows its
    /// extension (JSON, TOML, YAML, ...).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix("HATTER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}
