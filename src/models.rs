//! Catalog of the segmentation models the remover can run
//!
//! Every model is a single ONNX file published as a release asset. The catalog
//! knows where to fetch it and how its input tensor must be prepared.

use crate::error::{BgRemoverError, Result};
use serde::{Deserialize, Serialize};

const RELEASE_BASE_URL: &str = "https://github.com/danielgatis/rembg/releases/download/v0.0.0";

/// ImageNet channel statistics used by the U²-Net family
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Known background removal models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// General purpose U²-Net (176 MB)
    #[default]
    U2Net,
    /// Lightweight U²-Net (4.7 MB)
    U2NetP,
    /// `ISNet` general use (170 MB)
    IsNetGeneralUse,
}

/// Tensor preparation parameters for a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessingConfig {
    /// Square input side in pixels
    pub input_size: u32,
    /// Per-channel mean subtracted after scaling to `[0, 1]`
    pub mean: [f32; 3],
    /// Per-channel standard deviation
    pub std: [f32; 3],
}

impl ModelKind {
    /// All catalog entries
    pub const ALL: [ModelKind; 3] = [ModelKind::U2Net, ModelKind::U2NetP, ModelKind::IsNetGeneralUse];

    /// Catalog name, also the cached file stem
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::U2Net => "u2net",
            Self::U2NetP => "u2netp",
            Self::IsNetGeneralUse => "isnet-general-use",
        }
    }

    /// Short description for `--list-models`
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::U2Net => "General purpose salient object segmentation",
            Self::U2NetP => "Lightweight U2-Net, faster with coarser edges",
            Self::IsNetGeneralUse => "ISNet trained for general background removal",
        }
    }

    /// File name of the ONNX model
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.onnx", self.name())
    }

    /// Download URL of the ONNX model
    #[must_use]
    pub fn url(self) -> String {
        format!("{}/{}", RELEASE_BASE_URL, self.file_name())
    }

    /// Input tensor preparation for this model
    #[must_use]
    pub fn preprocessing(self) -> PreprocessingConfig {
        match self {
            Self::U2Net | Self::U2NetP => PreprocessingConfig {
                input_size: 320,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
            },
            Self::IsNetGeneralUse => PreprocessingConfig {
                input_size: 1024,
                mean: [0.5, 0.5, 0.5],
                std: [1.0, 1.0, 1.0],
            },
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ModelKind {
    type Err = BgRemoverError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|kind| kind.name()).collect();
                BgRemoverError::invalid_config(format!(
                    "Unknown model '{}'. Available models: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}
