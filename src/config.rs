//! Configuration types for selection, settings and background removal operations

use crate::error::{BgRemoverError, Result};
use crate::models::ModelKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application title shown by front ends
pub const APP_TITLE: &str = "Background Remover Pro";

/// File-picker filter for selectable input images
pub const INPUT_PATTERNS: &[&str] = &["*.png", "*.jpg", "*.jpeg"];

/// Suffix appended to the input stem for every written output
pub const OUTPUT_SUFFIX: &str = "_no_bg";

/// Tooltip for the output format selector
pub const FORMAT_TOOLTIP: &str = "Choose the output file format.\nPNG keeps transparency, JPEG doesn't.";

/// Tooltip for the "use defaults" toggle
pub const DEFAULTS_TOOLTIP: &str = "Uses optimal settings for background removal:\n\
• No smoothing (cleaner edges)\n\
• Original size maintained\n\
• No upscaling\n\
• Format selection remains independent";

/// Execution provider options for ONNX Runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecutionProvider {
    /// Auto-detect best available provider (CUDA > `CoreML` > CPU)
    #[default]
    Auto,
    /// CPU execution (always available)
    Cpu,
    /// NVIDIA CUDA GPU acceleration
    Cuda,
    /// Apple Silicon GPU acceleration
    CoreMl,
}

impl std::fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
            Self::CoreMl => write!(f, "coreml"),
        }
    }
}

impl std::str::FromStr for ExecutionProvider {
    type Err = BgRemoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            "coreml" => Ok(Self::CoreMl),
            other => Err(BgRemoverError::invalid_config(format!(
                "Unknown execution provider '{}'. Expected one of: auto, cpu, cuda, coreml",
                other
            ))),
        }
    }
}

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    #[default]
    Png,
    /// JPEG (no transparency, composited onto white)
    Jpeg,
    /// WebP with alpha channel transparency (lossless)
    WebP,
}

impl OutputFormat {
    /// All formats offered by the format selector, in display order
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::WebP];

    /// Display name as shown in the format selector
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::WebP => "WEBP",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = BgRemoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            other => Err(BgRemoverError::unsupported_format(format!(
                "'{}' (expected PNG, JPEG or WEBP)",
                other
            ))),
        }
    }
}

/// The three numeric settings exposed as sliders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SliderKind {
    /// Gaussian blur radius applied after removal
    SmoothEdges,
    /// Percentage scale applied before smoothing
    ResizePercent,
    /// Integer multiplier applied last
    UpscaleFactor,
}

impl SliderKind {
    /// All sliders in panel order
    pub const ALL: [SliderKind; 3] = [
        SliderKind::SmoothEdges,
        SliderKind::ResizePercent,
        SliderKind::UpscaleFactor,
    ];

    /// Slider label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SmoothEdges => "Smooth Edges",
            Self::ResizePercent => "Resize Image (%)",
            Self::UpscaleFactor => "Upscale Factor",
        }
    }

    /// Inclusive slider range
    #[must_use]
    pub fn range(self) -> (u32, u32) {
        match self {
            Self::SmoothEdges => (0, 5),
            Self::ResizePercent => (10, 200),
            Self::UpscaleFactor => (1, 4),
        }
    }

    /// Value used when "use defaults" is active
    #[must_use]
    pub fn default_value(self) -> u32 {
        match self {
            Self::SmoothEdges => 0,
            Self::ResizePercent => 100,
            Self::UpscaleFactor => 1,
        }
    }

    /// Info tooltip text
    #[must_use]
    pub fn tooltip(self) -> &'static str {
        match self {
            Self::SmoothEdges => {
                "Smooths out jagged edges after removing background.\n0 = No smoothing (recommended)\n2 = Light smoothing\n5 = Heavy smoothing"
            },
            Self::ResizePercent => {
                "Scales the final image size.\n100 = Original size (recommended)\n150 = 1.5× bigger\n50 = Half size"
            },
            Self::UpscaleFactor => {
                "Uses AI to enhance resolution.\n1 = No upscaling (recommended)\n2 = Double resolution\n4 = Quadruple resolution"
            },
        }
    }

    /// Clamp a raw slider position into the slider range
    #[must_use]
    pub fn clamp(self, value: u32) -> u32 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }

    fn validate(self, value: u32) -> Result<()> {
        let (min, max) = self.range();
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(BgRemoverError::config_value_error(
                self.label(),
                value,
                &format!("{}-{}", min, max),
                Some(self.default_value()),
            ))
        }
    }
}

/// Post-processing settings and output format for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingSettings {
    /// Gaussian blur radius, 0-5 (0 = off)
    pub smoothing_radius: u32,
    /// Resize percentage, 10-200 (100 = off)
    pub resize_percent: u32,
    /// Upscale factor, 1-4 (1 = off)
    pub upscale_factor: u32,
    /// Output format
    pub format: OutputFormat,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            smoothing_radius: SliderKind::SmoothEdges.default_value(),
            resize_percent: SliderKind::ResizePercent.default_value(),
            upscale_factor: SliderKind::UpscaleFactor.default_value(),
            format: OutputFormat::default(),
        }
    }
}

impl ProcessingSettings {
    /// Create a new settings builder
    #[must_use]
    pub fn builder() -> ProcessingSettingsBuilder {
        ProcessingSettingsBuilder::default()
    }

    /// Default numeric settings combined with the given format
    #[must_use]
    pub fn defaults_with_format(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Numeric value for a slider
    #[must_use]
    pub fn value(&self, kind: SliderKind) -> u32 {
        match kind {
            SliderKind::SmoothEdges => self.smoothing_radius,
            SliderKind::ResizePercent => self.resize_percent,
            SliderKind::UpscaleFactor => self.upscale_factor,
        }
    }

    /// Validate all numeric settings against their ranges
    ///
    /// # Errors
    /// - Any value outside its slider range
    pub fn validate(&self) -> Result<()> {
        for kind in SliderKind::ALL {
            kind.validate(self.value(kind))?;
        }
        Ok(())
    }
}

/// Builder for `ProcessingSettings`
#[derive(Debug, Default)]
pub struct ProcessingSettingsBuilder {
    settings: ProcessingSettings,
}

impl ProcessingSettingsBuilder {
    #[must_use]
    pub fn smoothing_radius(mut self, radius: u32) -> Self {
        self.settings.smoothing_radius = radius;
        self
    }

    #[must_use]
    pub fn resize_percent(mut self, percent: u32) -> Self {
        self.settings.resize_percent = percent;
        self
    }

    #[must_use]
    pub fn upscale_factor(mut self, factor: u32) -> Self {
        self.settings.upscale_factor = factor;
        self
    }

    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.settings.format = format;
        self
    }

    /// Build the settings
    ///
    /// # Errors
    /// - Any numeric value outside its slider range
    pub fn build(self) -> Result<ProcessingSettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

/// Hard-coded settings of the flag-less folder batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderPreset {
    /// Folder scanned for inputs (non-recursive)
    pub input_dir: PathBuf,
    /// Folder receiving the outputs
    pub output_dir: PathBuf,
    /// Model used for removal
    pub model: ModelKind,
    /// Longest side is scaled down to this when larger
    pub max_dimension: u32,
    /// Gaussian blur sigma (`None` = no smoothing)
    pub blur_sigma: Option<f32>,
    /// Integer upscale factor
    pub upscale_factor: u32,
    /// Formats written for every input
    pub formats: Vec<OutputFormat>,
}

impl Default for FolderPreset {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_images"),
            output_dir: PathBuf::from("output_images"),
            model: ModelKind::U2Net,
            max_dimension: 1024,
            blur_sigma: Some(0.5),
            upscale_factor: 2,
            formats: vec![OutputFormat::Png, OutputFormat::WebP],
        }
    }
}

/// Configuration of the background remover backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoverConfig {
    /// Model to load
    pub model: ModelKind,
    /// Explicit model file; overrides the cached model when set
    pub model_path: Option<PathBuf>,
    /// Execution provider for ONNX Runtime
    pub execution_provider: ExecutionProvider,
    /// Number of intra-op threads for inference (0 = auto)
    pub intra_threads: usize,
}

impl Default for RemoverConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            model_path: None,
            execution_provider: ExecutionProvider::default(),
            intra_threads: 0,
        }
    }
}

impl RemoverConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> RemoverConfigBuilder {
        RemoverConfigBuilder::default()
    }
}

/// Builder for `RemoverConfig`
#[derive(Debug, Default)]
pub struct RemoverConfigBuilder {
    config: RemoverConfig,
}

impl RemoverConfigBuilder {
    #[must_use]
    pub fn model(mut self, model: ModelKind) -> Self {
        self.config.model = model;
        self
    }

    #[must_use]
    pub fn model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.model_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn execution_provider(mut self, provider: ExecutionProvider) -> Self {
        self.config.execution_provider = provider;
        self
    }

    #[must_use]
    pub fn intra_threads(mut self, threads: usize) -> Self {
        self.config.intra_threads = threads;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Explicit model path that does not exist
    pub fn build(self) -> Result<RemoverConfig> {
        if let Some(path) = &self.config.model_path {
            if !path.is_file() {
                return Err(BgRemoverError::invalid_config(format!(
                    "Model file not found: {}",
                    path.display()
                )));
            }
        }
        Ok(self.config)
    }
}
