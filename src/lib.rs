#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Background Remover Pro
//!
//! Background removal for selected images with optional resize, edge
//! smoothing and upscaling, using U²-Net style segmentation models on ONNX
//! Runtime.
//!
//! The crate holds everything a desktop front end needs except the widgets:
//!
//! - **Selection** ([`registry`]): ordered, de-duplicated input paths with a
//!   preview refresh callback, and [`preview`] thumbnails
//! - **Settings** ([`settings`]): three bounded sliders, the output format and
//!   a "use defaults" toggle
//! - **Tooltips** ([`tooltip`]): hover tooltip timing as a state machine
//! - **Pipeline** ([`processor`]): remove → resize → smooth → upscale → encode,
//!   one file after another, skipping files that fail
//! - **Controller** ([`app`]): the "Remove Background" flow with its prompts
//! - **Models** ([`models`], [`cache`], [`download`]): `u2net`, `u2netp` and
//!   `isnet-general-use`, downloaded into a local cache on first use
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremover_pro::{
//!     BatchProcessor, ModelDownloader, ModelKind, OnnxRemover, ProcessingJob,
//!     ProcessingSettings, RemoverConfig,
//! };
//! use std::path::PathBuf;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let model_path = ModelDownloader::new()?
//!     .ensure_model(ModelKind::U2Net, false)
//!     .await?;
//! let config = RemoverConfig::builder().model_path(model_path).build()?;
//!
//! let settings = ProcessingSettings::builder().upscale_factor(2).build()?;
//! let job = ProcessingJob::from_settings(&settings, "output_images");
//!
//! let mut processor = BatchProcessor::new(OnnxRemover::onnx(config));
//! let report = processor.run(&[PathBuf::from("cat.jpg")], &job)?;
//! println!("{} of {} images processed", report.succeeded, report.total);
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `onnx` (default): ONNX Runtime backend with CUDA and `CoreML` providers
//! - `cli` (default): the `bgremover-pro` and `bgremover-batch` binaries
//! - `webp-support` (default): WebP output
//! - `tracing-json`: JSON log output for the binaries

pub mod app;
pub mod backends;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod inference;
pub mod models;
pub mod postprocess;
pub mod preview;
pub mod processor;
pub mod registry;
pub mod services;
pub mod settings;
pub mod tooltip;
pub mod tracing_config;

pub use app::{
    prompt_output_directory, App, AppEvent, AppResponse, Dialogs, RemovalOutcome, TooltipTarget,
};
#[cfg(feature = "onnx")]
pub use backends::{OnnxBackend, OnnxRemover};
pub use cache::ModelCache;
pub use config::{
    ExecutionProvider, FolderPreset, OutputFormat, ProcessingSettings, RemoverConfig, SliderKind,
};
pub use download::ModelDownloader;
pub use error::{BgRemoverError, Result};
pub use inference::{BackgroundRemover, InferenceBackend, SegmentationRemover};
pub use models::ModelKind;
pub use postprocess::{PostProcessPlan, ResizePolicy};
pub use preview::{render_thumbnails, Thumbnail, ThumbnailGallery};
pub use processor::{BatchOutcome, BatchProcessor, BatchReport, ProcessingJob, ProcessorConfig};
pub use registry::{PreviewSurface, SelectionEvent, SelectionRegistry};
pub use services::{OutputFormatHandler, ProcessingStage, ProgressReporter};
pub use settings::{SettingsEvent, SettingsPanel};
pub use tooltip::{Tooltip, TooltipChange, TooltipEvent};
