//! Flag-less folder batch: `input_images/` to `output_images/`
//!
//! Every supported image gets a PNG and a WEBP cut-out, resized to at most
//! 1024 px on the longest side, lightly blurred and upscaled twice.

use crate::{
    backends::OnnxRemover,
    config::{FolderPreset, RemoverConfig},
    download::ModelDownloader,
    processor::{BatchProcessor, BatchReport, ProcessingJob},
    services::{ConsoleProgressReporter, ImageIOService},
    tracing_config::{init_cli_tracing, TracingFormat},
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

const NO_IMAGES_MESSAGE: &str = "⚠️ No supported image files found.";

/// Inputs of the preset's input folder; empty when the folder does not exist
pub(crate) fn preset_inputs(preset: &FolderPreset) -> Result<Vec<PathBuf>> {
    if !preset.input_dir.is_dir() {
        log::debug!("Input folder {} does not exist", preset.input_dir.display());
        return Ok(Vec::new());
    }
    ImageIOService::list_inputs_in_dir(&preset.input_dir)
        .with_context(|| format!("Failed to list {}", preset.input_dir.display()))
}

fn print_report(report: &BatchReport) {
    for failure in &report.failures {
        let name = failure
            .path
            .file_name()
            .map_or_else(|| failure.path.display().to_string(), |n| n.to_string_lossy().into_owned());
        println!("❌ Failed: {name}: {}", failure.error);
    }
}

pub async fn main() -> Result<()> {
    init_cli_tracing(0, TracingFormat::Console).context("Failed to initialize tracing")?;
    let preset = FolderPreset::default();

    println!("🚀 Starting batch background removal...");

    let inputs = preset_inputs(&preset)?;
    if inputs.is_empty() {
        println!("{NO_IMAGES_MESSAGE}");
        return Ok(());
    }

    let downloader = ModelDownloader::new().context("Failed to create model downloader")?;
    let model_path = downloader
        .ensure_model(preset.model, true)
        .await
        .with_context(|| format!("Failed to download model {}", preset.model))?;
    let remover_config = RemoverConfig::builder()
        .model(preset.model)
        .model_path(model_path)
        .build()
        .context("Invalid model configuration")?;

    let mut processor = BatchProcessor::new(OnnxRemover::onnx(remover_config))
        .with_progress_reporter(Arc::new(ConsoleProgressReporter::new(false)));
    let report = processor
        .run(&inputs, &ProcessingJob::from_preset(&preset))
        .context("Batch processing aborted")?;

    print_report(&report);
    println!("🎉 All done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_input_folder_yields_no_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let preset = FolderPreset {
            input_dir: temp_dir.path().join("input_images"),
            ..FolderPreset::default()
        };
        assert!(preset_inputs(&preset).unwrap().is_empty());
    }

    #[test]
    fn test_preset_inputs_filters_extensions() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["cat.JPG", "dog.png", "readme.md", "movie.webp"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }
        let preset = FolderPreset {
            input_dir: temp_dir.path().to_path_buf(),
            ..FolderPreset::default()
        };

        let inputs = preset_inputs(&preset).unwrap();
        assert_eq!(
            inputs,
            vec![temp_dir.path().join("cat.JPG"), temp_dir.path().join("dog.png")]
        );
    }
}
