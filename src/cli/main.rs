//! Background Remover Pro command-line front end
//!
//! Drives the same [`App`] controller a GUI would: the positional inputs
//! become a selection, the flags become settings-panel events, and prompts go
//! through [`TerminalDialogs`].

use super::config::CliConfigBuilder;
use super::dialogs::TerminalDialogs;
use super::progress::IndicatifProgressReporter;
use crate::{
    app::{prompt_output_directory, App, AppEvent, AppResponse, Dialogs, RemovalOutcome},
    backends::{OnnxBackend, OnnxRemover},
    cache::{format_size, ModelCache, CACHE_DIR_ENV},
    config::{OutputFormat, APP_TITLE},
    download::ModelDownloader,
    models::ModelKind,
    processor::BatchOutcome,
    registry::{NoPreview, SelectionEvent},
    services::{ConsoleProgressReporter, ImageIOService, ProgressReporter},
    tracing_config::{init_cli_tracing, spans, TracingFormat},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Remove image backgrounds with U2-Net style models
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremover-pro")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Images (*.png, *.jpg, *.jpeg) or directories containing them
    #[arg(value_name = "INPUT", required_unless_present_any = &["list_models", "only_download", "show_cache_dir", "show_providers", "clear_cache"])]
    pub input: Vec<PathBuf>,

    /// Output directory [default: ~/Desktop/output_images, after confirmation]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = CliOutputFormat::Png)]
    pub format: CliOutputFormat,

    /// Use the slider values below instead of the recommended defaults
    #[arg(long)]
    pub custom: bool,

    /// Smooth edges: Gaussian blur radius (0-5, requires --custom)
    #[arg(long, value_name = "RADIUS", requires = "custom")]
    pub smooth: Option<u32>,

    /// Resize image in percent (10-200, requires --custom)
    #[arg(long, value_name = "PERCENT", requires = "custom")]
    pub resize: Option<u32>,

    /// Upscale factor (1-4, requires --custom)
    #[arg(long, value_name = "FACTOR", requires = "custom")]
    pub upscale: Option<u32>,

    /// Accept the default output directory without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Segmentation model: u2net, u2netp or isnet-general-use [default: u2net]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to a local .onnx file instead of the cached model
    #[arg(long, value_name = "FILE")]
    pub model_path: Option<PathBuf>,

    /// Execution provider: auto, cpu, cuda or coreml
    #[arg(short, long, default_value = "auto")]
    pub execution_provider: String,

    /// Number of inference threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    pub threads: usize,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90)]
    pub jpeg_quality: u8,

    /// Descend into subdirectories of directory inputs
    #[arg(short, long)]
    pub recursive: bool,

    /// List known models and their cache state, then exit
    #[arg(long)]
    pub list_models: bool,

    /// Download the model selected with --model, then exit
    #[arg(long)]
    pub only_download: bool,

    /// Remove cached models (all of them, or only the one given with --model)
    #[arg(long)]
    pub clear_cache: bool,

    /// Show the model cache directory, then exit
    #[arg(long)]
    pub show_cache_dir: bool,

    /// Show execution provider availability, then exit
    #[arg(long)]
    pub show_providers: bool,

    /// Use a custom model cache directory
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Show a progress bar while processing
    #[arg(long)]
    pub progress: bool,

    /// Plain log output without colors
    #[arg(long)]
    pub plain: bool,

    /// Verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            CliOutputFormat::Webp => OutputFormat::WebP,
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.plain {
        TracingFormat::Compact
    } else {
        TracingFormat::Console
    };
    let session_id = init_cli_tracing(cli.verbose, format).context("Failed to initialize tracing")?;

    if cli.show_providers {
        show_provider_diagnostics();
        return Ok(());
    }
    if cli.show_cache_dir {
        return show_cache_dir(&cli);
    }
    if cli.list_models {
        return list_models(&cli);
    }
    if cli.clear_cache {
        return clear_cache(&cli);
    }

    CliConfigBuilder::validate_cli(&cli).context("Invalid arguments")?;
    let model = CliConfigBuilder::model(&cli)?;

    if cli.only_download {
        let path = ensure_model(&cli, model).await?;
        println!("✅ Model {} is ready at {}", model, path.display());
        return Ok(());
    }

    let started = Instant::now();
    let inputs = collect_inputs(&cli.input, cli.recursive)?;
    info!("{}: {} image(s) selected", APP_TITLE, inputs.len());

    // Settle the selection and the output directory before any download
    let mut dialogs = TerminalDialogs::new(cli.yes);
    let output_dir = match preflight(&inputs, cli.output.as_deref(), &mut dialogs) {
        Ok(dir) => dir,
        Err(outcome) => return finish(outcome, started),
    };

    let model_path = match &cli.model_path {
        Some(path) => path.clone(),
        None => ensure_model(&cli, model).await?,
    };

    let session = spans::session(&session_id, model.name(), &cli.execution_provider);
    let _enter = session.enter();
    let remover_config = CliConfigBuilder::remover_config(&cli, model_path)?;
    let processor_config = CliConfigBuilder::processor_config(&cli)?;

    let mut app = App::with_config(OnnxRemover::onnx(remover_config), NoPreview, processor_config);
    app.set_output_dir(output_dir);
    app.handle(
        AppEvent::Selection(SelectionEvent::Add(inputs)),
        Instant::now(),
        &mut dialogs,
    );

    let reporter: Arc<dyn ProgressReporter> = if cli.progress {
        Arc::new(IndicatifProgressReporter::new(app.selection().len()))
    } else {
        Arc::new(ConsoleProgressReporter::new(cli.verbose > 0))
    };
    let mut app = app.with_progress_reporter(reporter);

    let mut events: Vec<AppEvent> = CliConfigBuilder::settings_events(&cli)
        .into_iter()
        .map(AppEvent::Settings)
        .collect();
    events.push(AppEvent::RemoveBackground);

    for event in events {
        if let AppResponse::Removal(outcome) = app.handle(event, Instant::now(), &mut dialogs) {
            return finish(outcome, started);
        }
    }
    Ok(())
}

/// Output directory for a non-empty selection, or the outcome that aborts the run
fn preflight(
    inputs: &[PathBuf],
    output: Option<&Path>,
    dialogs: &mut dyn Dialogs,
) -> std::result::Result<PathBuf, RemovalOutcome> {
    if inputs.is_empty() {
        return Err(RemovalOutcome::NoSelection);
    }
    output
        .map(Path::to_path_buf)
        .or_else(|| prompt_output_directory(&ImageIOService::default_output_dir(), dialogs))
        .ok_or(RemovalOutcome::NoOutputDirectory)
}

fn finish(outcome: RemovalOutcome, started: Instant) -> Result<()> {
    match outcome {
        RemovalOutcome::NoSelection => {
            anyhow::bail!("No images selected: pass *.png, *.jpg or *.jpeg files or directories")
        },
        RemovalOutcome::NoOutputDirectory => {
            anyhow::bail!("No output directory chosen: pass --output or accept the default with --yes")
        },
        RemovalOutcome::Aborted(error) => anyhow::bail!("Processing aborted: {error}"),
        RemovalOutcome::Finished(report) => {
            for failure in &report.failures {
                warn!(
                    "Skipped {} ({}): {}",
                    failure.path.display(),
                    failure.stage.description(),
                    failure.error
                );
            }
            info!("Finished in {:.2}s", started.elapsed().as_secs_f64());
            match report.outcome() {
                BatchOutcome::Completed { .. } => Ok(()),
                BatchOutcome::NothingProcessed { total } => {
                    anyhow::bail!("None of the {total} selected images could be processed")
                },
            }
        },
    }
}

fn cache_for(cli: &Cli) -> Result<ModelCache> {
    match &cli.cache_dir {
        Some(dir) => ModelCache::with_custom_cache_dir(dir)
            .context("Failed to create cache with custom directory"),
        None => ModelCache::new().context("Failed to create model cache"),
    }
}

/// Cached model path, downloading on first use
async fn ensure_model(cli: &Cli, model: ModelKind) -> Result<PathBuf> {
    let downloader = ModelDownloader::with_cache(cache_for(cli)?)
        .context("Failed to create model downloader")?;
    if !downloader.cache().is_model_cached(model) {
        println!("📦 Model {} not cached, downloading...", model);
    }

    downloader
        .ensure_model(model, cli.progress || cli.only_download)
        .instrument(spans::model_download(model.name()))
        .await
        .with_context(|| format!("Failed to download model {model}"))
}

/// Expand directory inputs and drop unsupported files, keeping order
fn collect_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = find_image_files(input, recursive)?;
            if found.is_empty() {
                warn!("No supported images in {}", input.display());
            }
            files.append(&mut found);
        } else if ImageIOService::is_supported_input(input) {
            files.push(input.clone());
        } else {
            warn!(
                "Skipping {}: only *.png, *.jpg and *.jpeg are supported",
                input.display()
            );
        }
    }
    Ok(files)
}

fn find_image_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !recursive {
        return ImageIOService::list_inputs_in_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() && ImageIOService::is_supported_input(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn show_provider_diagnostics() {
    println!("🔍 Execution Provider Diagnostics");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (name, available, description) in OnnxBackend::list_providers() {
        let status = if available {
            "✅ Available"
        } else {
            "❌ Not Available"
        };
        println!("  • {name}: {status} - {description}");
    }
    println!("\n💡 Select one with --execution-provider auto|cpu|cuda|coreml");
}

fn show_cache_dir(cli: &Cli) -> Result<()> {
    let cache = cache_for(cli)?;
    println!("📁 Model cache directory:");
    println!("   Path: {}", cache.cache_dir().display());
    if cli.cache_dir.is_some() {
        println!("   Source: --cache-dir");
    } else if std::env::var(CACHE_DIR_ENV).is_ok() {
        println!("   Source: {CACHE_DIR_ENV} environment variable");
    } else {
        println!("   Source: platform cache directory");
    }
    Ok(())
}

fn list_models(cli: &Cli) -> Result<()> {
    let cache = cache_for(cli)?;
    let cached = cache.scan_cached_models().context("Failed to scan model cache")?;

    println!("📦 Models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for model in ModelKind::ALL {
        let status = cached
            .iter()
            .find(|info| info.model == model)
            .map_or_else(
                || "not downloaded".to_string(),
                |info| format!("cached, {}", format_size(info.size_bytes)),
            );
        println!("  • {:<18} {} ({})", model.name(), model.description(), status);
    }
    println!("\n💡 Download with: bgremover-pro --only-download --model <name>");
    Ok(())
}

fn clear_cache(cli: &Cli) -> Result<()> {
    let cache = cache_for(cli)?;

    if cli.model.is_some() {
        let model = CliConfigBuilder::model(cli)?;
        if cache.clear_model(model).context("Failed to clear model")? {
            println!("✅ Removed {} from {}", model, cache.cache_dir().display());
        } else {
            println!("⚠️  Model '{}' is not cached", model);
        }
        return Ok(());
    }

    let removed = cache.clear_all_models().context("Failed to clear cache")?;
    if removed.is_empty() {
        println!("💡 Cache was already empty");
    } else {
        println!("✅ Removed {} model(s):", removed.len());
        for name in &removed {
            println!("   • {name}");
        }
    }
    Ok(())
}
