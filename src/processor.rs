//! Batch processing pipeline
//!
//! [`BatchProcessor`] runs every selected file through the same sequence:
//! read, remove background, decode, resize, smooth, upscale, convert, write.
//! Files are processed one after another on the calling thread. A failing file
//! is logged and skipped; only fatal errors stop the batch.

use crate::{
    config::{FolderPreset, OutputFormat, ProcessingSettings},
    error::{BgRemoverError, Result},
    inference::BackgroundRemover,
    postprocess::PostProcessPlan,
    services::{
        ImageIOService, NoOpProgressReporter, OutputFormatHandler, ProcessingStage,
        ProgressReporter, ProgressTracker, DEFAULT_JPEG_QUALITY,
    },
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info_span, instrument};

/// Everything a batch needs besides the inputs
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingJob {
    /// Post-processing steps
    pub plan: PostProcessPlan,
    /// Formats written for every input, in order
    pub formats: Vec<OutputFormat>,
    /// Directory receiving the outputs
    pub output_dir: PathBuf,
}

impl ProcessingJob {
    /// Job for the interactive settings: one output per input
    #[must_use]
    pub fn from_settings(settings: &ProcessingSettings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            plan: PostProcessPlan::from_settings(settings),
            formats: vec![settings.format],
            output_dir: output_dir.into(),
        }
    }

    /// Job for the folder batch
    #[must_use]
    pub fn from_preset(preset: &FolderPreset) -> Self {
        Self {
            plan: PostProcessPlan::from_preset(preset),
            formats: preset.formats.clone(),
            output_dir: preset.output_dir.clone(),
        }
    }
}

/// A file that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub path: PathBuf,
    /// Stage the file failed in
    pub stage: ProcessingStage,
    pub error: String,
}

/// Result of a whole batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    /// Every file written, in order
    pub written: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub output_dir: PathBuf,
    pub elapsed_ms: u64,
}

/// What the front end should tell the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// At least one file succeeded
    Completed {
        succeeded: usize,
        total: usize,
        output_dir: PathBuf,
    },
    /// No file succeeded
    NothingProcessed { total: usize },
}

impl BatchReport {
    #[must_use]
    pub fn outcome(&self) -> BatchOutcome {
        if self.succeeded == 0 {
            BatchOutcome::NothingProcessed { total: self.total }
        } else {
            BatchOutcome::Completed {
                succeeded: self.succeeded,
                total: self.total,
                output_dir: self.output_dir.clone(),
            }
        }
    }
}

/// Processor settings independent of a particular batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ProcessorConfig {
    #[must_use]
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::default()
    }
}

/// Builder for `ProcessorConfig`
#[derive(Debug, Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - JPEG quality outside 1-100
    pub fn build(self) -> Result<ProcessorConfig> {
        if !(1..=100).contains(&self.config.jpeg_quality) {
            return Err(BgRemoverError::config_value_error(
                "JPEG quality",
                self.config.jpeg_quality,
                "1-100",
                Some(DEFAULT_JPEG_QUALITY),
            ));
        }
        Ok(self.config)
    }
}

/// Sequential batch processor around a background remover
pub struct BatchProcessor<R: BackgroundRemover> {
    remover: R,
    config: ProcessorConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl<R: BackgroundRemover> BatchProcessor<R> {
    /// Create a processor with default configuration and no progress output
    pub fn new(remover: R) -> Self {
        Self::with_config(remover, ProcessorConfig::default())
    }

    pub fn with_config(remover: R, config: ProcessorConfig) -> Self {
        Self {
            remover,
            config,
            reporter: Arc::new(NoOpProgressReporter),
        }
    }

    /// Report progress to the given reporter
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn remover(&self) -> &R {
        &self.remover
    }

    /// Process every input in order
    ///
    /// Progress `completed/total` is reported after each file, failed or not.
    ///
    /// # Errors
    /// - Fatal errors only ([`BgRemoverError::is_fatal`]), such as an output
    ///   directory that cannot be created. Files already written stay on disk.
    pub fn run(&mut self, inputs: &[PathBuf], job: &ProcessingJob) -> Result<BatchReport> {
        let span = info_span!(
            "batch",
            total = inputs.len(),
            output_dir = %job.output_dir.display(),
            remover = self.remover.name()
        );
        let _enter = span.enter();

        log::info!(
            "Processing {} image(s) into {}",
            inputs.len(),
            job.output_dir.display()
        );
        ImageIOService::ensure_output_dir(&job.output_dir)?;

        let mut tracker = ProgressTracker::new(Box::new(Arc::clone(&self.reporter)), inputs.len());
        let mut written = Vec::new();
        let mut failures = Vec::new();

        for input in inputs {
            let mut stage = ProcessingStage::Reading;
            match self.process_file(input, job, &tracker, &mut stage) {
                Ok(mut paths) => {
                    log::info!("✅ Processed: {}", input.display());
                    written.append(&mut paths);
                    tracker.file_finished(input, true);
                },
                Err(e) if e.is_fatal() => {
                    log::error!("Stopping batch at {}: {}", input.display(), e);
                    tracker.report_error(input, stage, &e.to_string());
                    return Err(e);
                },
                Err(e) => {
                    log::warn!("❌ Failed: {} ({}): {}", input.display(), stage.description(), e);
                    tracker.report_error(input, stage, &e.to_string());
                    failures.push(FileFailure {
                        path: input.clone(),
                        stage,
                        error: e.to_string(),
                    });
                    tracker.file_finished(input, false);
                },
            }
        }

        tracker.finish();
        Ok(BatchReport {
            total: inputs.len(),
            succeeded: tracker.succeeded(),
            written,
            failures,
            output_dir: job.output_dir.clone(),
            elapsed_ms: tracker.elapsed_ms(),
        })
    }

    /// Run one file through the pipeline, recording the stage reached
    #[instrument(skip_all, fields(file = %input.display()))]
    fn process_file(
        &mut self,
        input: &Path,
        job: &ProcessingJob,
        tracker: &ProgressTracker,
        stage: &mut ProcessingStage,
    ) -> Result<Vec<PathBuf>> {
        let mut enter = |next: ProcessingStage| {
            *stage = next;
            tracker.report_stage(input, next);
        };

        enter(ProcessingStage::Reading);
        let bytes = ImageIOService::read_input(input)?;

        enter(ProcessingStage::BackgroundRemoval);
        let cutout = self.remover.remove(&bytes)?;

        enter(ProcessingStage::Decoding);
        let mut image = ImageIOService::load_from_bytes(&cutout)?.to_rgba8();
        log::debug!("Cut-out is {}x{}", image.width(), image.height());

        enter(ProcessingStage::Resizing);
        if let Some(resized) = job.plan.resize(&image) {
            image = resized;
        }

        enter(ProcessingStage::Smoothing);
        if let Some(smoothed) = job.plan.smooth(&image) {
            image = smoothed;
        }

        enter(ProcessingStage::Upscaling);
        if let Some(upscaled) = job.plan.upscale(&image) {
            image = upscaled;
        }

        let mut written = Vec::with_capacity(job.formats.len());
        for &format in &job.formats {
            enter(ProcessingStage::FormatConversion);
            let encoded =
                OutputFormatHandler::convert_and_encode(image.clone(), format, self.config.jpeg_quality)?;

            enter(ProcessingStage::FileSaving);
            let output_path = ImageIOService::output_path(&job.output_dir, input, format);
            ImageIOService::write_output(&output_path, &encoded)?;
            log::debug!("Wrote {}", output_path.display());
            written.push(output_path);
        }

        enter(ProcessingStage::Completed);
        Ok(written)
    }
}
