//! Progress bar reporter for the `--progress` flag

use crate::services::{BatchProgress, ProcessingStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

pub(crate) struct IndicatifProgressReporter {
    bar: ProgressBar,
}

impl IndicatifProgressReporter {
    pub(crate) fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

impl ProgressReporter for IndicatifProgressReporter {
    fn report_stage(&self, file: &Path, stage: ProcessingStage) {
        let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        self.bar.set_message(format!("{name}: {}", stage.description()));
    }

    fn report_progress(&self, progress: &BatchProgress) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.completed as u64);
    }

    fn report_error(&self, file: &Path, stage: ProcessingStage, error: &str) {
        self.bar
            .println(format!("❌ {} ({}): {}", file.display(), stage.description(), error));
    }

    fn report_completion(&self, succeeded: usize, total: usize, elapsed_ms: u64) {
        self.bar.finish_with_message(format!(
            "✅ {succeeded}/{total} images in {:.1}s",
            elapsed_ms as f64 / 1000.0
        ));
    }
}
