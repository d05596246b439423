//! Progress reporting service
//!
//! Separates progress reporting from the pipeline so that every front end
//! (progress bar, log lines, test harness) can render it its own way.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Per-file stages of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Reading the input bytes
    Reading,
    /// Running the background remover
    BackgroundRemoval,
    /// Decoding the cut-out to RGBA
    Decoding,
    /// Percentage or max-dimension resize
    Resizing,
    /// Gaussian blur
    Smoothing,
    /// Integer upscale
    Upscaling,
    /// Converting to the output format
    FormatConversion,
    /// Writing the output file
    FileSaving,
    /// File finished
    Completed,
}

impl ProcessingStage {
    /// Human-readable description of the stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::Reading => "Reading input image",
            ProcessingStage::BackgroundRemoval => "Removing background",
            ProcessingStage::Decoding => "Decoding result",
            ProcessingStage::Resizing => "Resizing",
            ProcessingStage::Smoothing => "Smoothing edges",
            ProcessingStage::Upscaling => "Upscaling",
            ProcessingStage::FormatConversion => "Converting output format",
            ProcessingStage::FileSaving => "Saving result",
            ProcessingStage::Completed => "Completed",
        }
    }
}

/// Batch progress after a file finished
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    /// Files finished so far, successful or not
    pub completed: usize,
    /// Files in the batch
    pub total: usize,
    /// Files finished successfully
    pub succeeded: usize,
    /// Name of the file that just finished
    pub current_file: String,
    /// Elapsed time since the batch started (milliseconds)
    pub elapsed_ms: u64,
}

impl BatchProgress {
    /// Completed fraction in `[0, 1]`; an empty batch counts as done
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Completed percentage, rounded down
    #[must_use]
    pub fn percentage(&self) -> u8 {
        (self.fraction() * 100.0).floor().clamp(0.0, 100.0) as u8
    }

    /// Number of failed files so far
    #[must_use]
    pub fn failed(&self) -> usize {
        self.completed - self.succeeded
    }
}

/// Trait for reporting progress during batch processing
pub trait ProgressReporter: Send + Sync {
    /// A file entered a new stage
    fn report_stage(&self, file: &Path, stage: ProcessingStage);

    /// A file finished, successfully or not
    fn report_progress(&self, progress: &BatchProgress);

    /// A file failed and was skipped
    fn report_error(&self, file: &Path, stage: ProcessingStage, error: &str);

    /// The batch finished
    fn report_completion(&self, succeeded: usize, total: usize, elapsed_ms: u64) {
        let _ = (succeeded, total, elapsed_ms);
    }
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for Arc<T> {
    fn report_stage(&self, file: &Path, stage: ProcessingStage) {
        (**self).report_stage(file, stage);
    }

    fn report_progress(&self, progress: &BatchProgress) {
        (**self).report_progress(progress);
    }

    fn report_error(&self, file: &Path, stage: ProcessingStage, error: &str) {
        (**self).report_error(file, stage, error);
    }

    fn report_completion(&self, succeeded: usize, total: usize, elapsed_ms: u64) {
        (**self).report_completion(succeeded, total, elapsed_ms);
    }
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_stage(&self, _file: &Path, _stage: ProcessingStage) {}

    fn report_progress(&self, _progress: &BatchProgress) {}

    fn report_error(&self, _file: &Path, _stage: ProcessingStage, _error: &str) {}
}

/// Console progress reporter that logs progress
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// With `verbose` set, every stage transition is logged as well.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_stage(&self, file: &Path, stage: ProcessingStage) {
        if self.verbose {
            log::info!("{}: {}", file.display(), stage.description());
        }
    }

    fn report_progress(&self, progress: &BatchProgress) {
        log::info!(
            "[{}%] {}/{} {}",
            progress.percentage(),
            progress.completed,
            progress.total,
            progress.current_file
        );
    }

    fn report_error(&self, file: &Path, stage: ProcessingStage, error: &str) {
        log::error!(
            "❌ Error processing {} during {}: {}",
            file.display(),
            stage.description(),
            error
        );
    }

    fn report_completion(&self, succeeded: usize, total: usize, elapsed_ms: u64) {
        log::info!(
            "✅ Processed {} of {} images in {}ms",
            succeeded,
            total,
            elapsed_ms
        );
    }
}

/// Tracks batch counters and forwards them to a reporter
pub struct ProgressTracker {
    reporter: Box<dyn ProgressReporter>,
    start_time: Instant,
    total: usize,
    completed: usize,
    succeeded: usize,
}

impl ProgressTracker {
    /// Start tracking a batch of `total` files
    #[must_use]
    pub fn new(reporter: Box<dyn ProgressReporter>, total: usize) -> Self {
        Self {
            reporter,
            start_time: Instant::now(),
            total,
            completed: 0,
            succeeded: 0,
        }
    }

    /// Tracker that reports nothing
    #[must_use]
    pub fn no_op(total: usize) -> Self {
        Self::new(Box::new(NoOpProgressReporter), total)
    }

    /// Report a stage transition of the current file
    pub fn report_stage(&self, file: &Path, stage: ProcessingStage) {
        self.reporter.report_stage(file, stage);
    }

    /// Report a per-file failure
    pub fn report_error(&self, file: &Path, stage: ProcessingStage, error: &str) {
        self.reporter.report_error(file, stage, error);
    }

    /// Count a finished file and report the new batch progress
    pub fn file_finished(&mut self, file: &Path, success: bool) -> BatchProgress {
        self.completed += 1;
        if success {
            self.succeeded += 1;
        }

        let progress = BatchProgress {
            completed: self.completed,
            total: self.total,
            succeeded: self.succeeded,
            current_file: file
                .file_name()
                .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned()),
            elapsed_ms: self.elapsed_ms(),
        };
        self.reporter.report_progress(&progress);
        progress
    }

    /// Report batch completion
    pub fn finish(&self) {
        self.reporter
            .report_completion(self.succeeded, self.total, self.elapsed_ms());
    }

    /// Elapsed time since tracking started (milliseconds)
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Files finished so far
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Files finished successfully so far
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingReporter {
        progress: Arc<Mutex<Vec<BatchProgress>>>,
        errors: Arc<Mutex<Vec<(PathBuf, ProcessingStage, String)>>>,
        completions: Arc<Mutex<Vec<(usize, usize)>>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn report_stage(&self, _file: &Path, _stage: ProcessingStage) {}

        fn report_progress(&self, progress: &BatchProgress) {
            self.progress.lock().unwrap().push(progress.clone());
        }

        fn report_error(&self, file: &Path, stage: ProcessingStage, error: &str) {
            self.errors
                .lock()
                .unwrap()
                .push((file.to_path_buf(), stage, error.to_string()));
        }

        fn report_completion(&self, succeeded: usize, total: usize, _elapsed_ms: u64) {
            self.completions.lock().unwrap().push((succeeded, total));
        }
    }

    #[test]
    fn test_stage_descriptions() {
        assert_eq!(ProcessingStage::Smoothing.description(), "Smoothing edges");
        assert_eq!(ProcessingStage::FileSaving.description(), "Saving result");
    }

    #[test]
    fn test_batch_progress_percentage() {
        let mut progress = BatchProgress {
            completed: 1,
            total: 3,
            succeeded: 1,
            current_file: "a.png".to_string(),
            elapsed_ms: 0,
        };
        assert_eq!(progress.percentage(), 33);

        progress.completed = 3;
        assert_eq!(progress.percentage(), 100);
        assert_eq!(progress.failed(), 2);

        progress.total = 0;
        progress.completed = 0;
        progress.succeeded = 0;
        assert!((progress.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tracker_counts_and_reports() {
        let reporter = RecordingReporter::default();
        let mut tracker = ProgressTracker::new(Box::new(reporter.clone()), 3);

        tracker.file_finished(Path::new("/in/a.png"), true);
        tracker.report_error(Path::new("/in/b.png"), ProcessingStage::BackgroundRemoval, "boom");
        tracker.file_finished(Path::new("/in/b.png"), false);
        let last = tracker.file_finished(Path::new("/in/c.png"), true);
        tracker.finish();

        assert_eq!(last.completed, 3);
        assert_eq!(last.succeeded, 2);
        assert_eq!(last.current_file, "c.png");
        assert_eq!(last.percentage(), 100);

        let progress = reporter.progress.lock().unwrap();
        let fractions: Vec<usize> = progress.iter().map(|p| p.completed).collect();
        assert_eq!(fractions, vec![1, 2, 3]);

        let errors = reporter.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].1, ProcessingStage::BackgroundRemoval);

        assert_eq!(*reporter.completions.lock().unwrap(), vec![(2, 3)]);
    }

    #[test]
    fn test_no_op_and_console_reporters() {
        let mut tracker = ProgressTracker::no_op(1);
        tracker.report_stage(Path::new("x.png"), ProcessingStage::Reading);
        tracker.file_finished(Path::new("x.png"), true);
        assert_eq!(tracker.completed(), 1);
        assert_eq!(tracker.succeeded(), 1);

        let console = ConsoleProgressReporter::new(true);
        console.report_stage(Path::new("x.png"), ProcessingStage::Upscaling);
        console.report_error(Path::new("x.png"), ProcessingStage::Decoding, "bad data");
        console.report_completion(0, 1, 5);
    }

    #[test]
    fn test_trait_object_safety() {
        let reporters: Vec<Box<dyn ProgressReporter>> = vec![
            Box::new(NoOpProgressReporter),
            Box::new(ConsoleProgressReporter::new(false)),
        ];
        for reporter in &reporters {
            reporter.report_stage(Path::new("a.jpg"), ProcessingStage::Completed);
        }
    }
}
