//! Service layer for output formats, file I/O and progress reporting

pub mod format;
pub mod io;
pub mod progress;

pub use format::{OutputFormatHandler, DEFAULT_JPEG_QUALITY};
pub use io::ImageIOService;
pub use progress::{
    BatchProgress, ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage,
    ProgressReporter, ProgressTracker,
};
