//! Application controller
//!
//! Owns the selection, the settings panel, the tooltips and the background
//! remover, and runs the "Remove Background" flow. Every user decision point
//! goes through [`Dialogs`], so a terminal, a test harness or a GUI can drive
//! the same controller.

use crate::{
    config::{SliderKind, DEFAULTS_TOOLTIP, FORMAT_TOOLTIP},
    inference::BackgroundRemover,
    processor::{BatchOutcome, BatchProcessor, BatchReport, ProcessingJob, ProcessorConfig},
    registry::{PreviewSurface, SelectionEvent, SelectionRegistry},
    services::{ImageIOService, OutputFormatHandler, ProgressReporter},
    settings::{SettingsEvent, SettingsPanel},
    tooltip::{Tooltip, TooltipChange, TooltipEvent},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// User-facing prompts and notifications
pub trait Dialogs {
    /// Blocking warning
    fn warning(&mut self, title: &str, message: &str);

    /// Blocking information message
    fn info(&mut self, title: &str, message: &str);

    fn error(&mut self, title: &str, message: &str);

    /// Yes/no question; `true` for yes
    fn confirm(&mut self, title: &str, message: &str) -> bool;

    /// Let the user pick a directory; `None` when cancelled
    fn choose_directory(&mut self) -> Option<PathBuf>;

    /// Reveal the output directory after a successful batch
    fn open_directory(&mut self, path: &Path) {
        let _ = path;
    }
}

/// Widgets carrying a hover tooltip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TooltipTarget {
    Slider(SliderKind),
    FormatSelector,
    DefaultsToggle,
}

impl TooltipTarget {
    pub const ALL: [TooltipTarget; 5] = [
        TooltipTarget::Slider(SliderKind::SmoothEdges),
        TooltipTarget::Slider(SliderKind::ResizePercent),
        TooltipTarget::Slider(SliderKind::UpscaleFactor),
        TooltipTarget::FormatSelector,
        TooltipTarget::DefaultsToggle,
    ];

    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            TooltipTarget::Slider(kind) => kind.tooltip(),
            TooltipTarget::FormatSelector => FORMAT_TOOLTIP,
            TooltipTarget::DefaultsToggle => DEFAULTS_TOOLTIP,
        }
    }
}

/// Everything the user can do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Selection(SelectionEvent),
    Settings(SettingsEvent),
    Tooltip(TooltipTarget, TooltipEvent),
    /// The "Choose Output Folder" button
    ChooseOutputDirectory,
    /// The "Remove Background" button
    RemoveBackground,
}

/// How a "Remove Background" request ended
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// Nothing selected; no work done
    NoSelection,
    /// The user declined the default and chose no directory
    NoOutputDirectory,
    /// The batch ran to the end
    Finished(BatchReport),
    /// The batch stopped on a fatal error
    Aborted(String),
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq)]
pub enum AppResponse {
    None,
    Tooltip(TooltipTarget, TooltipChange),
    OutputDirectory(PathBuf),
    Removal(RemovalOutcome),
}

pub struct App<R: BackgroundRemover, S: PreviewSurface> {
    selection: SelectionRegistry<S>,
    settings: SettingsPanel,
    tooltips: HashMap<TooltipTarget, Tooltip>,
    output_dir: Option<PathBuf>,
    default_output_dir: PathBuf,
    processor: BatchProcessor<R>,
}

impl<R: BackgroundRemover, S: PreviewSurface> App<R, S> {
    /// Controller with the default output directory `~/Desktop/output_images`
    pub fn new(remover: R, surface: S) -> Self {
        Self::with_config(remover, surface, ProcessorConfig::default())
    }

    pub fn with_config(remover: R, surface: S, config: ProcessorConfig) -> Self {
        Self {
            selection: SelectionRegistry::new(surface),
            settings: SettingsPanel::new(),
            tooltips: TooltipTarget::ALL
                .iter()
                .map(|&target| (target, Tooltip::new(target.text())))
                .collect(),
            output_dir: None,
            default_output_dir: ImageIOService::default_output_dir(),
            processor: BatchProcessor::with_config(remover, config),
        }
    }

    /// Use another directory as the offered default
    #[must_use]
    pub fn with_default_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_output_dir = dir.into();
        self
    }

    /// Report batch progress to the given reporter
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.processor = self.processor.with_progress_reporter(reporter);
        self
    }

    /// Preset the output directory, as if chosen by the user
    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = Some(dir.into());
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn selection(&self) -> &SelectionRegistry<S> {
        &self.selection
    }

    pub fn settings(&self) -> &SettingsPanel {
        &self.settings
    }

    pub fn tooltip(&self, target: TooltipTarget) -> Option<&Tooltip> {
        self.tooltips.get(&target)
    }

    pub fn remover(&self) -> &R {
        self.processor.remover()
    }

    /// Handle one user event at time `now`
    pub fn handle(&mut self, event: AppEvent, now: Instant, dialogs: &mut dyn Dialogs) -> AppResponse {
        match event {
            AppEvent::Selection(event) => {
                self.selection.update(event);
                AppResponse::None
            },
            AppEvent::Settings(event) => {
                self.settings.update(event);
                AppResponse::None
            },
            AppEvent::Tooltip(target, event) => self
                .tooltips
                .get_mut(&target)
                .and_then(|tooltip| tooltip.update(event, now))
                .map_or(AppResponse::None, |change| AppResponse::Tooltip(target, change)),
            AppEvent::ChooseOutputDirectory => match dialogs.choose_directory() {
                Some(dir) => {
                    log::info!("Output directory: {}", dir.display());
                    self.output_dir = Some(dir.clone());
                    AppResponse::OutputDirectory(dir)
                },
                None => AppResponse::None,
            },
            AppEvent::RemoveBackground => AppResponse::Removal(self.remove_background(dialogs)),
        }
    }

    /// Make sure an output directory is set, prompting when it is not
    fn ensure_output_directory(&mut self, dialogs: &mut dyn Dialogs) -> Option<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Some(dir.clone());
        }

        let chosen = prompt_output_directory(&self.default_output_dir, dialogs);
        self.output_dir.clone_from(&chosen);
        chosen
    }

    /// The "Remove Background" flow
    pub fn remove_background(&mut self, dialogs: &mut dyn Dialogs) -> RemovalOutcome {
        if self.selection.is_empty() {
            dialogs.warning("No Images Selected", "Please select images to remove backgrounds.");
            return RemovalOutcome::NoSelection;
        }

        let Some(output_dir) = self.ensure_output_directory(dialogs) else {
            log::info!("No output directory chosen, nothing processed");
            return RemovalOutcome::NoOutputDirectory;
        };

        let settings = self.settings.current_settings();
        OutputFormatHandler::validate_for_background_removal(settings.format);
        log::debug!("Settings: {:?}", settings);
        let job = ProcessingJob::from_settings(&settings, output_dir);
        let inputs = self.selection.list().to_vec();

        match self.processor.run(&inputs, &job) {
            Ok(report) => {
                match report.outcome() {
                    BatchOutcome::Completed {
                        succeeded,
                        total,
                        output_dir,
                    } => {
                        dialogs.info(
                            "Processing Complete",
                            &format!("Successfully processed {succeeded} out of {total} images."),
                        );
                        dialogs.open_directory(&output_dir);
                    },
                    BatchOutcome::NothingProcessed { .. } => dialogs.warning(
                        "No Images Processed",
                        "No images were processed successfully. Please check for errors.",
                    ),
                }
                RemovalOutcome::Finished(report)
            },
            Err(e) => {
                log::error!("Batch aborted: {}", e);
                dialogs.error(
                    "Unexpected Error",
                    &format!("An unexpected error occurred: {e}"),
                );
                RemovalOutcome::Aborted(e.to_string())
            },
        }
    }
}

/// Ask for an output directory: the default location first, then the chooser
///
/// `None` means the user declined both.
pub fn prompt_output_directory(default_dir: &Path, dialogs: &mut dyn Dialogs) -> Option<PathBuf> {
    let message = format!(
        "No output directory selected.\nWould you like to use this default location?\n\n{}",
        default_dir.display()
    );
    if dialogs.confirm("No Output Directory", &message) {
        Some(default_dir.to_path_buf())
    } else {
        dialogs.choose_directory()
    }
}
