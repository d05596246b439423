//! Driving the application controller the way a front end would

mod common;

use bgremover_pro::{
    App, AppEvent, AppResponse, Dialogs, OutputFormat, RemovalOutcome, SelectionEvent,
    SettingsEvent, SliderKind, ThumbnailGallery, TooltipChange, TooltipEvent, TooltipTarget,
};
use common::{init_logging, write_marked_jpeg, write_png, HalfMaskRemover};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingDialogs {
    accept_default: bool,
    messages: Vec<String>,
}

impl Dialogs for RecordingDialogs {
    fn warning(&mut self, title: &str, message: &str) {
        self.messages.push(format!("warning|{title}|{message}"));
    }

    fn info(&mut self, title: &str, message: &str) {
        self.messages.push(format!("info|{title}|{message}"));
    }

    fn error(&mut self, title: &str, message: &str) {
        self.messages.push(format!("error|{title}|{message}"));
    }

    fn confirm(&mut self, title: &str, _message: &str) -> bool {
        self.messages.push(format!("confirm|{title}"));
        self.accept_default
    }

    fn choose_directory(&mut self) -> Option<PathBuf> {
        None
    }

    fn open_directory(&mut self, path: &Path) {
        self.messages.push(format!("open|{}", path.display()));
    }
}

#[test]
fn full_session_with_custom_settings() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let default_out = temp_dir.path().join("Desktop").join("output_images");
    let marker = b"BROKEN";
    let good = write_png(temp_dir.path(), "portrait.png", 60, 40, [90, 90, 90]);
    let bad = write_marked_jpeg(temp_dir.path(), "bad.jpg", marker);

    let mut app = App::new(HalfMaskRemover::poisoned_by(marker), ThumbnailGallery::new())
        .with_default_output_dir(&default_out);
    let mut dialogs = RecordingDialogs {
        accept_default: true,
        ..RecordingDialogs::default()
    };
    let now = Instant::now();

    for event in [
        AppEvent::Selection(SelectionEvent::Add(vec![good.clone(), bad.clone(), good.clone()])),
        AppEvent::Settings(SettingsEvent::ToggleDefaults(false)),
        AppEvent::Settings(SettingsEvent::SliderMoved(SliderKind::ResizePercent, 50)),
        AppEvent::Settings(SettingsEvent::SliderMoved(SliderKind::UpscaleFactor, 4)),
        AppEvent::Settings(SettingsEvent::FormatSelected(OutputFormat::WebP)),
    ] {
        assert_eq!(app.handle(event, now, &mut dialogs), AppResponse::None);
    }

    // Duplicates are dropped and both entries get a preview
    assert_eq!(app.selection().len(), 2);
    assert_eq!(app.selection().surface().thumbnails().len(), 2);

    let AppResponse::Removal(RemovalOutcome::Finished(report)) =
        app.handle(AppEvent::RemoveBackground, now, &mut dialogs)
    else {
        panic!("expected a finished batch");
    };

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failures.len(), 1);
    let written = &report.written[0];
    assert_eq!(written, &default_out.join("portrait_no_bg.webp"));

    let output = image::open(written).unwrap();
    assert_eq!((output.width(), output.height()), (120, 80));

    assert_eq!(
        dialogs.messages,
        vec![
            "confirm|No Output Directory".to_string(),
            "info|Processing Complete|Successfully processed 1 out of 2 images.".to_string(),
            format!("open|{}", default_out.display()),
        ]
    );

    // The accepted default sticks for the next run
    app.handle(AppEvent::Selection(SelectionEvent::Remove(bad)), now, &mut dialogs);
    app.handle(AppEvent::RemoveBackground, now, &mut dialogs);
    assert_eq!(
        dialogs.messages.iter().filter(|m| m.starts_with("confirm")).count(),
        1
    );
}

#[test]
fn clearing_the_selection_blocks_processing() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let input = write_png(temp_dir.path(), "a.png", 4, 4, [0, 0, 0]);
    let remover = HalfMaskRemover::new();
    let mut app = App::new(remover.clone(), ThumbnailGallery::new());
    let mut dialogs = RecordingDialogs::default();
    let now = Instant::now();

    app.handle(AppEvent::Selection(SelectionEvent::Add(vec![input])), now, &mut dialogs);
    app.handle(AppEvent::Selection(SelectionEvent::Clear), now, &mut dialogs);
    let response = app.handle(AppEvent::RemoveBackground, now, &mut dialogs);

    assert_eq!(response, AppResponse::Removal(RemovalOutcome::NoSelection));
    assert_eq!(
        dialogs.messages,
        vec!["warning|No Images Selected|Please select images to remove backgrounds.".to_string()]
    );
    assert_eq!(remover.call_count(), 0);
    assert!(app.selection().surface().thumbnails().is_empty());
}

#[test]
fn tooltip_lifecycle_through_the_controller() {
    init_logging();
    let mut app = App::new(HalfMaskRemover::new(), ThumbnailGallery::new());
    let mut dialogs = RecordingDialogs::default();
    let target = TooltipTarget::DefaultsToggle;
    let t0 = Instant::now();

    app.handle(AppEvent::Tooltip(target, TooltipEvent::Enter { origin: (300, 400) }), t0, &mut dialogs);
    app.handle(AppEvent::Tooltip(target, TooltipEvent::Motion { x: 305, y: 410 }), t0, &mut dialogs);
    let shown = app.handle(
        AppEvent::Tooltip(target, TooltipEvent::Tick),
        t0 + Duration::from_millis(500),
        &mut dialogs,
    );
    assert_eq!(shown, AppResponse::Tooltip(target, TooltipChange::Shown { x: 315, y: 420 }));

    let hidden = app.handle(
        AppEvent::Tooltip(target, TooltipEvent::Leave),
        t0 + Duration::from_millis(900),
        &mut dialogs,
    );
    assert_eq!(hidden, AppResponse::Tooltip(target, TooltipChange::Hidden));
}
