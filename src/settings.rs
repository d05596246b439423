//! Settings panel model: three sliders, a format selector and a defaults toggle

use crate::config::{OutputFormat, ProcessingSettings, SliderKind};
use std::collections::HashMap;

/// User interaction with the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    /// The "use defaults" checkbox changed
    ToggleDefaults(bool),
    /// A slider was dragged to a raw position
    SliderMoved(SliderKind, u32),
    FormatSelected(OutputFormat),
}

/// Display state of one slider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderState {
    pub kind: SliderKind,
    pub value: u32,
    pub enabled: bool,
}

impl SliderState {
    /// Rendered label, e.g. `Resize Image (%): 100`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}: {}", self.kind.label(), self.value)
    }
}

/// State behind the settings panel
#[derive(Debug, Clone)]
pub struct SettingsPanel {
    use_defaults: bool,
    sliders: HashMap<SliderKind, u32>,
    format: OutputFormat,
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsPanel {
    /// Panel in its initial state: defaults on, PNG selected
    #[must_use]
    pub fn new() -> Self {
        Self {
            use_defaults: true,
            sliders: SliderKind::ALL
                .iter()
                .map(|kind| (*kind, kind.default_value()))
                .collect(),
            format: OutputFormat::default(),
        }
    }

    /// Apply a panel event
    pub fn update(&mut self, event: SettingsEvent) {
        match event {
            SettingsEvent::ToggleDefaults(on) => self.set_use_defaults(on),
            SettingsEvent::SliderMoved(kind, value) => {
                if self.use_defaults {
                    log::debug!("Ignoring {} move while defaults are active", kind.label());
                } else {
                    self.sliders.insert(kind, kind.clamp(value));
                }
            },
            SettingsEvent::FormatSelected(format) => self.format = format,
        }
    }

    fn set_use_defaults(&mut self, on: bool) {
        self.use_defaults = on;
        if on {
            for kind in SliderKind::ALL {
                self.sliders.insert(kind, kind.default_value());
            }
        }
    }

    /// Settings to hand to the pipeline
    ///
    /// With defaults active the numeric fields are pinned; the format is
    /// always the selector's current value.
    #[must_use]
    pub fn current_settings(&self) -> ProcessingSettings {
        if self.use_defaults {
            return ProcessingSettings::defaults_with_format(self.format);
        }
        ProcessingSettings {
            smoothing_radius: self.slider_value(SliderKind::SmoothEdges),
            resize_percent: self.slider_value(SliderKind::ResizePercent),
            upscale_factor: self.slider_value(SliderKind::UpscaleFactor),
            format: self.format,
        }
    }

    #[must_use]
    pub fn is_using_defaults(&self) -> bool {
        self.use_defaults
    }

    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// Displayed slider value, clamped to its range
    #[must_use]
    pub fn slider_value(&self, kind: SliderKind) -> u32 {
        kind.clamp(
            self.sliders
                .get(&kind)
                .copied()
                .unwrap_or_else(|| kind.default_value()),
        )
    }

    /// Display state of every slider in panel order
    #[must_use]
    pub fn sliders(&self) -> Vec<SliderState> {
        SliderKind::ALL
            .iter()
            .map(|&kind| SliderState {
                kind,
                value: self.slider_value(kind),
                enabled: !self.use_defaults,
            })
            .collect()
    }
}
