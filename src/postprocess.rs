//! Post-processing applied to a cut-out: resize, smoothing and upscale
//!
//! Steps always run in that order. Every dimension computation truncates and
//! never yields a zero-sized image.

use crate::config::{FolderPreset, ProcessingSettings};
use image::imageops::FilterType;
use image::RgbaImage;

/// How the cut-out is resized before smoothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Keep the size
    Keep,
    /// Scale both dimensions by a percentage
    Percent(u32),
    /// Shrink so the longest side fits, never enlarge
    MaxDimension(u32),
}

/// Explicit post-processing configuration for one batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessPlan {
    pub resize: ResizePolicy,
    /// Gaussian blur sigma; `None` disables smoothing
    pub blur_sigma: Option<f32>,
    /// Integer multiplier applied last; 1 disables upscaling
    pub upscale_factor: u32,
}

impl Default for PostProcessPlan {
    fn default() -> Self {
        Self {
            resize: ResizePolicy::Keep,
            blur_sigma: None,
            upscale_factor: 1,
        }
    }
}

impl PostProcessPlan {
    /// Plan for the interactive settings
    #[must_use]
    pub fn from_settings(settings: &ProcessingSettings) -> Self {
        let resize = if settings.resize_percent == 100 {
            ResizePolicy::Keep
        } else {
            ResizePolicy::Percent(settings.resize_percent)
        };
        let blur_sigma = (settings.smoothing_radius > 0).then(|| settings.smoothing_radius as f32);

        Self {
            resize,
            blur_sigma,
            upscale_factor: settings.upscale_factor,
        }
    }

    /// Plan for the folder batch
    #[must_use]
    pub fn from_preset(preset: &FolderPreset) -> Self {
        Self {
            resize: ResizePolicy::MaxDimension(preset.max_dimension),
            blur_sigma: preset.blur_sigma.filter(|sigma| *sigma > 0.0),
            upscale_factor: preset.upscale_factor,
        }
    }

    /// Whether the plan leaves the image untouched
    #[must_use]
    pub fn is_identity(&self) -> bool {
        matches!(self.resize, ResizePolicy::Keep | ResizePolicy::Percent(100))
            && self.blur_sigma.is_none()
            && self.upscale_factor <= 1
    }

    fn target_size_after_resize(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        match self.resize {
            ResizePolicy::Keep | ResizePolicy::Percent(100) => None,
            ResizePolicy::Percent(percent) => Some(scale_dimensions(width, height, percent)),
            ResizePolicy::MaxDimension(max) => fit_within(width, height, max),
        }
    }

    /// Resize step; returns `None` when it does not apply
    #[must_use]
    pub fn resize(&self, image: &RgbaImage) -> Option<RgbaImage> {
        let (width, height) = self.target_size_after_resize(image.width(), image.height())?;
        log::debug!(
            "Resizing {}x{} -> {}x{}",
            image.width(),
            image.height(),
            width,
            height
        );
        Some(image::imageops::resize(image, width, height, FilterType::Lanczos3))
    }

    /// Smoothing step; returns `None` when it does not apply
    #[must_use]
    pub fn smooth(&self, image: &RgbaImage) -> Option<RgbaImage> {
        let sigma = self.blur_sigma?;
        log::debug!("Gaussian blur with sigma {}", sigma);
        Some(image::imageops::blur(image, sigma))
    }

    /// Upscale step; returns `None` when it does not apply
    #[must_use]
    pub fn upscale(&self, image: &RgbaImage) -> Option<RgbaImage> {
        if self.upscale_factor <= 1 {
            return None;
        }
        let width = image.width().saturating_mul(self.upscale_factor);
        let height = image.height().saturating_mul(self.upscale_factor);
        log::debug!("Upscaling x{} -> {}x{}", self.upscale_factor, width, height);
        Some(image::imageops::resize(image, width, height, FilterType::Lanczos3))
    }

    /// Run all steps in order
    #[must_use]
    pub fn apply(&self, image: RgbaImage) -> RgbaImage {
        let image = self.resize(&image).unwrap_or(image);
        let image = self.smooth(&image).unwrap_or(image);
        self.upscale(&image).unwrap_or(image)
    }
}

/// Scale dimensions by a percentage, truncating, at least 1x1
#[must_use]
pub fn scale_dimensions(width: u32, height: u32, percent: u32) -> (u32, u32) {
    let scale = |value: u32| -> u32 {
        let scaled = u64::from(value) * u64::from(percent) / 100;
        u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
    };
    (scale(width), scale(height))
}

/// Dimensions shrunk so the longest side equals `max_dimension`
///
/// Returns `None` when the image already fits.
#[must_use]
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if longest <= max_dimension {
        return None;
    }
    let ratio = f64::from(max_dimension) / f64::from(longest);
    let scale = |value: u32| ((f64::from(value) * ratio) as u32).max(1);
    Some((scale(width), scale(height)))
}
