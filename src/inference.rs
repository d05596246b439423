//! Inference abstractions
//!
//! Two layers: an [`InferenceBackend`] runs a segmentation model on an NCHW
//! tensor, and a [`BackgroundRemover`] turns encoded image bytes into an
//! encoded cut-out. [`SegmentationRemover`] bridges them with the tensor
//! preparation and mask handling shared by every U²-Net style model.

use crate::config::RemoverConfig;
use crate::error::{BgRemoverError, Result};
use crate::models::PreprocessingConfig;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use ndarray::Array4;
use std::io::Cursor;
use std::time::Duration;

/// Trait for inference backends
pub trait InferenceBackend {
    /// Initialize the backend with the given configuration
    ///
    /// Returns the model load time on first initialization, `None` afterwards.
    ///
    /// # Errors
    /// - Model loading or session creation failures
    fn initialize(&mut self, config: &RemoverConfig) -> Result<Option<Duration>>;

    /// Run inference on the input tensor and return the first model output
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Model inference failures
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Tensor preparation parameters of the loaded model
    fn preprocessing(&self) -> PreprocessingConfig;

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Something that strips the background from an encoded image
pub trait BackgroundRemover {
    /// Remove the background from encoded image bytes
    ///
    /// Returns PNG bytes with an alpha channel at the source resolution.
    ///
    /// # Errors
    /// - Undecodable input
    /// - Model failures
    fn remove(&mut self, image_bytes: &[u8]) -> Result<Vec<u8>>;

    /// Remover name for logs
    fn name(&self) -> &str;
}

impl<T: BackgroundRemover + ?Sized> BackgroundRemover for Box<T> {
    fn remove(&mut self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        (**self).remove(image_bytes)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Tensor preparation for segmentation models
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Convert an image into a normalized `1x3xSxS` tensor
    ///
    /// The image is stretched to the square model input with Lanczos3, scaled
    /// by its own maximum channel value, then normalized with the model's
    /// per-channel mean and standard deviation.
    #[must_use]
    pub fn preprocess(image: &DynamicImage, config: &PreprocessingConfig) -> Array4<f32> {
        let size = config.input_size;
        let rgb = image::imageops::resize(&image.to_rgb8(), size, size, FilterType::Lanczos3);

        let max_value = rgb.as_raw().iter().copied().max().unwrap_or(0);
        let scale = f32::from(max_value).max(1e-6);

        let side = size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, side, side));

        #[allow(clippy::indexing_slicing)]
        // Tensor is allocated with the resized image's dimensions
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for channel in 0..3 {
                let value = f32::from(pixel[channel]) / scale;
                tensor[[0, channel, y as usize, x as usize]] =
                    (value - config.mean[channel]) / config.std[channel];
            }
        }

        tensor
    }

    /// Turn the first output channel into an 8-bit mask at the source size
    ///
    /// Values are min-max normalized. A constant prediction is clamped to
    /// `[0, 1]` instead.
    ///
    /// # Errors
    /// - Output tensor with zero-sized spatial dimensions
    pub fn output_to_mask(output: &Array4<f32>, width: u32, height: u32) -> Result<GrayImage> {
        let (_, channels, out_height, out_width) = output.dim();
        if channels == 0 || out_height == 0 || out_width == 0 {
            return Err(BgRemoverError::inference(format!(
                "Unexpected output tensor shape {:?}",
                output.dim()
            )));
        }

        let prediction = output.slice(ndarray::s![0, 0, .., ..]);
        let (min, max) = prediction
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;

        let mut mask = GrayImage::new(out_width as u32, out_height as u32);
        for ((y, x), &value) in prediction.indexed_iter() {
            let normalized = if range > f32::EPSILON {
                (value - min) / range
            } else {
                value.clamp(0.0, 1.0)
            };
            mask.put_pixel(x as u32, y as u32, Luma([(normalized * 255.0) as u8]));
        }

        if mask.dimensions() == (width, height) {
            return Ok(mask);
        }
        Ok(image::imageops::resize(&mask, width, height, FilterType::Lanczos3))
    }

    /// Use a mask as the alpha channel of the source image
    #[must_use]
    pub fn apply_mask(image: &DynamicImage, mask: &GrayImage) -> RgbaImage {
        let mut rgba = image.to_rgba8();
        for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
            pixel[3] = alpha[0];
        }
        rgba
    }
}

/// Background remover running a segmentation model through an inference backend
pub struct SegmentationRemover<B: InferenceBackend> {
    backend: B,
    config: RemoverConfig,
}

impl<B: InferenceBackend> SegmentationRemover<B> {
    /// Wrap a backend; it is initialized lazily on first use
    pub fn new(backend: B, config: RemoverConfig) -> Self {
        Self { backend, config }
    }

    /// Initialize the backend now instead of on the first image
    ///
    /// # Errors
    /// - Backend initialization failures
    pub fn initialize(&mut self) -> Result<Option<Duration>> {
        self.backend.initialize(&self.config)
    }

    /// Remove the background from a decoded image
    ///
    /// # Errors
    /// - Backend initialization or inference failures
    pub fn remove_image(&mut self, image: &DynamicImage) -> Result<RgbaImage> {
        if !self.backend.is_initialized() {
            if let Some(load_time) = self.backend.initialize(&self.config)? {
                log::info!(
                    "Loaded {} model in {:.0}ms",
                    self.config.model,
                    load_time.as_secs_f64() * 1000.0
                );
            }
        }

        let tensor = ImagePreprocessor::preprocess(image, &self.backend.preprocessing());
        let output = self.backend.infer(&tensor)?;
        let mask = ImagePreprocessor::output_to_mask(&output, image.width(), image.height())?;
        Ok(ImagePreprocessor::apply_mask(image, &mask))
    }

    /// Access the wrapped backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: InferenceBackend> BackgroundRemover for SegmentationRemover<B> {
    #[tracing::instrument(skip_all, fields(backend = self.backend.name(), bytes = image_bytes.len()))]
    fn remove(&mut self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let image = image::load_from_memory(image_bytes).map_err(|e| {
            BgRemoverError::processing_stage_error("decode input", &e.to_string(), None)
        })?;

        let cutout = self.remove_image(&image)?;

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(cutout).write_to(&mut buffer, image::ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    fn name(&self) -> &str {
        self.backend.name()
    }
}
