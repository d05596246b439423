//! Test utilities and mock backends for testing inference functionality
//!
//! Mocks for both inference layers so the pipeline can be tested without
//! model files or ONNX Runtime.

use crate::{
    config::RemoverConfig,
    error::{BgRemoverError, Result},
    inference::{BackgroundRemover, InferenceBackend},
    models::{ModelKind, PreprocessingConfig},
};
use image::{DynamicImage, RgbaImage};
use ndarray::Array4;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Encode an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Mock tensor backend whose mask keeps the left half of the input
#[derive(Debug)]
pub struct MockBackend {
    model: ModelKind,
    initialized: bool,
    infer_calls: usize,
    should_fail_inference: bool,
}

impl MockBackend {
    #[must_use]
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            initialized: false,
            infer_calls: 0,
            should_fail_inference: false,
        }
    }

    /// Create a mock backend that will fail during inference
    #[must_use]
    pub fn new_failing_inference() -> Self {
        Self {
            should_fail_inference: true,
            ..Self::new(ModelKind::U2Net)
        }
    }

    pub fn infer_calls(&self) -> usize {
        self.infer_calls
    }
}

impl InferenceBackend for MockBackend {
    fn initialize(&mut self, _config: &RemoverConfig) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None);
        }
        self.initialized = true;
        Ok(Some(Duration::from_millis(1)))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        if !self.initialized {
            return Err(BgRemoverError::internal("Backend not initialized"));
        }
        if self.should_fail_inference {
            return Err(BgRemoverError::inference("Mock inference failure"));
        }
        self.infer_calls += 1;

        let (_, _, height, width) = input.dim();
        Ok(Array4::from_shape_fn((1, 1, height, width), |(_, _, _, x)| {
            if x < width / 2 {
                1.0
            } else {
                0.0
            }
        }))
    }

    fn preprocessing(&self) -> PreprocessingConfig {
        self.model.preprocessing()
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Mock remover: left half opaque, right half transparent
///
/// Fails on undecodable bytes like a real remover, and additionally on any
/// input whose bytes contain `fail_marker` when one is set.
#[derive(Debug, Default, Clone)]
pub struct MockRemover {
    calls: Arc<Mutex<usize>>,
    fail_marker: Option<Vec<u8>>,
}

impl MockRemover {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_on(marker: &[u8]) -> Self {
        Self {
            fail_marker: Some(marker.to_vec()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl BackgroundRemover for MockRemover {
    fn remove(&mut self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        *self.calls.lock().unwrap() += 1;

        if let Some(marker) = &self.fail_marker {
            if image_bytes.windows(marker.len()).any(|w| w == marker.as_slice()) {
                return Err(BgRemoverError::inference("Mock remover refused input"));
            }
        }

        let image = image::load_from_memory(image_bytes)
            .map_err(|e| BgRemoverError::processing(format!("Mock remover cannot decode: {}", e)))?;
        let mut rgba: RgbaImage = image.to_rgba8();
        let half = rgba.width() / 2;
        for (x, _, pixel) in rgba.enumerate_pixels_mut() {
            pixel[3] = if x < half { 255 } else { 0 };
        }
        Ok(encode_png(&DynamicImage::ImageRgba8(rgba)))
    }

    fn name(&self) -> &str {
        "mock-remover"
    }
}
