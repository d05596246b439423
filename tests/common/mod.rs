//! Shared helpers for integration tests: a deterministic remover and image fixtures

#![allow(dead_code)]

use bgremover_pro::{BackgroundRemover, BgRemoverError, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Route library `log` output to the test harness; safe to call repeatedly
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Remover that keeps the top half of the image and clears the bottom half
///
/// Inputs whose bytes contain `poison` fail like a model error would.
#[derive(Debug, Clone, Default)]
pub struct HalfMaskRemover {
    pub calls: Arc<Mutex<Vec<usize>>>,
    poison: Option<Vec<u8>>,
}

impl HalfMaskRemover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poisoned_by(marker: &[u8]) -> Self {
        Self {
            poison: Some(marker.to_vec()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl BackgroundRemover for HalfMaskRemover {
    fn remove(&mut self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(image_bytes.len());

        if let Some(marker) = &self.poison {
            if image_bytes.windows(marker.len()).any(|w| w == marker.as_slice()) {
                return Err(BgRemoverError::inference("poisoned input"));
            }
        }

        let mut rgba = image::load_from_memory(image_bytes)
            .map_err(|e| BgRemoverError::processing(e.to_string()))?
            .to_rgba8();
        let half = rgba.height() / 2;
        for (_, y, pixel) in rgba.enumerate_pixels_mut() {
            if y >= half {
                pixel[3] = 0;
            }
        }
        Ok(encode(&DynamicImage::ImageRgba8(rgba), ImageFormat::Png))
    }

    fn name(&self) -> &str {
        "half-mask"
    }
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

/// Write a solid-color PNG
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    std::fs::write(&path, encode(&image, ImageFormat::Png)).unwrap();
    path
}

/// Write a JPEG whose bytes carry a marker in a trailing comment-like tail
pub fn write_marked_jpeg(dir: &Path, name: &str, marker: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])));
    let mut bytes = encode(&image, ImageFormat::Jpeg);
    bytes.extend_from_slice(marker);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Half-transparent RGBA image
pub fn half_transparent(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([200, 0, 0, 255])
        } else {
            Rgba([0, 0, 200, 0])
        }
    })
}
