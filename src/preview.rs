//! Thumbnail previews of the selection

use crate::postprocess::fit_within;
use crate::registry::PreviewSurface;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Longest side of a thumbnail
pub const THUMBNAIL_SIZE: u32 = 140;

/// One preview entry
#[derive(Debug, Clone, PartialEq)]
pub enum Thumbnail {
    /// Decoded image shrunk to fit `THUMBNAIL_SIZE`, with the file name caption
    Image {
        path: PathBuf,
        caption: String,
        pixels: RgbImage,
    },
    /// The file could not be decoded
    Error { path: PathBuf, message: String },
}

impl Thumbnail {
    pub fn path(&self) -> &Path {
        match self {
            Thumbnail::Image { path, .. } | Thumbnail::Error { path, .. } => path,
        }
    }

    /// Caption for images, error message otherwise
    pub fn text(&self) -> &str {
        match self {
            Thumbnail::Image { caption, .. } => caption,
            Thumbnail::Error { message, .. } => message,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Thumbnail::Error { .. })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Render a single thumbnail; never fails
pub fn render_thumbnail(path: &Path) -> Thumbnail {
    let name = display_name(path);
    match image::open(path) {
        Ok(image) => {
            let rgb = image.to_rgb8();
            let pixels = match fit_within(rgb.width(), rgb.height(), THUMBNAIL_SIZE) {
                Some((width, height)) => image::imageops::thumbnail(&rgb, width, height),
                None => rgb,
            };
            Thumbnail::Image {
                path: path.to_path_buf(),
                caption: name,
                pixels,
            }
        },
        Err(e) => {
            log::warn!("Cannot preview {}: {}", path.display(), e);
            Thumbnail::Error {
                path: path.to_path_buf(),
                message: format!("Error loading:\n{name}"),
            }
        },
    }
}

/// Render thumbnails for every path, in order
pub fn render_thumbnails(paths: &[PathBuf]) -> Vec<Thumbnail> {
    paths.iter().map(|p| render_thumbnail(p)).collect()
}

/// Preview surface holding the rendered thumbnails
#[derive(Debug, Default)]
pub struct ThumbnailGallery {
    thumbnails: Vec<Thumbnail>,
}

impl ThumbnailGallery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }
}

impl PreviewSurface for ThumbnailGallery {
    fn refresh(&mut self, paths: &[PathBuf]) {
        self.thumbnails = render_thumbnails(paths);
    }
}
