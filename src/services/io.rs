//! Image I/O operations service
//!
//! Reading inputs, naming and writing outputs, and preparing the output
//! directory. Kept apart from the pipeline so it can be exercised on its own.

use crate::{
    config::{OutputFormat, INPUT_PATTERNS, OUTPUT_SUFFIX},
    error::{BgRemoverError, Result},
    services::format::OutputFormatHandler,
};
use glob::{MatchOptions, Pattern};
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the default output folder
pub const DEFAULT_OUTPUT_FOLDER: &str = "output_images";

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Read the raw bytes of an input file
    ///
    /// # Errors
    /// - File missing or unreadable
    pub fn read_input<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();
        fs::read(path_ref).map_err(|e| BgRemoverError::file_io_error("read input image", path_ref, &e))
    }

    /// Decode image bytes of any format the `image` crate was built with
    ///
    /// # Errors
    /// - Bytes are not a decodable image
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            BgRemoverError::processing(format!("Failed to decode image from bytes: {}", e))
        })
    }

    /// Output path for an input: `<output_dir>/<stem>_no_bg.<ext>`
    ///
    /// # Examples
    /// ```rust
    /// use bgremover_pro::{services::ImageIOService, config::OutputFormat};
    /// use std::path::Path;
    ///
    /// let out = ImageIOService::output_path(Path::new("/out"), Path::new("/in/cat.jpg"), OutputFormat::Png);
    /// assert_eq!(out, Path::new("/out/cat_no_bg.png"));
    /// ```
    #[must_use]
    pub fn output_path(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
        let stem = input
            .file_stem()
            .map_or_else(|| "image".into(), |s| s.to_string_lossy());
        output_dir.join(format!(
            "{}{}.{}",
            stem,
            OUTPUT_SUFFIX,
            OutputFormatHandler::get_extension(format)
        ))
    }

    /// Create the output directory if it does not exist yet
    ///
    /// # Errors
    /// - [`BgRemoverError::OutputDirectory`] when the directory cannot be created
    ///   or the path is an existing file. Callers treat this as fatal.
    pub fn ensure_output_dir(output_dir: &Path) -> Result<()> {
        if output_dir.is_dir() {
            return Ok(());
        }
        if output_dir.exists() {
            return Err(BgRemoverError::output_directory(
                output_dir,
                &std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path is not a directory"),
            ));
        }

        fs::create_dir_all(output_dir).map_err(|e| BgRemoverError::output_directory(output_dir, &e))?;
        log::debug!("Created output directory {}", output_dir.display());
        Ok(())
    }

    /// Write encoded output bytes
    ///
    /// # Errors
    /// - File cannot be written
    pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes).map_err(|e| BgRemoverError::file_io_error("write output image", path, &e))
    }

    /// Whether a path matches the selectable input patterns (case-insensitive)
    #[must_use]
    pub fn is_supported_input<P: AsRef<Path>>(path: P) -> bool {
        let Some(name) = path.as_ref().file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };

        INPUT_PATTERNS.iter().any(|pattern| {
            Pattern::new(pattern).is_ok_and(|p| p.matches_with(name, options))
        })
    }

    /// Supported inputs directly inside a directory, sorted by path
    ///
    /// # Errors
    /// - Directory cannot be read
    pub fn list_inputs_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries =
            fs::read_dir(dir).map_err(|e| BgRemoverError::file_io_error("read input directory", dir, &e))?;

        let mut inputs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Self::is_supported_input(path))
            .collect();
        inputs.sort();
        Ok(inputs)
    }

    /// The default output directory, `~/Desktop/output_images`
    ///
    /// Falls back to `<home>/Desktop` when the platform reports no desktop
    /// directory, and to the working directory when there is no home either.
    #[must_use]
    pub fn default_output_dir() -> PathBuf {
        dirs::desktop_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
            .unwrap_or_default()
            .join(DEFAULT_OUTPUT_FOLDER)
    }
}
