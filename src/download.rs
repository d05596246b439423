//! Model downloading into the model cache
//!
//! Downloads stream into a temporary file inside the cache directory while
//! hashing, then the manifest is written and the file is renamed into place.
//! An interrupted download never leaves a file that `ModelCache` reports as cached.

use crate::cache::{ModelCache, ModelManifest};
use crate::error::{BgRemoverError, Result};
use crate::models::ModelKind;
use futures_util::stream::TryStreamExt;
#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Model downloader with progress reporting
#[derive(Debug)]
pub struct ModelDownloader {
    client: Client,
    cache: ModelCache,
}

/// Progress bar abstraction that works with and without CLI features
#[derive(Debug)]
pub enum ProgressIndicator {
    #[cfg(feature = "cli")]
    Indicatif(ProgressBar),
    NoOp,
}

impl ProgressIndicator {
    pub fn set_message(&self, msg: String) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_message(msg),
            Self::NoOp => {
                let _ = msg;
            },
        }
    }

    pub fn set_length(&self, len: u64) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_length(len),
            Self::NoOp => {
                let _ = len;
            },
        }
    }

    pub fn set_position(&self, pos: u64) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_position(pos),
            Self::NoOp => {
                let _ = pos;
            },
        }
    }

    pub fn finish_with_message(&self, msg: String) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.finish_with_message(msg),
            Self::NoOp => {
                let _ = msg;
            },
        }
    }
}

/// Result of streaming one file to disk
struct StreamedFile {
    sha256: String,
    size_bytes: u64,
}

impl ModelDownloader {
    /// Create a downloader writing into the default model cache
    ///
    /// # Errors
    /// - Failed to create HTTP client
    /// - Failed to initialize model cache
    pub fn new() -> Result<Self> {
        Self::with_cache(ModelCache::new()?)
    }

    /// Create a downloader writing into the given cache
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn with_cache(cache: ModelCache) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(600))
            .build()
            .map_err(|e| BgRemoverError::network_error("Failed to create HTTP client", e))?;

        Ok(Self { client, cache })
    }

    /// Get the model cache for other operations
    #[must_use]
    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Return the cached model path, downloading the model first when missing
    ///
    /// # Errors
    /// - Network or file system errors during download
    pub async fn ensure_model(&self, model: ModelKind, show_progress: bool) -> Result<PathBuf> {
        if let Some(path) = self.verified_cached_model(model) {
            log::debug!("Model already cached: {}", model);
            return Ok(path);
        }

        self.download_model(model, show_progress).await
    }

    /// Cached model path, only when the file still matches its manifest hash
    #[must_use]
    pub fn verified_cached_model(&self, model: ModelKind) -> Option<PathBuf> {
        if !self.cache.is_model_cached(model) {
            return None;
        }
        match self.cache.verify_model(model) {
            Ok(true) => Some(self.cache.model_path(model)),
            Ok(false) => {
                log::warn!("Cached model {} is corrupted, downloading it again", model);
                None
            },
            Err(e) => {
                log::warn!("Could not verify cached model {}: {}", model, e);
                None
            },
        }
    }

    /// Download a model into the cache, replacing any previous copy
    ///
    /// # Errors
    /// - Network errors or non-success HTTP status
    /// - File system errors while writing into the cache
    #[tracing::instrument(skip(self), fields(model = %model))]
    pub async fn download_model(&self, model: ModelKind, show_progress: bool) -> Result<PathBuf> {
        let url = model.url();
        let final_path = self.cache.model_path(model);
        log::info!("Downloading model {} from {}", model, url);

        let progress = if show_progress {
            Self::create_progress_indicator()
        } else {
            ProgressIndicator::NoOp
        };
        progress.set_message(format!("Downloading {}", model.file_name()));

        let temp_file = tempfile::Builder::new()
            .prefix(&format!(".{}-", model.name()))
            .suffix(".part")
            .tempfile_in(self.cache.cache_dir())
            .map_err(|e| {
                BgRemoverError::file_io_error("create temporary download file", self.cache.cache_dir(), &e)
            })?;

        let streamed = match self.download_file(&url, temp_file.path(), &progress).await {
            Ok(streamed) => streamed,
            Err(e) => {
                progress.finish_with_message("❌ Download failed".to_string());
                return Err(e);
            },
        };

        // Drop any stale manifest so a failed rename cannot pair it with a new file
        let manifest_path = self.cache.manifest_path(model);
        if manifest_path.exists() {
            std::fs::remove_file(&manifest_path).map_err(|e| {
                BgRemoverError::file_io_error("remove stale manifest", &manifest_path, &e)
            })?;
        }

        temp_file.persist(&final_path).map_err(|e| {
            BgRemoverError::file_io_error("move downloaded model into cache", &final_path, &e.error)
        })?;

        let manifest = ModelManifest {
            model: model.name().to_string(),
            url,
            sha256: streamed.sha256,
            size_bytes: streamed.size_bytes,
            downloaded_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        self.cache.write_manifest(model, &manifest)?;

        progress.finish_with_message(format!("✅ Downloaded {}", model));
        log::info!(
            "Successfully downloaded {} ({} bytes, sha256 {})",
            model,
            manifest.size_bytes,
            manifest.sha256
        );
        Ok(final_path)
    }

    fn create_progress_indicator() -> ProgressIndicator {
        #[cfg(feature = "cli")]
        {
            let pb = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
            ) {
                pb.set_style(style.progress_chars("#>-"));
            }
            ProgressIndicator::Indicatif(pb)
        }
        #[cfg(not(feature = "cli"))]
        {
            ProgressIndicator::NoOp
        }
    }

    /// Stream a single URL to `local_path`, hashing as it goes
    async fn download_file(
        &self,
        url: &str,
        local_path: &Path,
        progress: &ProgressIndicator,
    ) -> Result<StreamedFile> {
        log::debug!("Downloading: {} -> {}", url, local_path.display());

        let response =
            self.client.get(url).send().await.map_err(|e| {
                BgRemoverError::network_error(format!("Failed to download {}", url), e)
            })?;

        if !response.status().is_success() {
            return Err(BgRemoverError::network_error(
                format!("Failed to download {}", url),
                format!("HTTP status {}", response.status()),
            ));
        }

        let total_size = response.content_length();
        if let Some(total) = total_size {
            progress.set_length(total);
        }

        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| BgRemoverError::file_io_error("create file", local_path, &e))?;

        let mut stream = StreamReader::new(
            response
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        );

        let mut hasher = Sha256::new();
        let mut downloaded = 0u64;
        let mut buffer = vec![0; 8192];

        loop {
            let bytes_read = tokio::io::AsyncReadExt::read(&mut stream, &mut buffer)
                .await
                .map_err(|e| BgRemoverError::network_error("Failed to read download stream", e))?;

            if bytes_read == 0 {
                break;
            }

            let chunk = buffer.get(..bytes_read).unwrap_or(&[]);
            hasher.update(chunk);
            file.write_all(chunk)
                .await
                .map_err(|e| BgRemoverError::file_io_error("write to file", local_path, &e))?;

            downloaded += bytes_read as u64;
            if total_size.is_some() {
                progress.set_position(downloaded);
            } else {
                progress.set_message(format!("Downloaded {:.1} MB", downloaded as f64 / 1_048_576.0));
            }
        }

        file.flush()
            .await
            .map_err(|e| BgRemoverError::file_io_error("flush file", local_path, &e))?;

        if let Some(total) = total_size {
            if total != downloaded {
                return Err(BgRemoverError::network_error(
                    format!("Incomplete download of {}", url),
                    format!("expected {} bytes, received {}", total, downloaded),
                ));
            }
        }

        log::debug!("Downloaded {} bytes to {}", downloaded, local_path.display());
        Ok(StreamedFile {
            sha256: format!("{:x}", hasher.finalize()),
            size_bytes: downloaded,
        })
    }
}
