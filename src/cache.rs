//! Model cache management for downloaded models
//!
//! Models live as flat `<name>.onnx` files in an XDG-compliant cache directory,
//! each accompanied by a `<name>.json` manifest written when the download
//! completed. A model counts as cached only when both files are present.

use crate::error::{BgRemoverError, Result};
use crate::models::ModelKind;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache root
pub const CACHE_DIR_ENV: &str = "BGREMOVER_CACHE_DIR";

/// Manifest stored next to a downloaded model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Catalog name of the model
    pub model: String,
    /// URL the model was fetched from
    pub url: String,
    /// Hex encoded SHA-256 of the model file
    pub sha256: String,
    /// Size of the model file in bytes
    pub size_bytes: u64,
    /// Unix timestamp of the completed download
    pub downloaded_at: u64,
}

/// Information about a cached model
#[derive(Debug, Clone)]
pub struct CachedModelInfo {
    /// Catalog entry
    pub model: ModelKind,
    /// Path to the ONNX file
    pub path: PathBuf,
    /// Size of the ONNX file in bytes
    pub size_bytes: u64,
    /// Recorded SHA-256, when the manifest could be read
    pub sha256: Option<String>,
}

/// Model cache manager
#[derive(Debug, Clone)]
pub struct ModelCache {
    cache_dir: PathBuf,
}

impl ModelCache {
    /// Create a new model cache manager
    ///
    /// Uses `BGREMOVER_CACHE_DIR` when set, otherwise the platform cache directory:
    /// - Linux: `~/.cache/bgremover-pro/models/`
    /// - macOS: `~/Library/Caches/bgremover-pro/models/`
    /// - Windows: `%LOCALAPPDATA%/bgremover-pro/models/`
    ///
    /// # Errors
    /// - Failed to determine cache directory
    /// - Failed to create cache directory
    pub fn new() -> Result<Self> {
        let cache_dir = Self::get_cache_dir()?;
        Self::ensure_dir(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    /// Create a cache rooted at a custom directory (`<dir>/models`)
    ///
    /// # Errors
    /// - Failed to create cache directory
    pub fn with_custom_cache_dir(cache_dir: &Path) -> Result<Self> {
        let models_dir = cache_dir.join("models");
        Self::ensure_dir(&models_dir)?;
        Ok(Self {
            cache_dir: models_dir,
        })
    }

    fn ensure_dir(dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .map_err(|e| BgRemoverError::file_io_error("create cache directory", dir, &e))?;
        }
        Ok(())
    }

    fn get_cache_dir() -> Result<PathBuf> {
        if let Ok(cache_override) = std::env::var(CACHE_DIR_ENV) {
            return Ok(PathBuf::from(cache_override).join("models"));
        }

        Ok(dirs::cache_dir()
            .ok_or_else(|| {
                BgRemoverError::invalid_config(format!(
                    "Failed to determine cache directory. Set {} environment variable.",
                    CACHE_DIR_ENV
                ))
            })?
            .join("bgremover-pro")
            .join("models"))
    }

    /// Directory holding the cached models
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the ONNX file for a model (may not exist)
    #[must_use]
    pub fn model_path(&self, model: ModelKind) -> PathBuf {
        self.cache_dir.join(model.file_name())
    }

    /// Path of the manifest for a model (may not exist)
    #[must_use]
    pub fn manifest_path(&self, model: ModelKind) -> PathBuf {
        self.cache_dir.join(format!("{}.json", model.name()))
    }

    /// Check if a model has been completely downloaded
    #[must_use]
    pub fn is_model_cached(&self, model: ModelKind) -> bool {
        let model_path = self.model_path(model);
        let non_empty = fs::metadata(&model_path).is_ok_and(|meta| meta.is_file() && meta.len() > 0);
        non_empty && self.manifest_path(model).is_file()
    }

    /// Read the manifest of a cached model
    ///
    /// # Errors
    /// - Manifest exists but cannot be read or parsed
    pub fn read_manifest(&self, model: ModelKind) -> Result<Option<ModelManifest>> {
        let path = self.manifest_path(model);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| BgRemoverError::file_io_error("read model manifest", &path, &e))?;
        let manifest = serde_json::from_str(&contents).map_err(|e| {
            BgRemoverError::model(format!("Corrupt manifest {}: {}", path.display(), e))
        })?;
        Ok(Some(manifest))
    }

    /// Write the manifest of a model
    ///
    /// # Errors
    /// - Serialization or file write failures
    pub fn write_manifest(&self, model: ModelKind, manifest: &ModelManifest) -> Result<()> {
        let path = self.manifest_path(model);
        let contents = serde_json::to_string_pretty(manifest)
            .map_err(|e| BgRemoverError::internal(format!("Failed to serialize manifest: {}", e)))?;
        fs::write(&path, contents)
            .map_err(|e| BgRemoverError::file_io_error("write model manifest", &path, &e))
    }

    /// Re-hash a cached model and compare with its manifest
    ///
    /// # Errors
    /// - Model or manifest missing or unreadable
    pub fn verify_model(&self, model: ModelKind) -> Result<bool> {
        let manifest = self.read_manifest(model)?.ok_or_else(|| {
            BgRemoverError::model(format!("Model '{}' has no manifest", model))
        })?;
        let actual = sha256_file(&self.model_path(model))?;
        if actual == manifest.sha256 {
            Ok(true)
        } else {
            log::warn!(
                "Integrity check failed for {}: expected {}, got {}",
                model,
                manifest.sha256,
                actual
            );
            Ok(false)
        }
    }

    /// Scan the cache and return all completely downloaded models
    ///
    /// # Errors
    /// - Failed to stat a cached model file
    pub fn scan_cached_models(&self) -> Result<Vec<CachedModelInfo>> {
        let mut models = Vec::new();

        for model in ModelKind::ALL {
            if !self.is_model_cached(model) {
                continue;
            }

            let path = self.model_path(model);
            let size_bytes = fs::metadata(&path)
                .map_err(|e| BgRemoverError::file_io_error("read model metadata", &path, &e))?
                .len();
            let sha256 = match self.read_manifest(model) {
                Ok(manifest) => manifest.map(|m| m.sha256),
                Err(e) => {
                    log::debug!("Ignoring unreadable manifest for {}: {}", model, e);
                    None
                },
            };

            models.push(CachedModelInfo {
                model,
                path,
                size_bytes,
                sha256,
            });
        }

        Ok(models)
    }

    /// Remove a single cached model and its manifest
    ///
    /// Returns `true` when anything was removed.
    ///
    /// # Errors
    /// - Failed to remove the files
    pub fn clear_model(&self, model: ModelKind) -> Result<bool> {
        let mut removed = false;
        for path in [self.model_path(model), self.manifest_path(model)] {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| BgRemoverError::file_io_error("remove cached model", &path, &e))?;
                removed = true;
            }
        }
        if removed {
            log::info!("Removed cached model: {}", model);
        }
        Ok(removed)
    }

    /// Clear all cached models
    ///
    /// # Errors
    /// - Failed to remove model files
    pub fn clear_all_models(&self) -> Result<Vec<String>> {
        let mut removed_models = Vec::new();
        for model in ModelKind::ALL {
            if self.clear_model(model)? {
                removed_models.push(model.name().to_string());
            }
        }
        Ok(removed_models)
    }
}

/// Hex encoded SHA-256 of a file
///
/// # Errors
/// - File cannot be read
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .map_err(|e| BgRemoverError::file_io_error("open file for hashing", path, &e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| BgRemoverError::file_io_error("read file for hashing", path, &e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or(&[]));
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Format file size in human-readable format
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS.get(unit_index).unwrap_or(&"B"))
    } else {
        format!("{:.1} {}", size, UNITS.get(unit_index).unwrap_or(&"B"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_download(cache: &ModelCache, model: ModelKind, contents: &[u8]) {
        let path = cache.model_path(model);
        fs::write(&path, contents).unwrap();
        let manifest = ModelManifest {
            model: model.name().to_string(),
            url: model.url(),
            sha256: sha256_file(&path).unwrap(),
            size_bytes: contents.len() as u64,
            downloaded_at: 0,
        };
        cache.write_manifest(model, &manifest).unwrap();
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_custom_cache_dir() {
        let temp_dir = TempDir::new().unwrap();
        let custom_cache = temp_dir.path().join("custom_cache");

        let cache = ModelCache::with_custom_cache_dir(&custom_cache).unwrap();

        assert!(custom_cache.join("models").exists());
        assert_eq!(cache.cache_dir(), custom_cache.join("models"));
        assert_eq!(
            cache.model_path(ModelKind::U2Net),
            custom_cache.join("models").join("u2net.onnx")
        );
    }

    #[test]
    fn test_is_model_cached_requires_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ModelCache::with_custom_cache_dir(temp_dir.path()).unwrap();

        assert!(!cache.is_model_cached(ModelKind::U2NetP));

        // Leftover model without a manifest is an interrupted download
        fs::write(cache.model_path(ModelKind::U2NetP), b"partial").unwrap();
        assert!(!cache.is_model_cached(ModelKind::U2NetP));

        fake_download(&cache, ModelKind::U2NetP, b"complete model");
        assert!(cache.is_model_cached(ModelKind::U2NetP));
    }

    #[test]
    fn test_manifest_round_trip_and_verify() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ModelCache::with_custom_cache_dir(temp_dir.path()).unwrap();

        assert!(cache.read_manifest(ModelKind::U2Net).unwrap().is_none());

        fake_download(&cache, ModelKind::U2Net, b"onnx bytes");
        let manifest = cache.read_manifest(ModelKind::U2Net).unwrap().unwrap();
        assert_eq!(manifest.model, "u2net");
        assert_eq!(manifest.size_bytes, 10);
        assert!(cache.verify_model(ModelKind::U2Net).unwrap());

        fs::write(cache.model_path(ModelKind::U2Net), b"tampered").unwrap();
        assert!(!cache.verify_model(ModelKind::U2Net).unwrap());
    }

    #[test]
    fn test_corrupt_manifest_is_model_error() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ModelCache::with_custom_cache_dir(temp_dir.path()).unwrap();
        fs::write(cache.manifest_path(ModelKind::U2Net), "not json").unwrap();

        let err = cache.read_manifest(ModelKind::U2Net).unwrap_err();
        assert!(matches!(err, BgRemoverError::Model(_)));
    }

    #[test]
    fn test_scan_cached_models() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ModelCache::with_custom_cache_dir(temp_dir.path()).unwrap();

        assert!(cache.scan_cached_models().unwrap().is_empty());

        fake_download(&cache, ModelKind::IsNetGeneralUse, b"isnet");
        fake_download(&cache, ModelKind::U2Net, b"u2net model");

        let models = cache.scan_cached_models().unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].model, ModelKind::U2Net);
        assert_eq!(models[0].size_bytes, 11);
        assert!(models[0].sha256.is_some());
        assert_eq!(models[1].model, ModelKind::IsNetGeneralUse);
    }

    #[test]
    fn test_clear_models() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ModelCache::with_custom_cache_dir(temp_dir.path()).unwrap();

        fake_download(&cache, ModelKind::U2Net, b"a");
        fake_download(&cache, ModelKind::U2NetP, b"b");

        assert!(cache.clear_model(ModelKind::U2Net).unwrap());
        assert!(!cache.clear_model(ModelKind::U2Net).unwrap());
        assert!(!cache.model_path(ModelKind::U2Net).exists());

        let removed = cache.clear_all_models().unwrap();
        assert_eq!(removed, vec!["u2netp".to_string()]);
        assert!(cache.clear_all_models().unwrap().is_empty());
    }

    #[test]
    fn test_sha256_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
