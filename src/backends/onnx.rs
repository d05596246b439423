//! ONNX Runtime backend for U²-Net style segmentation models
//!
//! Runs the cached model on CPU, CUDA or `CoreML`. With `ExecutionProvider::Auto`
//! the available accelerators are registered in order CUDA, `CoreML`, and the
//! session falls back to CPU when neither is present.

use crate::cache::ModelCache;
use crate::config::{ExecutionProvider, RemoverConfig};
use crate::error::{BgRemoverError, Result};
use crate::inference::{InferenceBackend, SegmentationRemover};
use crate::models::{ModelKind, PreprocessingConfig};
use ndarray::Array4;
use ort::execution_providers::{
    CUDAExecutionProvider, CoreMLExecutionProvider, ExecutionProvider as OrtExecutionProvider,
};
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::{self, value::Value};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Background remover backed by ONNX Runtime
pub type OnnxRemover = SegmentationRemover<OnnxBackend>;

impl SegmentationRemover<OnnxBackend> {
    /// Create an ONNX remover for the configured model
    ///
    /// The session is created on the first image.
    #[must_use]
    pub fn onnx(config: RemoverConfig) -> Self {
        Self::new(OnnxBackend::new(config.model), config)
    }
}

/// ONNX Runtime backend for running background removal models
#[derive(Debug)]
pub struct OnnxBackend {
    session: Option<Session>,
    model: ModelKind,
    initialized: bool,
}

impl OnnxBackend {
    /// Create an uninitialized backend for a model
    #[must_use]
    pub fn new(model: ModelKind) -> Self {
        Self {
            session: None,
            model,
            initialized: false,
        }
    }

    /// List ONNX Runtime execution providers with availability and description
    #[must_use]
    pub fn list_providers() -> Vec<(String, bool, String)> {
        let cuda_available =
            OrtExecutionProvider::is_available(&CUDAExecutionProvider::default()).unwrap_or(false);
        let coreml_available =
            OrtExecutionProvider::is_available(&CoreMLExecutionProvider::default()).unwrap_or(false);

        log::debug!(
            "Provider availability on {}/{}: cuda={}, coreml={}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            cuda_available,
            coreml_available
        );

        vec![
            (
                "CPU".to_string(),
                true,
                "Always available, uses CPU for inference".to_string(),
            ),
            (
                "CUDA".to_string(),
                cuda_available,
                "NVIDIA GPU acceleration (requires CUDA toolkit and compatible GPU)".to_string(),
            ),
            (
                "CoreML".to_string(),
                coreml_available,
                "Apple Silicon GPU acceleration (macOS only)".to_string(),
            ),
        ]
    }

    fn resolve_model_path(&self, config: &RemoverConfig) -> Result<PathBuf> {
        if let Some(path) = &config.model_path {
            return Ok(path.clone());
        }

        let cache = ModelCache::new()?;
        if !cache.is_model_cached(self.model) {
            return Err(BgRemoverError::model(format!(
                "Model '{}' is not downloaded. Run with --only-download --model {} first.",
                self.model, self.model
            )));
        }
        Ok(cache.model_path(self.model))
    }

    fn configure_providers(
        session_builder: SessionBuilder,
        provider: ExecutionProvider,
    ) -> Result<SessionBuilder> {
        let cuda_available =
            || OrtExecutionProvider::is_available(&CUDAExecutionProvider::default()).unwrap_or(false);
        let coreml_available = || {
            OrtExecutionProvider::is_available(&CoreMLExecutionProvider::default()).unwrap_or(false)
        };

        let providers = match provider {
            ExecutionProvider::Auto => {
                let mut providers = Vec::new();
                if cuda_available() {
                    log::info!("🚀 CUDA execution provider is available and will be used");
                    providers.push(CUDAExecutionProvider::default().build());
                }
                if coreml_available() {
                    log::info!("🍎 CoreML execution provider is available and will be used");
                    providers.push(CoreMLExecutionProvider::default().with_subgraphs(true).build());
                }
                if providers.is_empty() {
                    log::info!("No hardware acceleration available, using CPU");
                }
                providers
            },
            ExecutionProvider::Cpu => {
                log::info!("Using CPU execution provider");
                Vec::new()
            },
            ExecutionProvider::Cuda => {
                if cuda_available() {
                    log::info!("Using CUDA execution provider");
                    vec![CUDAExecutionProvider::default().build()]
                } else {
                    log::warn!("CUDA execution provider requested but not available, falling back to CPU");
                    Vec::new()
                }
            },
            ExecutionProvider::CoreMl => {
                if coreml_available() {
                    log::info!("🍎 Using CoreML execution provider");
                    vec![CoreMLExecutionProvider::default().with_subgraphs(true).build()]
                } else {
                    log::warn!("CoreML execution provider requested but not available, falling back to CPU");
                    Vec::new()
                }
            },
        };

        if providers.is_empty() {
            return Ok(session_builder);
        }

        session_builder.with_execution_providers(providers).map_err(|e| {
            BgRemoverError::model(format!("Failed to set {} execution provider: {e}", provider))
        })
    }

    fn load_model(&mut self, config: &RemoverConfig) -> Result<Duration> {
        let model_load_start = Instant::now();
        let model_path = self.resolve_model_path(config)?;

        let session_builder = Session::builder()
            .map_err(|e| BgRemoverError::model(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| BgRemoverError::model(format!("Failed to set optimization level: {e}")))?;

        let session_builder = Self::configure_providers(session_builder, config.execution_provider)?;

        let intra_threads = if config.intra_threads > 0 {
            config.intra_threads
        } else {
            std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(4)
        };

        let session = session_builder
            .with_intra_threads(intra_threads)
            .map_err(|e| BgRemoverError::model(format!("Failed to set intra threads: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| {
                BgRemoverError::model(format!(
                    "Failed to create session from {}: {e}",
                    model_path.display()
                ))
            })?;

        log::debug!("✅ ONNX Runtime session created");
        log::debug!("  - Model: {} ({})", self.model, model_path.display());
        log::debug!("  - Requested provider: {}", config.execution_provider);
        log::debug!("  - Threading: {intra_threads} intra-op threads");

        self.session = Some(session);
        self.initialized = true;
        Ok(model_load_start.elapsed())
    }
}

impl InferenceBackend for OnnxBackend {
    fn initialize(&mut self, config: &RemoverConfig) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None);
        }

        let model_load_time = self.load_model(config)?;
        Ok(Some(model_load_time))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        if !self.initialized {
            return Err(BgRemoverError::internal("Backend not initialized"));
        }

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BgRemoverError::internal("ONNX session not initialized"))?;

        let inference_start = Instant::now();
        log::debug!("Starting inference with input shape: {:?}", input.dim());

        let input_value = Value::from_array(input.clone())
            .map_err(|e| BgRemoverError::inference(format!("Failed to convert input tensor: {e}")))?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| BgRemoverError::inference(format!("ONNX inference failed: {e}")))?;

        // U²-Net emits several side outputs; the fused prediction comes first
        let output_tensor = {
            let keys: Vec<_> = outputs.keys().collect();
            let first_key = keys
                .first()
                .ok_or_else(|| BgRemoverError::inference("No output tensors found"))?;
            outputs
                .get(first_key)
                .ok_or_else(|| BgRemoverError::inference("First output tensor not found"))?
                .try_extract_array::<f32>()
                .map_err(|e| BgRemoverError::inference(format!("Failed to extract output tensor: {e}")))?
        };

        let output_shape = output_tensor.shape().to_vec();
        let [batch, channels, height, width] = output_shape.as_slice() else {
            return Err(BgRemoverError::inference(format!(
                "Expected 4D output tensor, got {}D",
                output_shape.len()
            )));
        };

        let result = Array4::from_shape_vec(
            (*batch, *channels, *height, *width),
            output_tensor.iter().copied().collect(),
        )
        .map_err(|e| BgRemoverError::inference(format!("Failed to reshape output tensor: {e}")))?;

        log::debug!(
            "Inference complete: {:.2}ms",
            inference_start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(result)
    }

    fn preprocessing(&self) -> PreprocessingConfig {
        self.model.preprocessing()
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_starts_uninitialized() {
        let backend = OnnxBackend::new(ModelKind::U2NetP);
        assert!(!backend.is_initialized());
        assert_eq!(backend.preprocessing().input_size, 320);
        assert_eq!(backend.name(), "onnx");
    }

    #[test]
    fn test_infer_before_initialize_fails() {
        let mut backend = OnnxBackend::new(ModelKind::U2Net);
        let input = Array4::<f32>::zeros((1, 3, 320, 320));
        let err = backend.infer(&input).unwrap_err();
        assert!(matches!(err, BgRemoverError::Internal(_)));
    }

    #[test]
    fn test_initialize_with_missing_model_file_fails() {
        let mut backend = OnnxBackend::new(ModelKind::U2Net);
        let config = RemoverConfig {
            model_path: Some(PathBuf::from("/nonexistent/u2net.onnx")),
            execution_provider: ExecutionProvider::Cpu,
            ..RemoverConfig::default()
        };
        assert!(backend.initialize(&config).is_err());
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_list_providers_always_has_cpu() {
        let providers = OnnxBackend::list_providers();
        assert_eq!(providers.len(), 3);
        assert!(providers.iter().any(|(name, available, _)| name == "CPU" && *available));
    }
}
