//! Whisper-based speech-to-text
//!
//! Enabled by the default `whisper` feature (cmake and clang at build time).
//! GPU inference needs the `cuda` feature:
//!
//! ```bash
//! cargo build --release --features cuda
//! ```
//!
//! Built with `--no-default-features` the transcriber is a stub that fails
//! every request, so audio jobs end with a transcription error while text
//! jobs keep working.

use super::{ServiceError, Transcriber, Transcript};
use crate::config::WhisperDevice;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[cfg(feature = "whisper")]
use crate::languages::AUTO;
#[cfg(feature = "whisper")]
use parking_lot::Mutex;
#[cfg(feature = "whisper")]
use std::sync::Arc;
#[cfg(feature = "whisper")]
use tracing::{info, warn};
#[cfg(feature = "whisper")]
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the ggml model file
    pub model_path: PathBuf,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
    pub device: WhisperDevice,
}

/// Decode headerless s16le PCM into samples normalized to [-1.0, 1.0]
pub fn decode_pcm(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

#[cfg(feature = "whisper")]
pub struct WhisperTranscriber {
    config: WhisperConfig,
    /// Loaded on first use
    context: Arc<Mutex<Option<Arc<WhisperContext>>>>,
}

#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperTranscriber {
    config: WhisperConfig,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "whisper")]
            context: Arc::new(Mutex::new(None)),
        }
    }
}

#[cfg(feature = "whisper")]
fn load_context(
    slot: &Mutex<Option<Arc<WhisperContext>>>,
    config: &WhisperConfig,
) -> Result<Arc<WhisperContext>, ServiceError> {
    let mut slot = slot.lock();
    if let Some(context) = slot.as_ref() {
        return Ok(context.clone());
    }

    let path = config
        .model_path
        .to_str()
        .ok_or_else(|| ServiceError::Transcription("invalid UTF-8 in model path".to_string()))?;
    if !config.model_path.exists() {
        return Err(ServiceError::Transcription(format!("model not found: {}", path)));
    }

    let context = if config.device.wants_gpu() {
        match new_context(path, true) {
            Ok(context) => context,
            Err(e) => {
                warn!("GPU model load failed ({}), falling back to CPU", e);
                new_context(path, false)?
            }
        }
    } else {
        new_context(path, false)?
    };

    let context = Arc::new(context);
    *slot = Some(context.clone());
    Ok(context)
}

#[cfg(feature = "whisper")]
fn new_context(path: &str, use_gpu: bool) -> Result<WhisperContext, ServiceError> {
    let mut params = WhisperContextParameters::default();
    params.use_gpu(use_gpu);
    let context = WhisperContext::new_with_params(path, params)
        .map_err(|e| ServiceError::Transcription(format!("failed to load model: {}", e)))?;
    info!("Whisper model loaded from {} ({})", path, if use_gpu { "GPU" } else { "CPU" });
    Ok(context)
}

#[cfg(feature = "whisper")]
fn run_inference(
    context: &WhisperContext,
    samples: &[f32],
    language: Option<&str>,
    threads: Option<usize>,
) -> Result<Transcript, ServiceError> {
    let mut state = context
        .create_state()
        .map_err(|e| ServiceError::Transcription(format!("failed to create state: {}", e)))?;

    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: -1.0,
    });
    params.set_language(language);
    if let Some(threads) = threads {
        params.set_n_threads(threads as i32);
    }
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    state
        .full(params, samples)
        .map_err(|e| ServiceError::Transcription(format!("inference failed: {}", e)))?;

    let lang_id = state.full_lang_id_from_state();
    let detected = whisper_rs::get_lang_str(lang_id)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(AUTO)
        .to_string();

    let mut text = String::new();
    for segment in state.as_iter() {
        text.push_str(&segment.to_string());
    }

    Ok(Transcript {
        text: text.trim().to_string(),
        language: detected,
    })
}

#[cfg(feature = "whisper")]
#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, path: &Path, language: Option<&str>) -> Result<Transcript, ServiceError> {
        let bytes = tokio::fs::read(path).await?;
        let samples = decode_pcm(&bytes);
        let slot = self.context.clone();
        let config = self.config.clone();
        let language = language.map(str::to_string);

        tokio::task::spawn_blocking(move || {
            let context = load_context(&slot, &config)?;
            run_inference(&context, &samples, language.as_deref(), config.threads)
        })
        .await
        .map_err(|e| ServiceError::Transcription(format!("inference task failed: {}", e)))?
    }
}

#[cfg(not(feature = "whisper"))]
#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, _path: &Path, _language: Option<&str>) -> Result<Transcript, ServiceError> {
        Err(ServiceError::Transcription(format!(
            "speech recognition is not available (built without the `whisper` feature, model {})",
            self.config.model_path.display()
        )))
    }
}
