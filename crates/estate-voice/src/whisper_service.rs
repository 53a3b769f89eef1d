//! Whisper transcription service via whisper-rs (whisper.cpp bindings).
//!
//! With the `whisper` feature a GGML model is loaded once and inference runs
//! on the blocking pool. Without the feature every call fails, which the
//! voice adapter reports as "speech not recognized".

#[cfg(feature = "whisper")]
use std::path::Path;
#[cfg(feature = "whisper")]
use std::sync::Arc;

use estate_core::config::VoiceConfig;
use estate_core::error::EstateError;

use crate::{check_audio, Transcript, TranscriptionService};

/// Whisper-backed [`TranscriptionService`].
pub struct WhisperService {
    #[cfg(feature = "whisper")]
    ctx: Arc<whisper_rs::WhisperContext>,
    model_path: String,
    language: String,
}

impl WhisperService {
    /// Load the GGML model named by `voice.whisper_model`.
    #[cfg(feature = "whisper")]
    pub fn new(config: &VoiceConfig) -> Result<Self, EstateError> {
        use whisper_rs::{WhisperContext, WhisperContextParameters};

        let model_path = config.whisper_model.clone();
        if !Path::new(&model_path).exists() {
            return Err(EstateError::Transcription(format!(
                "Whisper model file not found: {}",
                model_path
            )));
        }

        tracing::info!(model = %model_path, lang = %config.language, "Loading Whisper model");

        let ctx = WhisperContext::new_with_params(&model_path, WhisperContextParameters::default())
            .map_err(|e| {
                EstateError::Transcription(format!("Failed to load Whisper model: {}", e))
            })?;

        tracing::info!("Whisper model loaded successfully");
        Ok(Self {
            ctx: Arc::new(ctx),
            model_path,
            language: config.language.clone(),
        })
    }

    /// Stub constructor when the `whisper` feature is disabled.
    #[cfg(not(feature = "whisper"))]
    pub fn new(config: &VoiceConfig) -> Result<Self, EstateError> {
        tracing::warn!("WhisperService created without the `whisper` feature, speech recognition is unavailable");
        Ok(Self {
            model_path: config.whisper_model.clone(),
            language: config.language.clone(),
        })
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[cfg(feature = "whisper")]
impl TranscriptionService for WhisperService {
    async fn transcribe(
        &self,
        audio_data: &[f32],
        sample_rate: u32,
    ) -> Result<Transcript, EstateError> {
        check_audio(audio_data, sample_rate)?;
        if sample_rate != crate::TARGET_SAMPLE_RATE {
            return Err(EstateError::Transcription(format!(
                "Whisper expects {} Hz audio, got {} Hz",
                crate::TARGET_SAMPLE_RATE,
                sample_rate
            )));
        }

        let ctx = Arc::clone(&self.ctx);
        let language = self.language.clone();
        let samples = audio_data.to_vec();
        let duration_secs = samples.len() as f32 / sample_rate as f32;

        let text = tokio::task::spawn_blocking(move || run_inference(&ctx, &language, &samples))
            .await
            .map_err(|e| EstateError::Transcription(format!("Whisper task failed: {}", e)))??;

        tracing::info!(text_len = text.len(), duration_secs, "Transcription complete");
        Ok(Transcript {
            text,
            language: self.language.clone(),
            duration_secs,
        })
    }
}

#[cfg(feature = "whisper")]
fn run_inference(
    ctx: &whisper_rs::WhisperContext,
    language: &str,
    samples: &[f32],
) -> Result<String, EstateError> {
    use whisper_rs::{FullParams, SamplingStrategy};

    let mut state = ctx.create_state().map_err(|e| {
        EstateError::Transcription(format!("Failed to create Whisper state: {}", e))
    })?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(if language == "auto" { None } else { Some(language) });
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    state
        .full(params, samples)
        .map_err(|e| EstateError::Transcription(format!("Whisper inference failed: {}", e)))?;

    let n_segments = state.full_n_segments().map_err(|e| {
        EstateError::Transcription(format!("Failed to get segment count: {}", e))
    })?;

    let mut text = String::new();
    for i in 0..n_segments {
        let segment = state.full_get_segment_text(i).map_err(|e| {
            EstateError::Transcription(format!("Failed to get segment {} text: {}", i, e))
        })?;
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(segment);
    }
    Ok(text)
}

#[cfg(not(feature = "whisper"))]
impl TranscriptionService for WhisperService {
    async fn transcribe(
        &self,
        audio_data: &[f32],
        sample_rate: u32,
    ) -> Result<Transcript, EstateError> {
        check_audio(audio_data, sample_rate)?;
        Err(EstateError::Transcription(
            "Whisper transcription requires the `whisper` feature to be enabled".into(),
        ))
    }
}
