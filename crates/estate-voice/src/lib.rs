//! Estate voice crate - speech-to-text and text-to-speech for the assistant.
//!
//! [`VoiceAdapter`] implements [`estate_core::VoiceGateway`]: inbound audio is
//! transcoded to 16 kHz mono WAV by ffmpeg and handed to a
//! [`TranscriptionService`]; outbound text is cleaned and rendered to an audio
//! file by a [`SpeechSynthesizer`].

use std::future::Future;

use estate_core::error::EstateError;

pub mod adapter;
pub mod synth;
pub mod transcode;
pub mod whisper_service;

pub use adapter::{UnavailableVoice, VoiceAdapter};
pub use synth::{CommandSynthesizer, SpeechSynthesizer};
pub use transcode::{read_wav_mono, Transcoder, TARGET_SAMPLE_RATE};
pub use whisper_service::WhisperService;

// =============================================================================
// Result types
// =============================================================================

/// Text recognized from one audio clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Language requested from the recognizer (`auto` when detected).
    pub language: String,
    pub duration_secs: f32,
}

// =============================================================================
// Trait
// =============================================================================

/// Service for transcribing audio data to text.
pub trait TranscriptionService: Send + Sync {
    /// Transcribe mono PCM samples in [-1.0, 1.0] at `sample_rate` Hz.
    fn transcribe(
        &self,
        audio_data: &[f32],
        sample_rate: u32,
    ) -> impl Future<Output = Result<Transcript, EstateError>> + Send;
}

/// Reject input no recognizer can work with.
pub(crate) fn check_audio(audio_data: &[f32], sample_rate: u32) -> Result<(), EstateError> {
    if audio_data.is_empty() {
        return Err(EstateError::Transcription(
            "Cannot transcribe empty audio data".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(EstateError::Transcription(
            "Sample rate must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
