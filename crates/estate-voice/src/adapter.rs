//! Voice adapter: the [`VoiceGateway`] implementation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scopeguard::guard;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use estate_core::config::VoiceConfig;
use estate_core::error::{EstateError, Result};
use estate_core::fsutil::remove_file_logged;
use estate_core::traits::VoiceGateway;
use estate_core::types::UserId;

use crate::synth::SpeechSynthesizer;
use crate::transcode::{read_wav_mono, Transcoder};
use crate::TranscriptionService;

/// Pictographs, flags, dingbats and the joiners used to compose them.
static NON_SPEECH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}\x{1F1E0}-\x{1F1FF}\x{1F900}-\x{1FAFF}\x{2600}-\x{27BF}\x{FE0F}\x{200D}]+",
    )
    .unwrap()
});

/// Synthesized text shorter than this is not worth speaking.
const MIN_TTS_CHARS: usize = 3;

/// Strip emoji and similar symbols, leaving speakable text.
pub fn strip_non_speech(text: &str) -> String {
    NON_SPEECH_RE.replace_all(text, "").trim().to_string()
}

/// Bridges the transcoder, recognizer and synthesizer.
pub struct VoiceAdapter<T, S> {
    transcriber: T,
    synthesizer: S,
    transcoder: Transcoder,
    audio_dir: PathBuf,
    output_extension: String,
    max_tts_chars: usize,
}

impl<T, S> VoiceAdapter<T, S>
where
    T: TranscriptionService,
    S: SpeechSynthesizer,
{
    pub fn new(config: &VoiceConfig, transcriber: T, synthesizer: S) -> Self {
        Self {
            transcriber,
            synthesizer,
            transcoder: Transcoder::new(config.ffmpeg_path.clone()),
            audio_dir: PathBuf::from(&config.audio_dir),
            output_extension: config.output_extension.trim_start_matches('.').to_string(),
            max_tts_chars: config.max_tts_chars.max(MIN_TTS_CHARS),
        }
    }

    async fn recognize(&self, audio_path: &Path, wav_path: &Path) -> Option<String> {
        if let Err(e) = self.transcoder.to_wav(audio_path, wav_path).await {
            error!(input = %audio_path.display(), error = %e, "Audio transcoding failed");
            return None;
        }

        let wav = wav_path.to_path_buf();
        let (samples, sample_rate) = match tokio::task::spawn_blocking(move || read_wav_mono(&wav)).await {
            Ok(Ok(decoded)) => decoded,
            Ok(Err(e)) => {
                error!(error = %e, "Transcoded audio could not be decoded");
                return None;
            }
            Err(e) => {
                error!(error = %e, "WAV decoding task failed");
                return None;
            }
        };

        match self.transcriber.transcribe(&samples, sample_rate).await {
            Ok(transcript) => {
                let text = transcript.text.trim();
                if text.is_empty() {
                    info!("Recognizer returned no speech");
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(e) => {
                error!(error = %e, "Speech recognition failed");
                None
            }
        }
    }

    fn output_path(&self, user: &UserId) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let id = Uuid::new_v4().simple().to_string();
        self.audio_dir.join(safe_component(&user.0)).join(format!(
            "voice_{}_{}.{}",
            stamp,
            &id[..8],
            self.output_extension
        ))
    }
}

#[async_trait]
impl<T, S> VoiceGateway for VoiceAdapter<T, S>
where
    T: TranscriptionService,
    S: SpeechSynthesizer,
{
    async fn speech_to_text(&self, audio_path: &Path) -> Option<String> {
        let dir = audio_path.parent().unwrap_or_else(|| Path::new("."));
        let wav_path = dir.join(format!("stt_{}.wav", Uuid::new_v4().simple()));

        let _cleanup = guard(
            (audio_path.to_path_buf(), wav_path.clone()),
            |(input, wav)| {
                remove_file_logged(&input);
                remove_file_logged(&wav);
            },
        );

        let text = self.recognize(audio_path, &wav_path).await;
        debug!(recognized = text.is_some(), "Speech-to-text finished");
        text
    }

    async fn text_to_speech(&self, text: &str, user: &UserId) -> Result<Option<PathBuf>> {
        let clean = strip_non_speech(text);
        if clean.chars().count() < MIN_TTS_CHARS {
            debug!("Text too short for speech synthesis");
            return Ok(None);
        }
        let clean: String = clean.chars().take(self.max_tts_chars).collect();

        let path = self.output_path(user);
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!(dir = %parent.display(), error = %e, "Cannot create audio directory");
                return Err(e.into());
            }
        }

        // Removes partial output unless the file is handed to the caller.
        let pending = guard(path, |p| {
            remove_file_logged(&p);
        });

        if let Err(e) = self.synthesizer.synthesize(&clean, &pending).await {
            error!(user = %user, error = %e, "Speech synthesis failed");
            return Err(e);
        }

        match tokio::fs::metadata(&*pending).await {
            Ok(meta) if meta.len() > 0 => {
                let path = scopeguard::ScopeGuard::into_inner(pending);
                debug!(path = %path.display(), "Voice reply ready");
                Ok(Some(path))
            }
            _ => {
                warn!(path = %pending.display(), "Synthesizer produced no audio");
                Err(EstateError::Synthesis("synthesizer produced no audio".to_string()))
            }
        }
    }
}

/// Gateway used when no recognizer could be started. Inbound audio is
/// discarded and replies are never voiced.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableVoice;

#[async_trait]
impl VoiceGateway for UnavailableVoice {
    async fn speech_to_text(&self, audio_path: &Path) -> Option<String> {
        remove_file_logged(audio_path);
        None
    }

    async fn text_to_speech(&self, _text: &str, _user: &UserId) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// Make a user id safe to use as a directory name.
fn safe_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}
