use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EstateError, Result};

/// Top-level configuration for the estate assistant.
///
/// Loaded from `config.toml` by default. Each section corresponds to one
/// component of the assistant; every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstateConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub recommendations: RecommendationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl EstateConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EstateConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| EstateError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Resolve a path from the config against `general.data_dir`.
    ///
    /// Absolute paths are returned unchanged.
    pub fn data_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.general.data_dir).join(path)
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the datasets and the preference store.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Optional directory for a timestamped log file next to stdout logging.
    pub log_dir: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Locations of the static datasets, relative to `general.data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Intent name to trigger phrases (JSON object).
    pub intents_file: String,
    /// Scripted dialogues (plain text, `H:`/`B:` lines).
    pub dialogues_file: String,
    /// Listing records (JSON array).
    pub listings_file: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            intents_file: "intents.json".to_string(),
            dialogues_file: "my_dialogues.txt".to_string(),
            listings_file: "apartments.json".to_string(),
        }
    }
}

/// Backend used for per-user preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceBackend {
    /// Flat JSON file rewritten on every update.
    #[default]
    Json,
    /// SQLite table.
    Sqlite,
    /// Process-local map (nothing persisted).
    Memory,
}

/// Per-user preference store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    pub backend: PreferenceBackend,
    /// Store location, relative to `general.data_dir`.
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            backend: PreferenceBackend::Json,
            path: "user_settings.json".to_string(),
        }
    }
}

/// Language-model responder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Master switch. When false the responder never loads a model.
    pub enabled: bool,
    /// Model file served by the local inference server. Must exist when non-empty.
    pub model_path: String,
    /// Base URL of the llama.cpp server.
    pub server_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    pub system_prompt: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: "models/Meta-Llama-3-8B-Q8_0.gguf".to_string(),
            server_url: "http://127.0.0.1:8080".to_string(),
            max_tokens: 150,
            temperature: 0.6,
            timeout_secs: 60,
            system_prompt: "Ты профессиональный консультант по недвижимости. \
                            Отвечай четко и по делу (1-3 предложения). \
                            Если вопрос не о недвижимости, вежливо перенаправь на тему."
                .to_string(),
        }
    }
}

/// Speech recognition and synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Path or name of the ffmpeg executable.
    pub ffmpeg_path: String,
    /// Whisper GGML model used for recognition.
    pub whisper_model: String,
    /// Recognition and synthesis language code.
    pub language: String,
    /// Synthesis program.
    pub tts_program: String,
    /// Synthesis arguments. `{output}` and `{text}` are substituted; without a
    /// `{text}` placeholder the text is written to the program's stdin.
    pub tts_args: Vec<String>,
    /// Extension of the synthesized audio files.
    pub output_extension: String,
    /// Synthesis engine input limit in characters.
    pub max_tts_chars: usize,
    /// Root directory for synthesized audio (per-user subdirectories).
    pub audio_dir: String,
    /// Directory for downloaded voice messages.
    pub download_dir: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            whisper_model: String::new(),
            language: "ru".to_string(),
            tts_program: "espeak-ng".to_string(),
            tts_args: vec![
                "-v".to_string(),
                "ru".to_string(),
                "-w".to_string(),
                "{output}".to_string(),
                "{text}".to_string(),
            ],
            output_extension: "wav".to_string(),
            max_tts_chars: 500,
            audio_dir: "temp/audio".to_string(),
            download_dir: "temp/downloads".to_string(),
        }
    }
}

/// Probabilities of appending a random listing to a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// After a reply produced by the language model.
    pub after_ai_probability: f64,
    /// After a templated reply.
    pub after_template_probability: f64,
}

impl RecommendationConfig {
    /// Probabilities clamped to `[0, 1]` (NaN counts as 0).
    pub fn clamped(&self) -> (f64, f64) {
        (
            clamp_probability(self.after_ai_probability),
            clamp_probability(self.after_template_probability),
        )
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            after_ai_probability: 0.25,
            after_template_probability: 0.10,
        }
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Dispatcher behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Listings sampled per search reply.
    pub max_listings: usize,
    /// Send a temporary "thinking" message while the language model runs.
    pub ai_thinking_notice: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_listings: 3,
            ai_thinking_notice: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = EstateConfig::default();
        assert_eq!(config.general.data_dir, "data");
        assert_eq!(config.general.log_level, "info");
        assert!(config.general.log_dir.is_none());
        assert_eq!(config.dataset.intents_file, "intents.json");
        assert_eq!(config.preferences.backend, PreferenceBackend::Json);
        assert!(config.ai.enabled);
        assert_eq!(config.ai.max_tokens, 150);
        assert_eq!(config.voice.max_tts_chars, 500);
        assert_eq!(config.chat.max_listings, 3);
        assert!((config.recommendations.after_ai_probability - 0.25).abs() < f64::EPSILON);
        assert!((config.recommendations.after_template_probability - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "debug"

[preferences]
backend = "sqlite"
path = "prefs.db"

[ai]
enabled = false
"#;
        let file = create_temp_config(content);
        let config = EstateConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.data_dir, "data");
        assert_eq!(config.preferences.backend, PreferenceBackend::Sqlite);
        assert_eq!(config.preferences.path, "prefs.db");
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.server_url, "http://127.0.0.1:8080");
        assert_eq!(config.voice.language, "ru");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(EstateConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_unknown_backend_fails() {
        let file = create_temp_config("[preferences]\nbackend = \"redis\"\n");
        assert!(EstateConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = EstateConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "data");
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = EstateConfig::default();
        config.voice.tts_program = "piper".to_string();
        config.save(&path).unwrap();

        let reloaded = EstateConfig::load(&path).unwrap();
        assert_eq!(reloaded.voice.tts_program, "piper");
        assert_eq!(reloaded.voice.tts_args, config.voice.tts_args);
        assert_eq!(reloaded.ai.system_prompt, config.ai.system_prompt);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = EstateConfig::load(file.path()).unwrap();
        assert_eq!(config.dataset.listings_file, "apartments.json");
        assert_eq!(config.voice.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_data_path_relative_and_absolute() {
        let mut config = EstateConfig::default();
        config.general.data_dir = "/srv/bot".to_string();
        assert_eq!(
            config.data_path("intents.json"),
            PathBuf::from("/srv/bot/intents.json")
        );
        assert_eq!(
            config.data_path("/etc/intents.json"),
            PathBuf::from("/etc/intents.json")
        );
    }

    #[test]
    fn test_recommendation_probabilities_clamped() {
        let rec = RecommendationConfig {
            after_ai_probability: 1.7,
            after_template_probability: f64::NAN,
        };
        assert_eq!(rec.clamped(), (1.0, 0.0));

        let rec = RecommendationConfig {
            after_ai_probability: -0.5,
            after_template_probability: 0.3,
        };
        assert_eq!(rec.clamped(), (0.0, 0.3));
    }
}
