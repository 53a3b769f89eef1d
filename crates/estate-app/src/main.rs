//! estate-bot: real-estate consultant chat bot.
//!
//! Composition root. Loads the configuration, installs tracing, wires the
//! preference store, the AI responder, the voice gateway and the datasets
//! into a [`Dispatcher`], and serves a console conversation.

mod cli;
mod console;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use estate_chat::{Dispatcher, IntentClassifier, ResponseGenerator, Services};
use estate_core::config::{EstateConfig, GeneralConfig};
use estate_core::traits::VoiceGateway;
use estate_core::types::{ChatId, Conversation};
use estate_llm::AiResponder;
use estate_storage::open_store;
use estate_voice::{CommandSynthesizer, UnavailableVoice, VoiceAdapter, WhisperService};

use cli::CliArgs;
use console::ConsoleSink;

/// Install the global subscriber: console output on stderr plus, when
/// `log_dir` is set, a plain-text log file. Returns the log file path.
fn init_tracing(general: &GeneralConfig) -> std::io::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},hyper=warn,reqwest=warn", general.log_level))
    });

    let (file_layer, log_path) = match general.log_dir.as_deref().map(str::trim) {
        Some(dir) if !dir.is_empty() => {
            std::fs::create_dir_all(dir)?;
            let path = Path::new(dir).join(format!(
                "bot_{}.log",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            ));
            let file = std::fs::File::create(&path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(log_path)
}

/// Voice gateway backed by whisper and the configured synthesizer, or the
/// unavailable gateway when the recognizer cannot start.
fn build_voice(config: &EstateConfig) -> Arc<dyn VoiceGateway> {
    match WhisperService::new(&config.voice) {
        Ok(whisper) => {
            info!(
                model = %whisper.model_path(),
                lang = %whisper.language(),
                tts = %config.voice.tts_program,
                "Voice gateway ready"
            );
            Arc::new(VoiceAdapter::new(
                &config.voice,
                whisper,
                CommandSynthesizer::from_config(&config.voice),
            ))
        }
        Err(e) => {
            error!(error = %e, "Speech recognition unavailable, voice messages disabled");
            Arc::new(UnavailableVoice)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, with CLI overrides applied before tracing picks the level.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = match EstateConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (EstateConfig::default(), Some(e)),
    };
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    let log_file = init_tracing(&config.general)?;
    info!("Starting estate-bot v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = log_file {
        info!(path = %path.display(), "Writing log file");
    }
    match load_error {
        None => info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => warn!(path = %config_file.display(), error = %e, "Configuration not loaded, using defaults"),
    }

    if let Err(e) = std::fs::create_dir_all(&config.general.data_dir) {
        error!(path = %config.general.data_dir, error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    // Preferences.
    let preferences = open_store(&config)?;

    // AI responder. The load is settled before serving so every message
    // sees the same availability.
    let responder = Arc::new(AiResponder::from_config(&config.ai));
    if responder.warm_up().await {
        info!("AI responder ready");
    } else if config.ai.enabled {
        warn!("AI responder unavailable, replies use templates only");
    }

    let voice = build_voice(&config);

    // Datasets.
    let classifier = IntentClassifier::load(&config);
    let generator = ResponseGenerator::load(&config);
    info!(
        intents = classifier.intent_count(),
        dialogue_pairs = classifier.dialogue_pair_count(),
        listings = generator.listing_count(),
        "Datasets loaded"
    );

    let services = Services {
        preferences,
        responder,
        voice,
        sink: Arc::new(ConsoleSink::stdout()),
    };
    let dispatcher = Dispatcher::new(classifier, generator, services, &config);

    let user = args.resolve_user();
    let conv = Conversation::new(user.as_str(), ChatId::from(user.as_str()));
    let download_dir = PathBuf::from(&config.voice.download_dir);
    info!(user = %conv.user, "Console session started, /quit to exit");

    tokio::select! {
        result = console::run(BufReader::new(tokio::io::stdin()), &dispatcher, &conv, &download_dir) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    info!("estate-bot stopped");
    Ok(())
}
