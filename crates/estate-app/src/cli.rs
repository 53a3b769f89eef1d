//! CLI argument definitions for the estate bot.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "ESTATE_CONFIG";

/// Real-estate consultant chat bot with a console messenger.
#[derive(Parser, Debug)]
#[command(name = "estate-bot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory holding the intent, dialogue and listing datasets.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// User id the console session speaks as.
    #[arg(short = 'u', long = "user", default_value = "console")]
    pub user: String,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ESTATE_CONFIG env var > `config.toml`.
    pub fn resolve_config_path(&self) -> PathBuf {
        config_path_from(self.config.as_ref(), std::env::var(CONFIG_ENV).ok())
    }

    /// Data directory override, `None` keeps the config value.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Log level override, `None` keeps the config value.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_lowercase)
    }

    /// Console user id; blank falls back to `console`.
    pub fn resolve_user(&self) -> String {
        let user = self.user.trim();
        if user.is_empty() {
            "console".to_string()
        } else {
            user.to_string()
        }
    }
}

fn config_path_from(flag: Option<&PathBuf>, env: Option<String>) -> PathBuf {
    if let Some(p) = flag {
        return p.clone();
    }
    match env {
        Some(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => PathBuf::from("config.toml"),
    }
}
