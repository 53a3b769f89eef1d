//! Slash commands understood by the dispatcher.

/// A parsed `/command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    AiMode,
    VoiceMode,
    Search,
    Unknown(String),
}

impl Command {
    /// Parse a message starting with `/`. Arguments and a `@botname` suffix
    /// are ignored. Returns `None` for anything that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let word = rest.split(char::is_whitespace).next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default().to_lowercase();
        if name.is_empty() {
            return None;
        }
        Some(match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "ai_mode" => Command::AiMode,
            "voice_mode" => Command::VoiceMode,
            "search" => Command::Search,
            _ => Command::Unknown(name),
        })
    }
}
