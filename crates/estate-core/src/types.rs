use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Messaging-platform user identifier, used as the preference store key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId(id.to_string())
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

/// Conversation the replies are delivered to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChatId {
    fn from(id: &str) -> Self {
        ChatId(id.to_string())
    }
}

/// Identifier of a message already delivered by a [`crate::MessageSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

/// Sender and destination of one inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    pub user: UserId,
    pub chat: ChatId,
}

impl Conversation {
    pub fn new(user: impl Into<UserId>, chat: ChatId) -> Self {
        Self {
            user: user.into(),
            chat,
        }
    }
}

// =============================================================================
// Intents
// =============================================================================

/// Intent labels with built-in response sets.
pub mod labels {
    pub const GREETING: &str = "greeting";
    pub const SELF_INFO: &str = "self_info";
    pub const MOOD: &str = "mood";
    pub const GOODBYE: &str = "goodbye";
    pub const APARTMENT: &str = "apartment";
}

/// Coarse purpose of a user message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    /// The user is in AI mode; the message goes straight to the language model.
    AiDirect,
    /// A scripted dialogue supplied the reply.
    DialogueAnswer,
    /// Nothing matched.
    Unknown,
    /// A key of the intent table.
    Named(String),
}

impl Intent {
    /// Stable label used in logs and intent tables.
    pub fn as_str(&self) -> &str {
        match self {
            Intent::AiDirect => "ai-direct",
            Intent::DialogueAnswer => "dialogue-answer",
            Intent::Unknown => "unknown",
            Intent::Named(name) => name,
        }
    }

    pub fn named(name: &str) -> Self {
        Intent::Named(name.to_string())
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassificationResult {
    pub intent: Intent,
    /// Pre-formed reply, present only for [`Intent::DialogueAnswer`].
    pub reply: Option<String>,
}

impl ClassificationResult {
    pub fn intent(intent: Intent) -> Self {
        Self {
            intent,
            reply: None,
        }
    }

    pub fn unknown() -> Self {
        Self::intent(Intent::Unknown)
    }

    pub fn dialogue_answer(reply: String) -> Self {
        Self {
            intent: Intent::DialogueAnswer,
            reply: Some(reply),
        }
    }
}

// =============================================================================
// Scripted dialogues
// =============================================================================

/// Party of a scripted dialogue turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Human,
    Bot,
}

impl Speaker {
    /// Parse the `H`/`B` speaker tag of the dialogue script (case-insensitive).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "H" | "h" => Some(Speaker::Human),
            "B" | "b" => Some(Speaker::Bot),
            _ => None,
        }
    }
}

/// One line of a scripted dialogue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub utterance: String,
}

/// Ordered human/bot exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    pub turns: Vec<Turn>,
}

impl Dialogue {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

// =============================================================================
// Listings
// =============================================================================

/// A real-estate listing from the static dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub address: String,
    /// Area in square metres.
    pub area: f64,
    pub rooms: u32,
    /// Price in roubles (monthly when `rental` is set).
    pub price: u64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact: Option<String>,
    /// Style tag: `luxury`, `standard`, `budget`.
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub rental: bool,
}

impl Listing {
    /// Check the record invariants that serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.address.trim().is_empty() {
            return Err("address is empty".to_string());
        }
        if !self.area.is_finite() || self.area < 0.0 {
            return Err(format!("area must be a non-negative number, got {}", self.area));
        }
        Ok(())
    }
}

// =============================================================================
// User preferences
// =============================================================================

/// Per-user mode flags. Absent users get the defaults (both off).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub ai_mode: bool,
    pub voice_mode: bool,
}

/// One of the toggleable preference flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreferenceFlag {
    AiMode,
    VoiceMode,
}

impl PreferenceFlag {
    /// Key used by the persisted record.
    pub fn key(&self) -> &'static str {
        match self {
            PreferenceFlag::AiMode => "ai_mode",
            PreferenceFlag::VoiceMode => "voice_mode",
        }
    }
}

impl UserPreferences {
    pub fn get(&self, flag: PreferenceFlag) -> bool {
        match flag {
            PreferenceFlag::AiMode => self.ai_mode,
            PreferenceFlag::VoiceMode => self.voice_mode,
        }
    }

    pub fn set(&mut self, flag: PreferenceFlag, value: bool) {
        match flag {
            PreferenceFlag::AiMode => self.ai_mode = value,
            PreferenceFlag::VoiceMode => self.voice_mode = value,
        }
    }

    /// Flip a flag and return its new value.
    pub fn toggle(&mut self, flag: PreferenceFlag) -> bool {
        let value = !self.get(flag);
        self.set(flag, value);
        value
    }
}
