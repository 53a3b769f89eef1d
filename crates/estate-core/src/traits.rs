//! Seams between the dispatcher and its external collaborators.
//!
//! The dispatcher only sees these traits; the language model, the speech
//! engines and the messaging platform are wired in by the binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatId, MessageId, UserId};

/// Produces one free-text reply for a prompt.
#[async_trait]
pub trait TextResponder: Send + Sync {
    /// Generate a reply. The empty string means "no usable response" and is
    /// a normal result, not a failure.
    async fn generate(&self, prompt: &str) -> String;

    /// Whether the responder can produce anything at all.
    fn is_enabled(&self) -> bool;
}

/// Converts between spoken audio and text.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Transcribe an audio file. The input file is deleted on every path.
    async fn speech_to_text(&self, audio_path: &Path) -> Option<String>;

    /// Synthesize `text` into a new audio file owned by the caller.
    ///
    /// `Ok(None)` means there is nothing worth speaking; `Err` is an engine
    /// failure the user should hear about.
    async fn text_to_speech(&self, text: &str, user: &UserId) -> Result<Option<PathBuf>>;
}

/// Outbound side of the messaging platform.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text(&self, chat: &ChatId, text: &str) -> Result<MessageId>;

    async fn send_voice(&self, chat: &ChatId, audio_path: &Path) -> Result<MessageId>;

    async fn delete_message(&self, chat: &ChatId, message: MessageId) -> Result<()>;
}
