//! Dispatcher: per-message orchestration of classification, replies and
//! voice.
//!
//! Every inbound message is handled independently. The only shared mutable
//! state is the preference store, which serializes its own updates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use scopeguard::guard;
use tracing::{debug, error, info, warn};

use estate_core::config::EstateConfig;
use estate_core::fsutil::remove_file_logged;
use estate_core::traits::{MessageSink, TextResponder, VoiceGateway};
use estate_core::types::{labels, ChatId, Conversation, Intent, PreferenceFlag, UserPreferences};
use estate_storage::PreferenceStore;

use crate::classifier::IntentClassifier;
use crate::commands::Command;
use crate::error::ChatError;
use crate::messages;
use crate::response::ResponseGenerator;

/// One message from the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Free text, or a `/command`.
    Text(String),
    /// A downloaded voice message. The dispatcher owns the file and deletes it.
    Voice(PathBuf),
}

/// External collaborators of the dispatcher.
#[derive(Clone)]
pub struct Services {
    pub preferences: Arc<dyn PreferenceStore>,
    pub responder: Arc<dyn TextResponder>,
    pub voice: Arc<dyn VoiceGateway>,
    pub sink: Arc<dyn MessageSink>,
}

pub struct Dispatcher {
    classifier: IntentClassifier,
    generator: ResponseGenerator,
    services: Services,
    ai_recommendation_probability: f64,
    template_recommendation_probability: f64,
    thinking_notice: bool,
}

impl Dispatcher {
    pub fn new(
        classifier: IntentClassifier,
        generator: ResponseGenerator,
        services: Services,
        config: &EstateConfig,
    ) -> Self {
        let (after_ai, after_template) = config.recommendations.clamped();
        Self {
            classifier,
            generator,
            services,
            ai_recommendation_probability: after_ai,
            template_recommendation_probability: after_template,
            thinking_notice: config.chat.ai_thinking_notice,
        }
    }

    /// Route one inbound message.
    pub async fn handle(&self, conv: &Conversation, inbound: Inbound) -> Result<(), ChatError> {
        match inbound {
            Inbound::Text(text) => match Command::parse(&text) {
                Some(command) => self.handle_command(conv, command).await,
                None => self.handle_text(conv, &text).await,
            },
            Inbound::Voice(path) => self.handle_voice(conv, &path).await,
        }
    }

    pub async fn handle_command(&self, conv: &Conversation, command: Command) -> Result<(), ChatError> {
        info!(user = %conv.user, command = ?command, "Command received");
        match command {
            Command::Start | Command::Help => self.send_plain(&conv.chat, messages::WELCOME).await,
            Command::Unknown(name) => {
                debug!(command = %name, "Unknown command, sending help");
                self.send_plain(&conv.chat, messages::WELCOME).await
            }
            Command::AiMode => {
                let enabled = self.toggle(conv, PreferenceFlag::AiMode)?;
                self.send_plain(&conv.chat, &messages::ai_mode_state(enabled)).await
            }
            Command::VoiceMode => {
                let enabled = self.toggle(conv, PreferenceFlag::VoiceMode)?;
                self.send_plain(&conv.chat, &messages::voice_mode_state(enabled)).await
            }
            Command::Search => {
                let prefs = self.preferences(conv)?;
                for reply in self.generator.generate(&Intent::named(labels::APARTMENT)) {
                    self.send_reply(conv, prefs, &reply).await?;
                }
                Ok(())
            }
        }
    }

    /// Text path. Blank input is ignored.
    pub async fn handle_text(&self, conv: &Conversation, text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            debug!(user = %conv.user, "Blank message ignored");
            return Ok(());
        }
        let prefs = self.preferences(conv)?;
        self.respond(conv, prefs, text).await
    }

    /// Voice path: recognize, echo, then answer like text.
    pub async fn handle_voice(&self, conv: &Conversation, audio_path: &Path) -> Result<(), ChatError> {
        let prefs = match self.preferences(conv) {
            Ok(prefs) => prefs,
            Err(e) => {
                remove_file_logged(audio_path);
                return Err(e);
            }
        };

        if !prefs.voice_mode {
            remove_file_logged(audio_path);
            return self.send_plain(&conv.chat, messages::VOICE_DISABLED).await;
        }

        if !audio_path.exists() {
            error!(user = %conv.user, path = %audio_path.display(), "Voice message file missing");
            return self.send_plain(&conv.chat, messages::AUDIO_FAILED).await;
        }

        let Some(text) = self.services.voice.speech_to_text(audio_path).await else {
            return self
                .send_plain(&conv.chat, messages::SPEECH_NOT_RECOGNIZED)
                .await;
        };
        info!(user = %conv.user, chars = text.chars().count(), "Voice message recognized");

        self.send_plain(&conv.chat, &messages::you_said(&text)).await?;
        self.respond(conv, prefs, &text).await
    }

    async fn respond(
        &self,
        conv: &Conversation,
        prefs: UserPreferences,
        text: &str,
    ) -> Result<(), ChatError> {
        let ai_available = self.services.responder.is_enabled();
        if prefs.ai_mode && !ai_available {
            info!(user = %conv.user, "AI mode requested but responder unavailable, using templates");
        }

        let result = self.classifier.classify(text, prefs.ai_mode && ai_available);
        info!(user = %conv.user, intent = %result.intent, "Message classified");

        match (result.intent, result.reply) {
            (Intent::AiDirect, _) => self.ai_reply(conv, prefs, text).await,
            (Intent::DialogueAnswer, Some(reply)) => self.send_reply(conv, prefs, &reply).await,
            (intent, _) => {
                let replies = self.generator.generate(&intent);
                if replies.is_empty() {
                    return if ai_available {
                        self.ai_reply(conv, prefs, text).await
                    } else {
                        self.send_reply(conv, prefs, messages::NOT_UNDERSTOOD).await
                    };
                }

                for reply in &replies {
                    self.send_reply(conv, prefs, reply).await?;
                }
                if roll(self.template_recommendation_probability) {
                    if let Some(listing) = self.generator.random_listing() {
                        let text = format!("{}\n\n{}", messages::TEMPLATE_RECOMMENDATION_LEAD, listing);
                        self.send_reply(conv, prefs, &text).await?;
                    }
                }
                Ok(())
            }
        }
    }

    async fn ai_reply(
        &self,
        conv: &Conversation,
        prefs: UserPreferences,
        text: &str,
    ) -> Result<(), ChatError> {
        let thinking = if self.thinking_notice {
            Some(self.send_text(&conv.chat, messages::THINKING).await?)
        } else {
            None
        };

        let reply = self.services.responder.generate(text).await;

        if let Some(id) = thinking {
            if let Err(e) = self.services.sink.delete_message(&conv.chat, id).await {
                warn!(chat = %conv.chat, error = %e, "Failed to delete thinking notice");
            }
        }

        if reply.is_empty() {
            warn!(user = %conv.user, "AI responder produced no reply");
            return self.send_plain(&conv.chat, messages::AI_FAILED).await;
        }

        let reply = match roll(self.ai_recommendation_probability)
            .then(|| self.generator.random_listing())
            .flatten()
        {
            Some(listing) => format!(
                "{}\n\n{}\n\n{}",
                reply,
                messages::AI_RECOMMENDATION_LEAD,
                listing
            ),
            None => reply,
        };
        self.send_reply(conv, prefs, &reply).await
    }

    /// Send a reply as text and, in voice mode, as synthesized audio too.
    async fn send_reply(
        &self,
        conv: &Conversation,
        prefs: UserPreferences,
        text: &str,
    ) -> Result<(), ChatError> {
        self.send_text(&conv.chat, text).await?;
        if prefs.voice_mode && !self.send_voice_copy(conv, text).await {
            self.send_plain(&conv.chat, messages::SPEECH_SYNTH_FAILED).await?;
        }
        Ok(())
    }

    /// Voice the reply that was just sent as text. Returns `false` when
    /// synthesis or the upload failed.
    async fn send_voice_copy(&self, conv: &Conversation, text: &str) -> bool {
        let path = match self.services.voice.text_to_speech(text, &conv.user).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                debug!(user = %conv.user, "No voice copy for reply");
                return true;
            }
            Err(e) => {
                error!(user = %conv.user, error = %e, "Voice reply synthesis failed");
                return false;
            }
        };
        let path = guard(path, |p| {
            remove_file_logged(&p);
        });
        match self.services.sink.send_voice(&conv.chat, &path).await {
            Ok(_) => true,
            Err(e) => {
                error!(chat = %conv.chat, error = %e, "Failed to send voice reply");
                false
            }
        }
    }

    async fn send_plain(&self, chat: &ChatId, text: &str) -> Result<(), ChatError> {
        self.send_text(chat, text).await.map(|_| ())
    }

    async fn send_text(
        &self,
        chat: &ChatId,
        text: &str,
    ) -> Result<estate_core::types::MessageId, ChatError> {
        self.services
            .sink
            .send_text(chat, text)
            .await
            .map_err(ChatError::delivery)
    }

    fn preferences(&self, conv: &Conversation) -> Result<UserPreferences, ChatError> {
        self.services
            .preferences
            .get(&conv.user)
            .map_err(ChatError::preferences)
    }

    fn toggle(&self, conv: &Conversation, flag: PreferenceFlag) -> Result<bool, ChatError> {
        let value = self
            .services
            .preferences
            .toggle(&conv.user, flag)
            .map_err(ChatError::preferences)?;
        info!(user = %conv.user, flag = flag.key(), value, "Preference toggled");
        Ok(value)
    }
}

fn roll(probability: f64) -> bool {
    probability > 0.0 && rand::rng().random_bool(probability.min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_extremes() {
        assert!(!roll(0.0));
        assert!(roll(1.0));
        assert!((0..100).all(|_| !roll(0.0)));
    }
}
