//! Console messenger: a [`MessageSink`] that prints to a terminal and a
//! line-based REPL feeding the dispatcher.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info};
use uuid::Uuid;

use estate_chat::{Dispatcher, Inbound};
use estate_core::error::{EstateError, Result};
use estate_core::traits::MessageSink;
use estate_core::types::{ChatId, Conversation, MessageId};

/// Prints outbound messages. Message ids are sequential per sink.
pub struct ConsoleSink<W: Write + Send> {
    out: Mutex<W>,
    next_id: AtomicI64,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicI64::new(1),
        }
    }

    fn print(&self, text: &str) -> Result<MessageId> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| EstateError::Delivery("console writer poisoned".to_string()))?;
        writeln!(out, "{}\n", text)
            .and_then(|_| out.flush())
            .map_err(|e| EstateError::Delivery(format!("console write failed: {}", e)))?;
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<W: Write + Send> MessageSink for ConsoleSink<W> {
    async fn send_text(&self, chat: &ChatId, text: &str) -> Result<MessageId> {
        debug!(chat = %chat, chars = text.chars().count(), "Console text message");
        self.print(&format!("🤖 {}", text))
    }

    async fn send_voice(&self, chat: &ChatId, audio_path: &Path) -> Result<MessageId> {
        let meta = tokio::fs::metadata(audio_path).await.map_err(|e| {
            EstateError::Delivery(format!("voice file {}: {}", audio_path.display(), e))
        })?;
        debug!(chat = %chat, bytes = meta.len(), "Console voice message");
        self.print(&format!("🔈 [voice reply, {} bytes]", meta.len()))
    }

    async fn delete_message(&self, chat: &ChatId, message: MessageId) -> Result<()> {
        debug!(chat = %chat, id = message.0, "Console message deleted");
        Ok(())
    }
}

/// One line typed into the console.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleInput {
    Quit,
    /// `/voice <path>`: send an audio file as a voice message.
    Voice(PathBuf),
    Message(String),
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if matches!(trimmed, "/quit" | "/exit") {
            return ConsoleInput::Quit;
        }
        if let Some(rest) = trimmed.strip_prefix("/voice ") {
            let path = rest.trim();
            if !path.is_empty() {
                return ConsoleInput::Voice(PathBuf::from(path));
            }
        }
        ConsoleInput::Message(line.to_string())
    }
}

/// Copy an audio file into the download directory, as a messenger client
/// would when fetching a voice message. The dispatcher deletes the copy.
pub async fn stage_voice(source: &Path, download_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(download_dir).await?;
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("ogg");
    let target = download_dir.join(format!("voice_{}.{}", Uuid::new_v4().simple(), ext));
    tokio::fs::copy(source, &target).await?;
    Ok(target)
}

/// Read lines until EOF or `/quit`, dispatching each as one inbound message.
/// Dispatch errors are logged and the session continues.
pub async fn run<R>(
    reader: R,
    dispatcher: &Dispatcher,
    conv: &Conversation,
    download_dir: &Path,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let inbound = match ConsoleInput::parse(&line) {
            ConsoleInput::Quit => break,
            ConsoleInput::Message(text) => Inbound::Text(text),
            ConsoleInput::Voice(source) => match stage_voice(&source, download_dir).await {
                Ok(path) => Inbound::Voice(path),
                Err(e) => {
                    error!(path = %source.display(), error = %e, "Cannot read voice file");
                    continue;
                }
            },
        };
        if let Err(e) = dispatcher.handle(conv, inbound).await {
            error!(user = %conv.user, error = %e, "Message handling failed");
        }
    }
    info!(user = %conv.user, "Console session ended");
    Ok(())
}
