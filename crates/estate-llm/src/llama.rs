//! llama.cpp server backend.
//!
//! The model itself is hosted by `llama-server`; "loading" means checking the
//! configured model file and waiting for the server to report healthy.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use estate_core::config::AiConfig;
use estate_core::error::{EstateError, Result};

use crate::model::{LanguageModel, ModelLoader};

/// Generation stops at the first newline or at a role marker.
pub const STOP_SEQUENCES: [&str; 3] = ["\n", "Вопрос:", "Ответ:"];

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stop: &'a [&'a str],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn llm_err(context: &str, e: impl std::fmt::Display) -> EstateError {
    EstateError::Llm(format!("{}: {}", context, e))
}

/// Checks the server and hands out a [`LlamaServerModel`].
#[derive(Debug, Clone)]
pub struct LlamaServerLoader {
    config: AiConfig,
}

impl LlamaServerLoader {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ModelLoader for LlamaServerLoader {
    async fn load(&self) -> Result<Arc<dyn LanguageModel>> {
        let model_path = self.config.model_path.trim();
        if !model_path.is_empty() && !Path::new(model_path).exists() {
            return Err(EstateError::Llm(format!(
                "model file not found: {}",
                model_path
            )));
        }

        info!(server = %self.config.server_url, model = %model_path, "Loading AI model");
        let model = LlamaServerModel::new(&self.config)?;
        model.health_check().await?;
        info!("AI model loaded");
        Ok(Arc::new(model))
    }
}

/// Chat-completion client for the OpenAI-compatible llama-server endpoint.
#[derive(Debug, Clone)]
pub struct LlamaServerModel {
    client: Client,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlamaServerModel {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| llm_err("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// `GET /health`; any non-success status means the model is not ready.
    pub async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| llm_err("server unreachable", e))?;
        if !response.status().is_success() {
            return Err(EstateError::Llm(format!(
                "server not ready: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LanguageModel for LlamaServerModel {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop: &STOP_SEQUENCES,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| llm_err("request failed", e))?;

        if !response.status().is_success() {
            return Err(EstateError::Llm(format!(
                "server error: {}",
                response.status()
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| llm_err("invalid completion response", e))?;
        let text = extract_reply(body);
        debug!(chars = text.chars().count(), "Completion received");
        Ok(text)
    }
}

/// First choice, cut at the first stop sequence in case the server ignored
/// them.
fn extract_reply(body: ChatCompletionResponse) -> String {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    let content = content.trim_start();
    let end = STOP_SEQUENCES
        .iter()
        .filter_map(|stop| content.find(stop))
        .min()
        .unwrap_or(content.len());
    content[..end].trim().to_string()
}
