use std::sync::Arc;

use async_trait::async_trait;

use estate_core::error::Result;

/// A loaded language model able to answer one prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one chat completion and return the raw reply text.
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String>;
}

/// Performs the one-time model load.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn LanguageModel>>;
}
