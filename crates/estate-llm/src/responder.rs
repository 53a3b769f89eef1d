use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use estate_core::config::AiConfig;
use estate_core::traits::TextResponder;
use estate_core::normalize_response;

use crate::llama::LlamaServerLoader;
use crate::model::{LanguageModel, ModelLoader};

/// AI responder with a lazy, one-time model load.
///
/// The first caller runs the loader; concurrent callers wait on the same
/// initialization. A failed load is remembered as `None` and the responder
/// stays disabled for the rest of the process.
pub struct AiResponder {
    loader: Option<Box<dyn ModelLoader>>,
    system_prompt: String,
    model: OnceCell<Option<Arc<dyn LanguageModel>>>,
}

impl AiResponder {
    pub fn new(loader: impl ModelLoader + 'static, system_prompt: impl Into<String>) -> Self {
        Self {
            loader: Some(Box::new(loader)),
            system_prompt: system_prompt.into(),
            model: OnceCell::new(),
        }
    }

    /// A responder that never produces a reply.
    pub fn disabled() -> Self {
        Self {
            loader: None,
            system_prompt: String::new(),
            model: OnceCell::new(),
        }
    }

    /// Build the llama-server responder, or a disabled one when `ai.enabled`
    /// is off.
    pub fn from_config(config: &AiConfig) -> Self {
        if !config.enabled {
            info!("AI responder disabled by configuration");
            return Self::disabled();
        }
        Self::new(
            LlamaServerLoader::new(config.clone()),
            config.system_prompt.clone(),
        )
    }

    /// Trigger the model load ahead of the first request. Returns whether a
    /// model is available.
    pub async fn warm_up(&self) -> bool {
        self.model().await.is_some()
    }

    async fn model(&self) -> Option<Arc<dyn LanguageModel>> {
        let loader = self.loader.as_ref()?;
        self.model
            .get_or_init(|| async {
                match loader.load().await {
                    Ok(model) => Some(model),
                    Err(e) => {
                        error!(error = %e, "AI model load failed, responder disabled");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}

#[async_trait]
impl TextResponder for AiResponder {
    async fn generate(&self, prompt: &str) -> String {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return String::new();
        }
        let Some(model) = self.model().await else {
            return String::new();
        };

        match model.complete(&self.system_prompt, prompt).await {
            Ok(raw) => {
                let reply = normalize_response(&raw);
                if reply.is_empty() {
                    warn!("AI model returned an empty reply");
                } else {
                    debug!(chars = reply.chars().count(), "AI reply generated");
                }
                reply
            }
            Err(e) => {
                error!(error = %e, "AI generation failed");
                String::new()
            }
        }
    }

    /// Optimistic until the load has been attempted; call
    /// [`AiResponder::warm_up`] first to settle it before serving.
    fn is_enabled(&self) -> bool {
        self.loader.is_some() && !matches!(self.model.get(), Some(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use estate_core::error::{EstateError, Result};

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String> {
            if prompt == "fail" {
                return Err(EstateError::Llm("boom".to_string()));
            }
            Ok(format!("  {} / {}", prompt, system_prompt.len()))
        }
    }

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        succeed: bool,
    }

    #[async_trait]
    impl ModelLoader for CountingLoader {
        async fn load(&self) -> Result<Arc<dyn LanguageModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.succeed {
                Ok(Arc::new(EchoModel))
            } else {
                Err(EstateError::Llm("no model".to_string()))
            }
        }
    }

    fn responder(succeed: bool) -> (Arc<AiResponder>, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            loads: Arc::clone(&loads),
            succeed,
        };
        (Arc::new(AiResponder::new(loader, "persona")), loads)
    }

    #[tokio::test]
    async fn test_reply_is_normalized() {
        let (ai, _) = responder(true);
        assert_eq!(ai.generate("квартира").await, "Квартира / 7");
    }

    #[tokio::test]
    async fn test_concurrent_callers_load_once() {
        let (ai, loads) = responder(true);
        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let ai = Arc::clone(&ai);
                tokio::spawn(async move { ai.generate(&format!("q{}", i)).await })
            })
            .collect();
        for task in tasks {
            assert!(!task.await.unwrap().is_empty());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(ai.is_enabled());
    }

    #[tokio::test]
    async fn test_failed_load_disables_permanently() {
        let (ai, loads) = responder(false);
        assert!(ai.is_enabled());
        assert_eq!(ai.generate("привет").await, "");
        assert_eq!(ai.generate("привет").await, "");
        assert!(!ai.warm_up().await);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(!ai.is_enabled());
    }

    #[tokio::test]
    async fn test_warm_up_settles_availability_before_first_request() {
        let (ai, loads) = responder(false);
        assert!(!ai.warm_up().await);
        assert!(!ai.is_enabled());
        assert_eq!(ai.generate("привет").await, "");
        assert!(!ai.is_enabled());
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        let (ai, _) = responder(true);
        assert!(ai.warm_up().await);
        assert!(ai.is_enabled());
    }

    #[tokio::test]
    async fn test_generation_error_is_empty_reply() {
        let (ai, _) = responder(true);
        assert_eq!(ai.generate("fail").await, "");
        assert!(ai.is_enabled());
    }

    #[tokio::test]
    async fn test_empty_prompt_skips_load() {
        let (ai, loads) = responder(true);
        assert_eq!(ai.generate("   ").await, "");
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_responder() {
        let ai = AiResponder::disabled();
        assert!(!ai.is_enabled());
        assert_eq!(ai.generate("привет").await, "");

        let config = AiConfig {
            enabled: false,
            ..AiConfig::default()
        };
        assert!(!AiResponder::from_config(&config).is_enabled());
    }
}
