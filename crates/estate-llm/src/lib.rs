//! Estate LLM crate - the AI responder.
//!
//! [`AiResponder`] implements [`estate_core::TextResponder`] on top of a
//! [`LanguageModel`] that is loaded lazily, once, by a [`ModelLoader`]. The
//! production backend talks to a local llama.cpp server.

pub mod llama;
pub mod model;
pub mod responder;

pub use llama::{LlamaServerLoader, LlamaServerModel};
pub use model::{LanguageModel, ModelLoader};
pub use responder::AiResponder;
