pub mod config;
pub mod error;
pub mod fsutil;
pub mod text;
pub mod traits;
pub mod types;

pub use config::EstateConfig;
pub use error::{EstateError, Result};
pub use text::normalize_response;
pub use traits::{MessageSink, TextResponder, VoiceGateway};
pub use types::*;
