//! Conversational core of the estate assistant.
//!
//! Classifies inbound text, renders templated and listing replies, and
//! dispatches every inbound message to the right responder.

pub mod classifier;
pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod response;

pub use classifier::{IntentClassifier, PROBE_WORDS};
pub use commands::Command;
pub use dispatcher::{Dispatcher, Inbound, Services};
pub use error::ChatError;
pub use response::{format_listing, ResponseGenerator};
