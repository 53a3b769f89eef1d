//! Error types for the dispatcher.

use estate_core::error::EstateError;

/// Failures the dispatcher cannot degrade into a reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("preference store error: {0}")]
    Preferences(String),
    #[error("delivery error: {0}")]
    Delivery(String),
}

impl ChatError {
    pub(crate) fn preferences(err: EstateError) -> Self {
        ChatError::Preferences(err.to_string())
    }

    pub(crate) fn delivery(err: EstateError) -> Self {
        match err {
            EstateError::Delivery(msg) => ChatError::Delivery(msg),
            other => ChatError::Delivery(other.to_string()),
        }
    }
}

impl From<EstateError> for ChatError {
    fn from(err: EstateError) -> Self {
        match err {
            EstateError::Delivery(msg) => ChatError::Delivery(msg),
            other => ChatError::Preferences(other.to_string()),
        }
    }
}
