use thiserror::Error;
use tracing::debug;

use crate::http::TransportError;

/// The one failure kind API modules hand to stores: a message fit for
/// showing to the user, already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Uses the server-provided message when there is one, otherwise the
    /// operation's fixed fallback.
    pub fn resolve(err: &TransportError, fallback: &str) -> Self {
        match err.server_message() {
            Some(message) => Self::new(message),
            None => {
                debug!("api: falling back to '{fallback}' for {err}");
                Self::new(fallback)
            }
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
