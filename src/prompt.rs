//! Passphrase prompt capability supplied by the UI layer.

use async_trait::async_trait;
use thiserror::Error;

/// The prompt itself failed (dialog crashed, window closed with an error, ...).
/// Distinct from the user cancelling, which is `Ok(None)`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PromptError {
    pub message: String,
}

impl PromptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Asks the user for the passphrase belonging to `identity`.
///
/// This is the only place the secret subsystem suspends. No timeout is
/// applied; wrap the implementation if one is needed.
#[async_trait]
pub trait PassphrasePrompter: Send + Sync {
    /// Returns `Ok(None)` when the user cancels.
    async fn prompt_for_passphrase(&self, identity: &str) -> Result<Option<String>, PromptError>;
}
