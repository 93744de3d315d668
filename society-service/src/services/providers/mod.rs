pub mod email;

use async_trait::async_trait;
use thiserror::Error;

pub use email::{MockEmailProvider, SmtpProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Send error: {0}")]
    SendFailed(String),
}

/// A rendered email with plain-text and HTML bodies.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver a message, returning the provider's message id when it reports one.
    async fn send(&self, email: &EmailMessage) -> Result<Option<String>, ProviderError>;
}
