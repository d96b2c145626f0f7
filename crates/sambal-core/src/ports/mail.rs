//! Outbound templated email port.

use async_trait::async_trait;

/// Accepted send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// Mail provider port. One attempt per call; retrying is the provider client's business.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Render `template_id` with `payload` and send it to `recipient`.
    async fn send_templated(
        &self,
        template_id: &str,
        recipient: &str,
        payload: &serde_json::Value,
    ) -> Result<SendReceipt, MailError>;
}

/// Mail errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Mail is not configured: {0}")]
    Configuration(String),
}
