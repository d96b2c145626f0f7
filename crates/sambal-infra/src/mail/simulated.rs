//! Mail sender used when no provider key is configured.

use async_trait::async_trait;

use sambal_core::domain::email::mask_email;
use sambal_core::ports::{EmailSender, MailError, SendReceipt};

/// Logs each message and reports it as sent.
#[derive(Debug, Default)]
pub struct SimulatedMailer;

impl SimulatedMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for SimulatedMailer {
    async fn send_templated(
        &self,
        template_id: &str,
        recipient: &str,
        payload: &serde_json::Value,
    ) -> Result<SendReceipt, MailError> {
        let message_id = format!("simulated-{}", uuid::Uuid::new_v4());
        tracing::info!(
            template = %template_id,
            to = %mask_email(recipient),
            message_id = %message_id,
            payload = %payload,
            "Simulated email send"
        );
        Ok(SendReceipt {
            message_id: Some(message_id),
        })
    }
}
