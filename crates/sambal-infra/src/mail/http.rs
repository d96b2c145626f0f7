//! HTTP mail API client (dynamic-template send endpoint).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use sambal_core::domain::email::mask_email;
use sambal_core::ports::{EmailSender, MailError, SendReceipt};

use super::MailConfig;

const MESSAGE_ID_HEADER: &str = "x-message-id";

/// Sends one templated message per call. No retries.
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/v3/mail/send", self.config.api_url)
    }

    fn request_body(&self, template_id: &str, recipient: &str, payload: &Value) -> Value {
        json!({
            "from": {
                "email": self.config.from_address,
                "name": self.config.from_name,
            },
            "template_id": self.config.provider_template(template_id),
            "personalizations": [{
                "to": [{ "email": recipient }],
                "dynamic_template_data": payload,
            }],
        })
    }
}

#[async_trait]
impl EmailSender for HttpMailer {
    async fn send_templated(
        &self,
        template_id: &str,
        recipient: &str,
        payload: &Value,
    ) -> Result<SendReceipt, MailError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| MailError::Configuration("MAIL_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.request_body(template_id, recipient, payload))
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let message_id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        tracing::info!(
            template = %template_id,
            to = %mask_email(recipient),
            message_id = ?message_id,
            "Email sent"
        );

        Ok(SendReceipt { message_id })
    }
}
