//! Mail provider adapters.

mod http;
mod simulated;

use std::collections::HashMap;
use std::sync::Arc;

use sambal_core::ports::EmailSender;

pub use http::HttpMailer;
pub use simulated::SimulatedMailer;

/// Mail provider configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Provider API key. Without one, mail is simulated.
    pub api_key: Option<String>,
    pub api_url: String,
    pub from_address: String,
    pub from_name: String,
    /// Logical template id → provider template id.
    pub template_overrides: HashMap<String, String>,
    /// Internal inbox notified about contact messages.
    pub notify_address: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.sendgrid.com".to_string(),
            from_address: "hello@sambal.co.uk".to_string(),
            from_name: "Sambal Kitchen".to_string(),
            template_overrides: HashMap::new(),
            notify_address: None,
        }
    }
}

impl MailConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Parse from an iterator of `(name, value)` pairs.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut config = Self::default();

        for (key, value) in vars {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "MAIL_API_KEY" => config.api_key = Some(value),
                "MAIL_API_URL" => config.api_url = value.trim_end_matches('/').to_string(),
                "MAIL_FROM_ADDRESS" => config.from_address = value,
                "MAIL_FROM_NAME" => config.from_name = value,
                "MAIL_NOTIFY_ADDRESS" => config.notify_address = Some(value),
                _ => {
                    // MAIL_TEMPLATE_ABANDONED_CART_REMINDER -> abandoned-cart-reminder
                    if let Some(name) = key.strip_prefix("MAIL_TEMPLATE_") {
                        let template = name.to_lowercase().replace('_', "-");
                        config.template_overrides.insert(template, value);
                    }
                }
            }
        }

        config
    }

    /// Provider template id for a logical template.
    pub fn provider_template<'a>(&'a self, template_id: &'a str) -> &'a str {
        self.template_overrides
            .get(template_id)
            .map(String::as_str)
            .unwrap_or(template_id)
    }
}

/// Pick the provider client, degrading to simulated sends without an API key.
pub fn build_mailer(config: &MailConfig) -> Arc<dyn EmailSender> {
    match &config.api_key {
        Some(_) => {
            tracing::info!(api_url = %config.api_url, "Mail provider configured");
            Arc::new(HttpMailer::new(config.clone()))
        }
        None => {
            tracing::warn!("MAIL_API_KEY not set. Emails will be logged, not sent.");
            Arc::new(SimulatedMailer::new())
        }
    }
}
