//! Application configuration loaded from environment variables.

use std::env;

use sambal_infra::{CampaignBackend, DatabaseConfig, MailConfig, PricingConfig};

use crate::background::SchedulerConfig;
use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub mail: MailConfig,
    pub pricing: PricingConfig,
    pub campaign_backend: CampaignBackend,
    /// Expose the quick-test campaign trigger routes.
    pub campaign_test_endpoints: bool,
    pub telemetry: TelemetryConfig,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            mail: MailConfig::from_env(),
            pricing: PricingConfig::from_env(),
            campaign_backend: CampaignBackend::from_env(),
            campaign_test_endpoints: flag("CAMPAIGN_TEST_ENDPOINTS", false),
            telemetry: TelemetryConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
        }
    }
}

/// Boolean env var: `true`/`1` and `false`/`0`, anything else is the default.
pub(crate) fn flag(name: &str, default: bool) -> bool {
    match env::var(name).as_deref() {
        Ok("true") | Ok("1") => true,
        Ok("false") | Ok("0") => false,
        _ => default,
    }
}
