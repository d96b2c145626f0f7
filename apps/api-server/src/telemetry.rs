//! Log output for the storefront API.
//!
//! Request spans come from `TracingLogger` and the request-id middleware;
//! this module only installs the subscriber. Recipient emails reach the logs
//! masked, so JSON output is safe to ship to a log store.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Used when `RUST_LOG` is unset: debug for our own crates, info elsewhere.
const DEFAULT_FILTER: &str = "info,api_server=debug,sambal_infra=debug";

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `LOG_FORMAT=json` emits JSON lines; anything else is pretty output.
    pub json_logs: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            service_name: "sambal-api".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            json_logs: std::env::var("LOG_FORMAT")
                .is_ok_and(|format| format.trim().eq_ignore_ascii_case("json")),
            service_name: std::env::var("SERVICE_NAME")
                .ok()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.service_name),
        }
    }
}

pub fn init_telemetry(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
}
