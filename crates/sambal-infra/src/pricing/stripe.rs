//! Payments-provider price lookup over its REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use sambal_core::domain::Price;
use sambal_core::ports::{PriceProvider, PricingError};

#[derive(Debug, Deserialize)]
struct PriceObject {
    unit_amount: Option<i64>,
    currency: String,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

/// `GET /v1/prices/{id}` client.
pub struct StripePriceClient {
    client: reqwest::Client,
    secret_key: String,
    api_url: String,
}

impl StripePriceClient {
    pub fn new(secret_key: String, api_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            secret_key,
            api_url,
        }
    }
}

#[async_trait]
impl PriceProvider for StripePriceClient {
    async fn price(&self, price_id: &str) -> Result<Price, PricingError> {
        let response = self
            .client
            .get(format!("{}/v1/prices/{}", self.api_url, price_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PricingError::Upstream(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PricingError::NotFound(price_id.to_string()));
        }
        if !status.is_success() {
            return Err(PricingError::Upstream(format!("status {}", status.as_u16())));
        }

        let object: PriceObject = response
            .json()
            .await
            .map_err(|e| PricingError::Malformed(e.to_string()))?;

        if !object.active {
            return Err(PricingError::NotFound(price_id.to_string()));
        }

        let unit_amount = object
            .unit_amount
            .and_then(|amount| u32::try_from(amount).ok())
            .ok_or_else(|| PricingError::Malformed("missing unit_amount".to_string()))?;

        Ok(Price::live(unit_amount, object.currency))
    }
}
