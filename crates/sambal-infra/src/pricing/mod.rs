//! Live product pricing from the payments provider, with catalog fallback.

mod cached;
mod stripe;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use sambal_core::domain::{Price, Product};
use sambal_core::ports::{PriceProvider, PricingError};

pub use cached::CachedPriceProvider;
pub use stripe::StripePriceClient;

/// Payments provider configuration.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub secret_key: Option<String>,
    pub api_url: String,
    pub cache_ttl: Duration,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_url: "https://api.stripe.com".to_string(),
            cache_ttl: Duration::from_secs(600),
        }
    }
}

impl PricingConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: std::env::var("STRIPE_SECRET_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            api_url: std::env::var("STRIPE_API_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            cache_ttl: Duration::from_secs(
                std::env::var("PRICE_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

/// Provider used when no secret key is configured: every lookup falls back.
pub struct UnconfiguredPrices;

#[async_trait]
impl PriceProvider for UnconfiguredPrices {
    async fn price(&self, _price_id: &str) -> Result<Price, PricingError> {
        Err(PricingError::NotConfigured)
    }
}

/// Build the cached live client, or the always-fallback provider without a key.
pub fn build_price_provider(config: &PricingConfig) -> Arc<dyn PriceProvider> {
    match &config.secret_key {
        Some(key) => {
            let client = StripePriceClient::new(key.clone(), config.api_url.clone());
            Arc::new(CachedPriceProvider::new(Arc::new(client), config.cache_ttl))
        }
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set. Catalog prices only.");
            Arc::new(UnconfiguredPrices)
        }
    }
}

/// Live price for `product`, or its catalog price if the lookup fails.
pub async fn price_for(provider: &dyn PriceProvider, product: &Product) -> Price {
    match provider.price(product.price_id).await {
        Ok(price) => price,
        Err(PricingError::NotConfigured) => Price::fallback(product),
        Err(e) => {
            tracing::warn!(product = %product.slug, error = %e, "Live price unavailable, using catalog price");
            Price::fallback(product)
        }
    }
}
