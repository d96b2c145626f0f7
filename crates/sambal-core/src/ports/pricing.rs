//! Payments-provider price lookup port.

use async_trait::async_trait;

use crate::domain::Price;

/// Read-only live price lookup.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn price(&self, price_id: &str) -> Result<Price, PricingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Price '{0}' not found")]
    NotFound(String),

    #[error("Price lookup failed: {0}")]
    Upstream(String),

    #[error("Unexpected price payload: {0}")]
    Malformed(String),

    #[error("Payments provider is not configured")]
    NotConfigured,
}
