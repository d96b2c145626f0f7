//! TTL cache in front of a price provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use sambal_core::domain::Price;
use sambal_core::ports::{PriceProvider, PricingError};

struct CachedPrice {
    price: Price,
    expires_at: Instant,
}

/// Caches successful lookups for `ttl`. Failures are never cached.
pub struct CachedPriceProvider {
    inner: Arc<dyn PriceProvider>,
    entries: RwLock<HashMap<String, CachedPrice>>,
    ttl: Duration,
}

impl CachedPriceProvider {
    pub fn new(inner: Arc<dyn PriceProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl PriceProvider for CachedPriceProvider {
    async fn price(&self, price_id: &str) -> Result<Price, PricingError> {
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(price_id) {
                if Instant::now() < cached.expires_at {
                    return Ok(cached.price.clone());
                }
            }
        }

        let price = self.inner.price(price_id).await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            price_id.to_string(),
            CachedPrice {
                price: price.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceProvider for Counting {
        async fn price(&self, _price_id: &str) -> Result<Price, PricingError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as u32;
            Ok(Price::live(600 + n, "gbp"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn serves_cached_price_until_ttl() {
        let inner = Arc::new(Counting::default());
        let cached = CachedPriceProvider::new(inner.clone(), Duration::from_secs(60));

        assert_eq!(cached.price("p").await.unwrap().unit_amount, 600);
        assert_eq!(cached.price("p").await.unwrap().unit_amount, 600);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(cached.price("p").await.unwrap().unit_amount, 601);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
