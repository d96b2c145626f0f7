//! Rate limiting port.

use async_trait::async_trait;

use crate::domain::{Decision, EndpointClass};

/// Rate limiter trait - abstraction over counter stores (process map, Redis).
///
/// Implementations never fail: a backend they cannot reach, or a client they
/// cannot attribute, results in an allow decision.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request from `ip` against `class` and decide whether it may proceed.
    async fn check(&self, ip: &str, class: EndpointClass) -> Decision;
}
