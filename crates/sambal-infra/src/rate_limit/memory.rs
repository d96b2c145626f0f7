//! In-process sliding-window rate limiter.
//!
//! One counter per `"<ip>:<class>"` key. The window opens on the first request
//! and resets a fixed duration later, independent of clock boundaries.
//! Limits are per-process, not shared across instances.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use sambal_core::domain::rate_limit::rate_limit_key;
use sambal_core::domain::{Decision, EndpointClass, EndpointPolicy, Quota, RateLimitEntry};
use sambal_core::ports::RateLimiter;

/// Policy per endpoint class. Defaults to the hard-coded table.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    overrides: HashMap<EndpointClass, EndpointPolicy>,
}

impl PolicyTable {
    /// Replace the policy of one class.
    pub fn with_policy(mut self, class: EndpointClass, policy: EndpointPolicy) -> Self {
        self.overrides.insert(class, policy);
        self
    }

    pub fn policy(&self, class: EndpointClass) -> EndpointPolicy {
        self.overrides
            .get(&class)
            .copied()
            .unwrap_or_else(|| class.policy())
    }
}

/// In-memory rate limiter over a process-wide map.
pub struct InMemoryRateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    policies: PolicyTable,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::with_policies(PolicyTable::default())
    }

    pub fn with_policies(policies: PolicyTable) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policies,
        }
    }

    /// Check-and-increment at an explicit epoch-millisecond instant.
    pub fn check_at(&self, ip: &str, class: EndpointClass, now_ms: i64) -> Decision {
        let policy = self.policies.policy(class);
        let ip = ip.trim();
        if ip.is_empty() {
            return Decision::unattributed(&policy);
        }

        let key = rate_limit_key(ip, class);
        let mut entries = self.entries.lock();

        match entries.get_mut(&key) {
            Some(entry) if !entry.is_expired(now_ms) => {
                if entry.count < policy.max_requests() {
                    entry.count += 1;
                    Decision::Allow(Quota {
                        limit: policy.max_requests(),
                        remaining: policy.max_requests() - entry.count,
                        reset_at_ms: entry.reset_time,
                    })
                } else {
                    Decision::deny(&policy, entry.reset_time, now_ms)
                }
            }
            _ => {
                let entry = RateLimitEntry::open(now_ms, &policy);
                let decision = Decision::Allow(Quota {
                    limit: policy.max_requests(),
                    remaining: policy.max_requests() - entry.count,
                    reset_at_ms: entry.reset_time,
                });
                entries.insert(key, entry);
                decision
            }
        }
    }

    /// Drop every entry whose window has passed. Returns how many were removed.
    pub fn sweep_expired_at(&self, now_ms: i64) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now_ms));
        before - entries.len()
    }

    pub fn sweep_expired(&self) -> usize {
        let removed = self.sweep_expired_at(now_ms());
        tracing::debug!(removed, remaining = self.len(), "Rate limit sweep finished");
        removed
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn entry(&self, ip: &str, class: EndpointClass) -> Option<RateLimitEntry> {
        self.entries.lock().get(&rate_limit_key(ip, class)).cloned()
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, ip: &str, class: EndpointClass) -> Decision {
        let decision = self.check_at(ip, class, now_ms());
        if !decision.is_allowed() {
            tracing::debug!(ip = %ip, class = %class, "Request over rate limit");
        }
        decision
    }
}
