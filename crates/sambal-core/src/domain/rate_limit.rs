//! Rate-limit policies and decisions.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A named category of API route sharing one rate-limit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointClass {
    Contact,
    Newsletter,
    Auth,
    Interest,
    Preorder,
    Feedback,
    Default,
}

impl EndpointClass {
    pub const ALL: [EndpointClass; 7] = [
        EndpointClass::Contact,
        EndpointClass::Newsletter,
        EndpointClass::Auth,
        EndpointClass::Interest,
        EndpointClass::Preorder,
        EndpointClass::Feedback,
        EndpointClass::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Contact => "contact",
            EndpointClass::Newsletter => "newsletter",
            EndpointClass::Auth => "auth",
            EndpointClass::Interest => "interest",
            EndpointClass::Preorder => "preorder",
            EndpointClass::Feedback => "feedback",
            EndpointClass::Default => "default",
        }
    }

    /// Hard-coded policy for this class.
    pub fn policy(&self) -> EndpointPolicy {
        const MINUTE: u64 = 60 * 1000;
        const HOUR: u64 = 60 * MINUTE;

        let (max_requests, window_ms) = match self {
            EndpointClass::Contact => (5, HOUR),
            EndpointClass::Newsletter => (3, HOUR),
            EndpointClass::Auth => (5, 15 * MINUTE),
            EndpointClass::Interest => (10, MINUTE),
            EndpointClass::Preorder => (3, HOUR),
            EndpointClass::Feedback => (5, HOUR),
            EndpointClass::Default => (100, 15 * MINUTE),
        };

        EndpointPolicy {
            max_requests,
            window_ms,
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sliding-window budget for one endpoint class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointPolicy {
    max_requests: u32,
    window_ms: u64,
}

impl EndpointPolicy {
    /// Build a policy, rejecting an empty budget or a zero-length window.
    pub fn new(max_requests: u32, window: Duration) -> Result<Self, DomainError> {
        let window_ms = window.as_millis() as u64;
        let mut errors = Vec::new();
        if max_requests < 1 {
            errors.push("max_requests must be at least 1".to_string());
        }
        if window_ms == 0 {
            errors.push("window must be longer than zero".to_string());
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        Ok(Self {
            max_requests,
            window_ms,
        })
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Composite limiter key: `"<ip>:<class>"`.
pub fn rate_limit_key(ip: &str, class: EndpointClass) -> String {
    format!("{}:{}", ip, class)
}

/// Counter state for one key within its current window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    /// Epoch milliseconds at which the window expires.
    pub reset_time: i64,
}

impl RateLimitEntry {
    pub fn open(now_ms: i64, policy: &EndpointPolicy) -> Self {
        Self {
            count: 1,
            reset_time: now_ms + policy.window_ms() as i64,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.reset_time
    }
}

/// Budget figures reported alongside every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds of the window reset; 0 when unknown.
    pub reset_at_ms: i64,
}

impl Quota {
    pub fn reset_at_secs(&self) -> i64 {
        (self.reset_at_ms + 999).div_euclid(1000)
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Quota),
    Deny { quota: Quota, retry_after_secs: u64 },
}

impl Decision {
    /// Allow without attributing the request to any counter.
    pub fn unattributed(policy: &EndpointPolicy) -> Self {
        Decision::Allow(Quota {
            limit: policy.max_requests(),
            remaining: policy.max_requests(),
            reset_at_ms: 0,
        })
    }

    /// Deny until `reset_time`; the retry hint rounds up to whole seconds.
    pub fn deny(policy: &EndpointPolicy, reset_time: i64, now_ms: i64) -> Self {
        let wait_ms = (reset_time - now_ms).max(0) as u64;
        Decision::Deny {
            quota: Quota {
                limit: policy.max_requests(),
                remaining: 0,
                reset_at_ms: reset_time,
            },
            retry_after_secs: wait_ms.div_ceil(1000),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn quota(&self) -> &Quota {
        match self {
            Decision::Allow(quota) => quota,
            Decision::Deny { quota, .. } => quota,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_rejects_empty_budget_and_zero_window() {
        let err = EndpointPolicy::new(0, Duration::ZERO).unwrap_err();
        match err {
            DomainError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(EndpointPolicy::new(1, Duration::from_millis(1)).is_ok());
    }

    #[test]
    fn every_class_has_a_valid_policy() {
        for class in EndpointClass::ALL {
            let policy = class.policy();
            assert!(policy.max_requests() >= 1, "{class}");
            assert!(policy.window_ms() > 0, "{class}");
        }
        assert_eq!(EndpointClass::Contact.policy().max_requests(), 5);
        assert_eq!(EndpointClass::Contact.policy().window(), Duration::from_secs(3600));
    }

    #[test]
    fn key_joins_ip_and_class() {
        assert_eq!(
            rate_limit_key("203.0.113.4", EndpointClass::Contact),
            "203.0.113.4:contact"
        );
    }

    #[test]
    fn deny_rounds_retry_up_to_whole_seconds() {
        let policy = EndpointPolicy::new(3, Duration::from_millis(1000)).unwrap();
        match Decision::deny(&policy, 1000, 300) {
            Decision::Deny {
                retry_after_secs,
                quota,
            } => {
                assert_eq!(retry_after_secs, 1);
                assert_eq!(quota.remaining, 0);
            }
            other => panic!("expected deny, got {other:?}"),
        }
        match Decision::deny(&policy, 5_001, 0) {
            Decision::Deny {
                retry_after_secs, ..
            } => assert_eq!(retry_after_secs, 6),
            other => panic!("expected deny, got {other:?}"),
        }
    }
}
