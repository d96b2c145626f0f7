//! Redis rate limiter - the same window contract over a counter shared by every instance.

use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;

use sambal_core::domain::rate_limit::rate_limit_key;
use sambal_core::domain::{Decision, EndpointClass, Quota};
use sambal_core::ports::RateLimiter;

use super::PolicyTable;
use crate::redis_config::RedisConfig;

/// Redis rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RedisRateLimitConfig {
    /// Redis connection config
    pub redis: RedisConfig,
    /// Key prefix for rate limit keys
    pub key_prefix: String,
    pub policies: PolicyTable,
}

impl Default for RedisRateLimitConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            key_prefix: "ratelimit".to_string(),
            policies: PolicyTable::default(),
        }
    }
}

impl RedisRateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            redis: RedisConfig::from_env(),
            key_prefix: std::env::var("RATE_LIMIT_KEY_PREFIX")
                .unwrap_or_else(|_| "ratelimit".to_string()),
            policies: PolicyTable::default(),
        }
    }
}

// Denied requests leave the counter alone, matching the in-process limiter.
// Returns: [allowed (0|1), count, pttl_ms]
const WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local max_requests = tonumber(ARGV[1])
local window_ms = tonumber(ARGV[2])

local current = tonumber(redis.call('GET', key) or '0')
if current >= max_requests then
    return {0, current, redis.call('PTTL', key)}
end

current = redis.call('INCR', key)
if current == 1 then
    redis.call('PEXPIRE', key, window_ms)
end

return {1, current, redis.call('PTTL', key)}
"#;

/// Redis-backed limiter using an atomic script with per-key expiry.
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    config: RedisRateLimitConfig,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(config: RedisRateLimitConfig) -> Result<Self, String> {
        let conn = config.redis.connect().await?;

        tracing::info!(url = %config.redis.url, "Connected to Redis rate limiter");

        Ok(Self {
            conn,
            config,
            script: Script::new(WINDOW_SCRIPT),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, String> {
        Self::new(RedisRateLimitConfig::from_env()).await
    }

    fn make_key(&self, ip: &str, class: EndpointClass) -> String {
        format!("{}:{}", self.config.key_prefix, rate_limit_key(ip, class))
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, ip: &str, class: EndpointClass) -> Decision {
        let policy = self.config.policies.policy(class);
        let ip = ip.trim();
        if ip.is_empty() {
            return Decision::unattributed(&policy);
        }

        let mut conn = self.conn.clone();
        let result: Result<Vec<i64>, _> = self
            .script
            .key(self.make_key(ip, class))
            .arg(policy.max_requests())
            .arg(policy.window_ms())
            .invoke_async(&mut conn)
            .await;

        let values = match result {
            Ok(values) => values,
            Err(e) => {
                tracing::error!(error = %e, class = %class, "Redis rate limiter failed, allowing request");
                return Decision::unattributed(&policy);
            }
        };

        let allowed = values.first().copied().unwrap_or(1) == 1;
        let count = values.get(1).copied().unwrap_or(1).max(0) as u32;
        let ttl_ms = values
            .get(2)
            .copied()
            .filter(|ttl| *ttl >= 0)
            .unwrap_or(policy.window_ms() as i64);

        let now_ms = chrono::Utc::now().timestamp_millis();
        let reset_time = now_ms + ttl_ms;

        if allowed {
            Decision::Allow(Quota {
                limit: policy.max_requests(),
                remaining: policy.max_requests().saturating_sub(count),
                reset_at_ms: reset_time,
            })
        } else {
            Decision::deny(&policy, reset_time, now_ms)
        }
    }
}
