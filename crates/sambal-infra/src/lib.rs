//! # Sambal Infrastructure
//!
//! Concrete implementations of the ports defined in `sambal-core`: rate
//! limiters, campaign step schedulers, task queues, the mail and payments
//! clients, and submission stores.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external stores, in-memory only
//! - `postgres` - PostgreSQL submission store via SeaORM
//! - `redis` - Redis rate limiter and durable task queue

pub mod campaigns;
pub mod database;
pub mod mail;
pub mod pricing;
pub mod queue;
pub mod rate_limit;
pub mod tasks;

#[cfg(feature = "redis")]
pub mod redis_config;

#[cfg(test)]
mod test_support;

// Re-exports - In-Memory
pub use campaigns::{
    CampaignBackend, CampaignDispatcher, QueuedStepScheduler, ScheduledCampaign,
    TimerStepScheduler, campaign_task_handler,
};
pub use database::{DatabaseConfig, InMemorySubmissionRepository};
pub use mail::{MailConfig, build_mailer};
pub use pricing::{PricingConfig, build_price_provider, price_for};
pub use queue::InMemoryTaskQueue;
pub use rate_limit::InMemoryRateLimiter;
pub use tasks::spawn_detached;

#[cfg(feature = "postgres")]
pub use database::PostgresSubmissionRepository;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use queue::{RedisTaskQueue, RedisTaskQueueConfig};
#[cfg(feature = "redis")]
pub use rate_limit::{RedisRateLimitConfig, RedisRateLimiter};
#[cfg(feature = "redis")]
pub use redis_config::RedisConfig;
