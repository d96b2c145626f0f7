//! Application state - shared across all handlers.

use std::io;
use std::sync::Arc;

use sambal_core::ports::{
    EmailSender, PriceProvider, RateLimiter, StepScheduler, SubmissionRepository, TaskQueue,
};
use sambal_infra::{
    CampaignBackend, CampaignDispatcher, DatabaseConfig, InMemoryRateLimiter,
    InMemorySubmissionRepository, InMemoryTaskQueue, QueuedStepScheduler, TimerStepScheduler,
    build_mailer, build_price_provider, campaign_task_handler,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<dyn RateLimiter>,
    /// The in-process limiter, swept by the background job. `None` when limits live in Redis.
    pub local_limiter: Option<Arc<InMemoryRateLimiter>>,
    pub mailer: Arc<dyn EmailSender>,
    pub campaigns: Arc<CampaignDispatcher>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub prices: Arc<dyn PriceProvider>,
    /// Inbox told about new contact messages.
    pub notify_address: Option<String>,
    pub campaign_test_endpoints: bool,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> io::Result<Self> {
        let mailer = build_mailer(&config.mail);

        let (limiter, local_limiter): (Arc<dyn RateLimiter>, _) = match shared_limiter().await? {
            Some(limiter) => (limiter, None),
            None => {
                let local = Arc::new(InMemoryRateLimiter::new());
                let limiter: Arc<dyn RateLimiter> = local.clone();
                (limiter, Some(local))
            }
        };

        let scheduler: Arc<dyn StepScheduler> = match config.campaign_backend {
            CampaignBackend::Timer => Arc::new(TimerStepScheduler::new(mailer.clone())),
            CampaignBackend::Queue => {
                let queue = task_queue().await?;
                queue
                    .start_worker(campaign_task_handler(mailer.clone()))
                    .await
                    .map_err(io::Error::other)?;
                Arc::new(QueuedStepScheduler::new(queue))
            }
        };

        let submissions = submission_store(config.database.as_ref()).await;
        let prices = build_price_provider(&config.pricing);

        tracing::info!(
            campaign_backend = scheduler.backend(),
            shared_rate_limits = local_limiter.is_none(),
            test_endpoints = config.campaign_test_endpoints,
            "Application state initialized"
        );

        Ok(Self {
            limiter,
            local_limiter,
            mailer,
            campaigns: Arc::new(CampaignDispatcher::new(scheduler)),
            submissions,
            prices,
            notify_address: config.mail.notify_address.clone(),
            campaign_test_endpoints: config.campaign_test_endpoints,
        })
    }

    /// Everything in process around the given mailer.
    #[cfg(test)]
    pub fn in_memory(mailer: Arc<dyn EmailSender>) -> Self {
        use sambal_infra::pricing::UnconfiguredPrices;

        let local = Arc::new(InMemoryRateLimiter::new());
        Self {
            limiter: local.clone(),
            local_limiter: Some(local),
            mailer: mailer.clone(),
            campaigns: Arc::new(CampaignDispatcher::new(Arc::new(TimerStepScheduler::new(
                mailer,
            )))),
            submissions: Arc::new(InMemorySubmissionRepository::new()),
            prices: Arc::new(UnconfiguredPrices),
            notify_address: None,
            campaign_test_endpoints: false,
        }
    }
}

fn redis_configured() -> bool {
    std::env::var("REDIS_URL").is_ok_and(|url| !url.trim().is_empty())
}

#[cfg(feature = "redis")]
async fn shared_limiter() -> io::Result<Option<Arc<dyn RateLimiter>>> {
    use sambal_infra::{RedisRateLimitConfig, RedisRateLimiter};

    if !redis_configured() {
        return Ok(None);
    }

    let config = RedisRateLimitConfig::from_env();
    let fallback = config.redis.fallback_to_memory;
    match RedisRateLimiter::new(config).await {
        Ok(limiter) => Ok(Some(Arc::new(limiter))),
        Err(e) if fallback => {
            tracing::error!(error = %e, "Redis rate limiter unavailable, limiting in process");
            Ok(None)
        }
        Err(e) => Err(io::Error::other(format!("Redis rate limiter: {}", e))),
    }
}

#[cfg(not(feature = "redis"))]
async fn shared_limiter() -> io::Result<Option<Arc<dyn RateLimiter>>> {
    if redis_configured() {
        tracing::warn!("REDIS_URL is set but the redis feature is disabled");
    }
    Ok(None)
}

#[cfg(feature = "redis")]
async fn task_queue() -> io::Result<Arc<dyn TaskQueue>> {
    use sambal_infra::{RedisTaskQueue, RedisTaskQueueConfig};

    if !redis_configured() {
        tracing::warn!("CAMPAIGN_BACKEND=queue without REDIS_URL. Queued steps are lost on restart.");
        return Ok(Arc::new(InMemoryTaskQueue::from_env()));
    }

    let config = RedisTaskQueueConfig::from_env();
    let fallback = config.redis.fallback_to_memory;
    match RedisTaskQueue::new(config).await {
        Ok(queue) => Ok(Arc::new(queue)),
        Err(e) if fallback => {
            tracing::error!(error = %e, "Redis task queue unavailable, queueing in process");
            Ok(Arc::new(InMemoryTaskQueue::from_env()))
        }
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(feature = "redis"))]
async fn task_queue() -> io::Result<Arc<dyn TaskQueue>> {
    tracing::warn!("Redis feature disabled. Queued steps are lost on restart.");
    Ok(Arc::new(InMemoryTaskQueue::from_env()))
}

#[cfg(feature = "postgres")]
async fn submission_store(config: Option<&DatabaseConfig>) -> Arc<dyn SubmissionRepository> {
    use sambal_infra::PostgresSubmissionRepository;
    use sambal_infra::database::connect;

    let Some(config) = config else {
        tracing::warn!("DATABASE_URL not set. Submissions are kept in memory.");
        return Arc::new(InMemorySubmissionRepository::new());
    };

    match connect(config).await {
        Ok(db) => Arc::new(PostgresSubmissionRepository::new(db)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
            Arc::new(InMemorySubmissionRepository::new())
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn submission_store(config: Option<&DatabaseConfig>) -> Arc<dyn SubmissionRepository> {
    if config.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is disabled");
    }
    Arc::new(InMemorySubmissionRepository::new())
}
