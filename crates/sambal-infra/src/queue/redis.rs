//! Redis task queue using a sorted set scored by due time.
//!
//! Tasks survive a restart of the process. A worker claims a due task by
//! removing it from the set, so with several instances polling the same queue
//! each task is handled once.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;

use sambal_core::ports::{CampaignTask, QueueStats, TaskHandler, TaskQueue, TaskQueueError};

use super::{TaskStats, dispatch};
use crate::redis_config::RedisConfig;

/// Redis task queue configuration.
#[derive(Debug, Clone)]
pub struct RedisTaskQueueConfig {
    /// Redis connection config
    pub redis: RedisConfig,
    /// Sorted-set key
    pub queue_name: String,
    /// How often the worker looks for due tasks
    pub poll_interval: Duration,
    /// Maximum tasks claimed per poll
    pub batch_size: isize,
}

impl Default for RedisTaskQueueConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            queue_name: "campaign_tasks".to_string(),
            poll_interval: Duration::from_secs(1),
            batch_size: 50,
        }
    }
}

impl RedisTaskQueueConfig {
    pub fn from_env() -> Self {
        Self {
            redis: RedisConfig::from_env(),
            queue_name: std::env::var("TASK_QUEUE_NAME")
                .unwrap_or_else(|_| "campaign_tasks".to_string()),
            poll_interval: Duration::from_millis(
                std::env::var("TASK_QUEUE_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            batch_size: 50,
        }
    }
}

/// Redis-backed delayed task queue.
pub struct RedisTaskQueue {
    conn: ConnectionManager,
    config: RedisTaskQueueConfig,
    stats: Arc<TaskStats>,
    running: Arc<RwLock<bool>>,
}

impl RedisTaskQueue {
    pub async fn new(config: RedisTaskQueueConfig) -> Result<Self, TaskQueueError> {
        let conn = config
            .redis
            .connect()
            .await
            .map_err(TaskQueueError::Backend)?;

        tracing::info!(
            url = %config.redis.url,
            queue = %config.queue_name,
            "Connected to Redis task queue"
        );

        Ok(Self {
            conn,
            config,
            stats: Arc::new(TaskStats::default()),
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, TaskQueueError> {
        Self::new(RedisTaskQueueConfig::from_env()).await
    }

    /// Ask the worker loop to exit after its current poll.
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}

/// Claim up to `batch` due members. A member removed by another worker first
/// is skipped.
async fn claim_due(
    conn: &mut ConnectionManager,
    key: &str,
    batch: isize,
) -> redis::RedisResult<Vec<String>> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let due: Vec<String> = conn
        .zrangebyscore_limit(key, "-inf", now_ms, 0, batch)
        .await?;

    let mut claimed = Vec::with_capacity(due.len());
    for member in due {
        let removed: i64 = conn.zrem(key, &member).await?;
        if removed == 1 {
            claimed.push(member);
        }
    }
    Ok(claimed)
}

#[async_trait]
impl TaskQueue for RedisTaskQueue {
    async fn enqueue(&self, task: CampaignTask) -> Result<(), TaskQueueError> {
        let mut conn = self.conn.clone();
        let task_json =
            serde_json::to_string(&task).map_err(|e| TaskQueueError::Enqueue(e.to_string()))?;

        conn.zadd::<_, _, _, ()>(
            &self.config.queue_name,
            &task_json,
            task.due_at.timestamp_millis(),
        )
        .await
        .map_err(|e| TaskQueueError::Backend(e.to_string()))?;

        tracing::debug!(
            task_id = %task.id,
            campaign = %task.campaign,
            step = task.step_number,
            due_at = %task.due_at,
            "Task enqueued"
        );

        Ok(())
    }

    async fn start_worker(&self, handler: TaskHandler) -> Result<(), TaskQueueError> {
        *self.running.write().await = true;

        let mut conn = self.conn.clone();
        let key = self.config.queue_name.clone();
        let batch = self.config.batch_size;
        let poll_interval = self.config.poll_interval;
        let stats = self.stats.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            tracing::info!(queue = %key, "Task queue worker started");
            let mut ticker = tokio::time::interval(poll_interval);

            loop {
                ticker.tick().await;
                if !*running.read().await {
                    tracing::info!(queue = %key, "Task queue worker stopping");
                    break;
                }

                let claimed = match claim_due(&mut conn, &key, batch).await {
                    Ok(claimed) => claimed,
                    Err(e) => {
                        tracing::error!(error = %e, "Redis task poll failed");
                        continue;
                    }
                };

                for task_json in claimed {
                    match serde_json::from_str::<CampaignTask>(&task_json) {
                        Ok(task) => dispatch(&handler, task, &stats),
                        Err(e) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(error = %e, "Failed to deserialize task");
                        }
                    }
                }
            }
        });

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, TaskQueueError> {
        let mut conn = self.conn.clone();
        let pending: usize = conn
            .zcard(&self.config.queue_name)
            .await
            .map_err(|e| TaskQueueError::Backend(e.to_string()))?;

        Ok(QueueStats {
            pending,
            processing: self.stats.processing.load(Ordering::Relaxed),
            sent: self.stats.sent.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        })
    }
}
