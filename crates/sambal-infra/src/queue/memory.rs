//! In-memory delayed task queue.
//!
//! Fallback when Redis is not available. Tasks live in process memory and are
//! lost on restart, like the timer backend.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use sambal_core::ports::{
    CampaignTask, QueueStats, TaskHandler, TaskQueue, TaskQueueError,
};

use super::{TaskStats, dispatch};

/// In-memory task queue configuration.
#[derive(Debug, Clone)]
pub struct InMemoryTaskQueueConfig {
    /// Maximum number of waiting tasks (0 = unlimited).
    pub max_size: usize,
    /// How often the worker looks for due tasks.
    pub poll_interval: Duration,
}

impl Default for InMemoryTaskQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10000,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl InMemoryTaskQueueConfig {
    pub fn from_env() -> Self {
        Self {
            max_size: std::env::var("TASK_QUEUE_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10000),
            poll_interval: Duration::from_millis(
                std::env::var("TASK_QUEUE_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
        }
    }
}

/// In-memory task queue.
pub struct InMemoryTaskQueue {
    waiting: Arc<Mutex<Vec<CampaignTask>>>,
    stats: Arc<TaskStats>,
    config: InMemoryTaskQueueConfig,
}

impl InMemoryTaskQueue {
    pub fn new(config: InMemoryTaskQueueConfig) -> Self {
        Self {
            waiting: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(TaskStats::default()),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(InMemoryTaskQueueConfig::from_env())
    }
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new(InMemoryTaskQueueConfig::default())
    }
}

/// Remove and return every task due at `now`.
fn take_due(waiting: &mut Vec<CampaignTask>, now: chrono::DateTime<Utc>) -> Vec<CampaignTask> {
    let (due, later): (Vec<_>, Vec<_>) = waiting.drain(..).partition(|task| task.is_due(now));
    *waiting = later;
    due
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: CampaignTask) -> Result<(), TaskQueueError> {
        let mut waiting = self.waiting.lock().await;
        if self.config.max_size > 0 && waiting.len() >= self.config.max_size {
            return Err(TaskQueueError::QueueFull);
        }

        tracing::debug!(
            task_id = %task.id,
            campaign = %task.campaign,
            step = task.step_number,
            due_at = %task.due_at,
            "Task enqueued"
        );
        waiting.push(task);

        Ok(())
    }

    async fn start_worker(&self, handler: TaskHandler) -> Result<(), TaskQueueError> {
        let waiting = self.waiting.clone();
        let stats = self.stats.clone();
        let poll_interval = self.config.poll_interval;

        tokio::spawn(async move {
            tracing::info!(poll_ms = poll_interval.as_millis() as u64, "Task queue worker started");
            let mut ticker = tokio::time::interval(poll_interval);

            loop {
                ticker.tick().await;
                let due = take_due(&mut *waiting.lock().await, Utc::now());
                for task in due {
                    dispatch(&handler, task, &stats);
                }
            }
        });

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, TaskQueueError> {
        Ok(QueueStats {
            pending: self.waiting.lock().await.len(),
            processing: self.stats.processing.load(Ordering::Relaxed),
            sent: self.stats.sent.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        })
    }
}
