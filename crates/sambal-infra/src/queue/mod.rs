//! Delayed task queue implementations for campaign steps.

mod memory;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sambal_core::ports::{CampaignTask, TaskHandler, TaskResult};

pub use memory::{InMemoryTaskQueue, InMemoryTaskQueueConfig};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisTaskQueue, RedisTaskQueueConfig};

#[derive(Debug, Default)]
struct TaskStats {
    processing: AtomicUsize,
    sent: AtomicUsize,
    failed: AtomicUsize,
}

/// Hand one claimed task to the handler on its own tokio task.
fn dispatch(handler: &TaskHandler, task: CampaignTask, stats: &Arc<TaskStats>) {
    let handler = handler.clone();
    let stats = stats.clone();
    stats.processing.fetch_add(1, Ordering::Relaxed);

    tokio::spawn(async move {
        let task_id = task.id.clone();
        let campaign = task.campaign;
        let step = task.step_number;

        tracing::debug!(task_id = %task_id, campaign = %campaign, step, "Processing campaign task");

        let result = handler(task).await;
        stats.processing.fetch_sub(1, Ordering::Relaxed);

        match result {
            TaskResult::Sent => {
                stats.sent.fetch_add(1, Ordering::Relaxed);
            }
            TaskResult::Failed(reason) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(task_id = %task_id, campaign = %campaign, step, reason = %reason, "Campaign task failed");
            }
        }
    });
}
