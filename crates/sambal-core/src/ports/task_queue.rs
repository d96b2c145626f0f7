//! Delayed task queue port - campaign steps as due-dated task records.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CampaignKind, PlannedStep, Recipient};

/// Lifecycle of a queued campaign step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

/// A campaign step waiting for its due time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignTask {
    pub id: String,
    pub campaign: CampaignKind,
    pub step_number: usize,
    pub template_id: String,
    pub recipient: String,
    /// Rendered at enqueue time so the record is self-contained.
    pub payload: serde_json::Value,
    pub due_at: DateTime<Utc>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl CampaignTask {
    pub fn from_step(step: &PlannedStep, recipient: &Recipient) -> Self {
        let now = Utc::now();
        let offset = chrono::Duration::from_std(step.offset).unwrap_or(chrono::Duration::MAX);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            campaign: step.campaign,
            step_number: step.context.step_number,
            template_id: step.template_id.to_string(),
            recipient: recipient.email.clone(),
            payload: step.payload(recipient),
            due_at: now.checked_add_signed(offset).unwrap_or(DateTime::<Utc>::MAX_UTC),
            status: TaskStatus::Pending,
            created_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}

/// Outcome of handling one task. There is no retry: a step gets one send attempt.
#[derive(Debug)]
pub enum TaskResult {
    Sent,
    Failed(String),
}

/// Task handler function type.
pub type TaskHandler =
    Arc<dyn Fn(CampaignTask) -> Pin<Box<dyn Future<Output = TaskResult> + Send>> + Send + Sync>;

/// Wrap an async closure as a [`TaskHandler`].
pub fn task_handler<F, Fut>(handler: F) -> TaskHandler
where
    F: Fn(CampaignTask) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    Arc::new(
        move |task| -> Pin<Box<dyn Future<Output = TaskResult> + Send>> {
            Box::pin(handler(task))
        },
    )
}

/// Task queue trait - abstraction over queue backends.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Store a task until it is due.
    async fn enqueue(&self, task: CampaignTask) -> Result<(), TaskQueueError>;

    /// Start polling for due tasks and hand each one to `handler`.
    async fn start_worker(&self, handler: TaskHandler) -> Result<(), TaskQueueError>;

    /// Get queue statistics.
    async fn stats(&self) -> Result<QueueStats, TaskQueueError>;
}

/// Queue statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Task queue errors.
#[derive(Debug, thiserror::Error)]
pub enum TaskQueueError {
    #[error("Failed to enqueue task: {0}")]
    Enqueue(String),

    #[error("Queue is full")]
    QueueFull,

    #[error("Backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CampaignMode;

    #[test]
    fn task_due_time_follows_step_offset() {
        let plan = CampaignKind::AbandonedCart.plan(CampaignMode::Production);
        let mut recipient = Recipient::new("sari@example.com");
        recipient.cart_items = vec![crate::domain::CartItem {
            name: "Sambal Ijo".into(),
            quantity: 1,
            unit_price: 649,
        }];

        let task = CampaignTask::from_step(&plan[1], &recipient);

        assert_eq!(task.step_number, 2);
        assert_eq!(task.template_id, "abandoned-cart-followup");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!((task.due_at - task.created_at).num_hours(), 24);
        assert!(!task.is_due(Utc::now()));
        assert!(task.is_due(Utc::now() + chrono::Duration::hours(25)));
        assert_eq!(task.payload["cartTotal"], "£6.49");
    }
}
