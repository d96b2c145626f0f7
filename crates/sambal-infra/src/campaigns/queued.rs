//! Queue-backed step scheduler: each step becomes a due-dated task record.

use std::sync::Arc;

use async_trait::async_trait;

use sambal_core::domain::{PlannedStep, Recipient};
use sambal_core::ports::{
    CampaignTask, EmailSender, ScheduleError, StepScheduler, TaskHandler, TaskQueue, TaskResult,
    task_handler,
};

/// Enqueues each step with its payload rendered up front.
pub struct QueuedStepScheduler {
    queue: Arc<dyn TaskQueue>,
}

impl QueuedStepScheduler {
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl StepScheduler for QueuedStepScheduler {
    async fn arm(&self, step: PlannedStep, recipient: Arc<Recipient>) -> Result<(), ScheduleError> {
        let task = CampaignTask::from_step(&step, &recipient);
        self.queue
            .enqueue(task)
            .await
            .map_err(|e| ScheduleError::Arm(e.to_string()))
    }

    fn backend(&self) -> &'static str {
        "queue"
    }
}

/// Worker handler that sends a due task's email. One attempt per task.
pub fn campaign_task_handler(mailer: Arc<dyn EmailSender>) -> TaskHandler {
    task_handler(move |task: CampaignTask| {
        let mailer = mailer.clone();
        async move {
            match mailer
                .send_templated(&task.template_id, &task.recipient, &task.payload)
                .await
            {
                Ok(receipt) => {
                    tracing::info!(
                        task_id = %task.id,
                        campaign = %task.campaign,
                        step = task.step_number,
                        message_id = ?receipt.message_id,
                        "Campaign step sent"
                    );
                    TaskResult::Sent
                }
                Err(e) => TaskResult::Failed(e.to_string()),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaigns::CampaignDispatcher;
    use crate::queue::{InMemoryTaskQueue, InMemoryTaskQueueConfig};
    use crate::test_support::RecordingMailer;
    use sambal_core::domain::{CampaignKind, CampaignMode};
    use std::time::Duration;

    fn queue(max_size: usize) -> Arc<InMemoryTaskQueue> {
        Arc::new(InMemoryTaskQueue::new(InMemoryTaskQueueConfig {
            max_size,
            poll_interval: Duration::from_millis(10),
        }))
    }

    #[tokio::test]
    async fn welcome_email_is_sent_and_the_rest_wait_in_the_queue() {
        let mailer = Arc::new(RecordingMailer::default());
        let queue = queue(0);
        queue
            .start_worker(campaign_task_handler(mailer.clone()))
            .await
            .unwrap();
        let dispatcher = CampaignDispatcher::new(Arc::new(QueuedStepScheduler::new(queue.clone())));

        let scheduled = dispatcher
            .schedule(
                CampaignKind::WelcomeSeries,
                Recipient::new("ayu@example.com").with_name("Ayu"),
                CampaignMode::Production,
            )
            .await
            .unwrap();
        assert_eq!(scheduled.armed.len(), 5);
        assert_eq!(dispatcher.backend(), "queue");

        tokio::time::sleep(Duration::from_millis(200)).await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].template_id, "welcome-hello");
        assert_eq!(sent[0].payload["firstName"], "Ayu");
        assert_eq!(queue.stats().await.unwrap().pending, 4);
    }

    #[tokio::test]
    async fn failed_send_is_recorded_on_the_queue() {
        let mailer = Arc::new(RecordingMailer::failing_on(&["welcome-hello"]));
        let queue = queue(0);
        queue
            .start_worker(campaign_task_handler(mailer.clone()))
            .await
            .unwrap();
        let dispatcher = CampaignDispatcher::new(Arc::new(QueuedStepScheduler::new(queue.clone())));

        dispatcher
            .schedule(
                CampaignKind::WelcomeSeries,
                Recipient::new("ayu@example.com"),
                CampaignMode::Production,
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(queue.stats().await.unwrap().failed, 1);
    }

    #[tokio::test]
    async fn full_queue_fails_only_the_overflowing_steps() {
        let dispatcher = CampaignDispatcher::new(Arc::new(QueuedStepScheduler::new(queue(2))));

        let scheduled = dispatcher
            .schedule(
                CampaignKind::WelcomeSeries,
                Recipient::new("ayu@example.com"),
                CampaignMode::Production,
            )
            .await
            .unwrap();

        assert_eq!(scheduled.armed.len(), 2);
        assert_eq!(scheduled.failed, 3);
    }
}
