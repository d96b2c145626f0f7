//! In-process step scheduler: one detached sleeping task per step.

use std::sync::Arc;

use async_trait::async_trait;

use sambal_core::domain::email::mask_email;
use sambal_core::domain::{PlannedStep, Recipient};
use sambal_core::ports::{EmailSender, ScheduleError, StepScheduler};

use crate::tasks::spawn_detached;

/// Arms each step as a tokio task that sleeps for the step's offset, then
/// renders the payload and sends it. Nothing is persisted and nothing can be
/// cancelled; a restart drops every armed step.
pub struct TimerStepScheduler {
    mailer: Arc<dyn EmailSender>,
}

impl TimerStepScheduler {
    pub fn new(mailer: Arc<dyn EmailSender>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl StepScheduler for TimerStepScheduler {
    async fn arm(&self, step: PlannedStep, recipient: Arc<Recipient>) -> Result<(), ScheduleError> {
        let mailer = self.mailer.clone();

        spawn_detached("campaign_step", async move {
            tokio::time::sleep(step.offset).await;

            let payload = step.payload(&recipient);
            let receipt = mailer
                .send_templated(step.template_id, &recipient.email, &payload)
                .await
                .map_err(|e| {
                    format!(
                        "{} step {}/{} to {}: {}",
                        step.campaign,
                        step.context.step_number,
                        step.context.total_steps,
                        mask_email(&recipient.email),
                        e
                    )
                })?;

            tracing::info!(
                campaign = %step.campaign,
                step = step.context.step_number,
                template = %step.template_id,
                message_id = ?receipt.message_id,
                "Campaign step sent"
            );
            Ok::<(), String>(())
        });

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "timer"
    }
}
