//! Campaign dispatcher.

use std::sync::Arc;
use std::time::Duration;

use sambal_core::DomainError;
use sambal_core::domain::email::{mask_email, normalize_email};
use sambal_core::domain::{CampaignKind, CampaignMode, Recipient};
use sambal_core::ports::StepScheduler;

/// What one `schedule` call armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCampaign {
    pub campaign: CampaignKind,
    pub mode: CampaignMode,
    /// Offsets of the steps that were armed, in sequence order.
    pub armed: Vec<Duration>,
    /// Steps the scheduler refused.
    pub failed: usize,
}

/// Validates a recipient and arms every step of a campaign.
///
/// Returns once the steps are armed; it never waits for a send. There is no
/// idempotency: scheduling the same campaign twice sends every email twice.
pub struct CampaignDispatcher {
    scheduler: Arc<dyn StepScheduler>,
}

impl CampaignDispatcher {
    pub fn new(scheduler: Arc<dyn StepScheduler>) -> Self {
        Self { scheduler }
    }

    pub fn backend(&self) -> &'static str {
        self.scheduler.backend()
    }

    pub async fn schedule(
        &self,
        campaign: CampaignKind,
        mut recipient: Recipient,
        mode: CampaignMode,
    ) -> Result<ScheduledCampaign, DomainError> {
        recipient.email = normalize_email(&recipient.email);
        campaign.validate(&recipient)?;

        let recipient = Arc::new(recipient);
        let plan = campaign.plan(mode);
        let mut armed = Vec::with_capacity(plan.len());
        let mut failed = 0;

        for step in plan {
            let offset = step.offset;
            let step_number = step.context.step_number;
            match self.scheduler.arm(step, recipient.clone()).await {
                Ok(()) => armed.push(offset),
                Err(e) => {
                    failed += 1;
                    tracing::error!(
                        campaign = %campaign,
                        step = step_number,
                        error = %e,
                        "Failed to arm campaign step"
                    );
                }
            }
        }

        tracing::info!(
            campaign = %campaign,
            mode = mode.as_str(),
            backend = self.scheduler.backend(),
            to = %mask_email(&recipient.email),
            armed = armed.len(),
            failed,
            "Campaign scheduled"
        );

        Ok(ScheduledCampaign {
            campaign,
            mode,
            armed,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use sambal_core::domain::{CartItem, PlannedStep};
    use sambal_core::ports::ScheduleError;

    const HOUR: u64 = 3600;
    const DAY: u64 = 24 * HOUR;

    /// Records what it was asked to arm; refuses the step numbers in `refuse`.
    #[derive(Default)]
    struct RecordingScheduler {
        armed: Mutex<Vec<(usize, Duration, &'static str)>>,
        refuse: Vec<usize>,
    }

    #[async_trait]
    impl StepScheduler for RecordingScheduler {
        async fn arm(&self, step: PlannedStep, _recipient: Arc<Recipient>) -> Result<(), ScheduleError> {
            if self.refuse.contains(&step.context.step_number) {
                return Err(ScheduleError::Arm("refused".into()));
            }
            self.armed
                .lock()
                .push((step.context.step_number, step.offset, step.template_id));
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "recording"
        }
    }

    fn cart_recipient() -> Recipient {
        let mut recipient = Recipient::new("  Sari@Example.com ");
        recipient.cart_items = vec![CartItem {
            name: "Sambal Ijo 190g".into(),
            quantity: 2,
            unit_price: 649,
        }];
        recipient
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_secs).collect()
    }

    #[tokio::test]
    async fn abandoned_cart_offsets_per_mode() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let dispatcher = CampaignDispatcher::new(scheduler.clone());

        let production = dispatcher
            .schedule(CampaignKind::AbandonedCart, cart_recipient(), CampaignMode::Production)
            .await
            .unwrap();
        assert_eq!(production.armed, secs(&[HOUR, 24 * HOUR, 72 * HOUR]));

        let quick = dispatcher
            .schedule(CampaignKind::AbandonedCart, cart_recipient(), CampaignMode::QuickTest)
            .await
            .unwrap();
        assert_eq!(quick.armed, secs(&[10, 20, 30]));
        assert_eq!(scheduler.armed.lock().len(), 6);
    }

    #[tokio::test]
    async fn every_campaign_arms_its_full_sequence() {
        let dispatcher = CampaignDispatcher::new(Arc::new(RecordingScheduler::default()));
        let mut recipient = cart_recipient();
        recipient.order_number = Some("SB-1001".into());

        let expected = [
            (CampaignKind::AbandonedCart, 3),
            (CampaignKind::ReviewRequest, 2),
            (CampaignKind::WelcomeSeries, 5),
            (CampaignKind::EducationalDrip, 12),
        ];
        for (campaign, steps) in expected {
            let scheduled = dispatcher
                .schedule(campaign, recipient.clone(), CampaignMode::Production)
                .await
                .unwrap();
            assert_eq!(scheduled.armed.len(), steps, "{campaign}");
        }

        let review = dispatcher
            .schedule(CampaignKind::ReviewRequest, recipient.clone(), CampaignMode::Production)
            .await
            .unwrap();
        assert_eq!(review.armed, secs(&[3 * DAY, 7 * DAY]));

        let drip = dispatcher
            .schedule(CampaignKind::EducationalDrip, recipient, CampaignMode::QuickTest)
            .await
            .unwrap();
        assert_eq!(drip.armed.last(), Some(&Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn invalid_recipient_arms_nothing() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let dispatcher = CampaignDispatcher::new(scheduler.clone());

        let err = dispatcher
            .schedule(
                CampaignKind::AbandonedCart,
                Recipient::new("sari@example.com"),
                CampaignMode::Production,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = dispatcher
            .schedule(
                CampaignKind::ReviewRequest,
                Recipient::new("not-an-email"),
                CampaignMode::Production,
            )
            .await
            .unwrap_err();
        match err {
            DomainError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(scheduler.armed.lock().is_empty());
    }

    #[tokio::test]
    async fn refused_step_does_not_stop_the_rest() {
        let scheduler = Arc::new(RecordingScheduler {
            refuse: vec![1],
            ..RecordingScheduler::default()
        });
        let dispatcher = CampaignDispatcher::new(scheduler.clone());

        let scheduled = dispatcher
            .schedule(CampaignKind::AbandonedCart, cart_recipient(), CampaignMode::Production)
            .await
            .unwrap();

        assert_eq!(scheduled.failed, 1);
        assert_eq!(scheduled.armed, secs(&[24 * HOUR, 72 * HOUR]));
        let armed: Vec<usize> = scheduler.armed.lock().iter().map(|(n, _, _)| *n).collect();
        assert_eq!(armed, vec![2, 3]);
    }
}
