//! Campaign step scheduling port.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{PlannedStep, Recipient};

/// Arms a campaign step to fire at its offset.
///
/// Returning `Ok` means the step is armed, not that it was sent. Send failures
/// surface later, in the log, and never affect sibling steps.
#[async_trait]
pub trait StepScheduler: Send + Sync {
    async fn arm(&self, step: PlannedStep, recipient: Arc<Recipient>) -> Result<(), ScheduleError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Failed to arm step: {0}")]
    Arm(String),
}
