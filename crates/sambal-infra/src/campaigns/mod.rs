//! Campaign dispatch: plan a campaign's steps and arm each on a step scheduler.

mod dispatcher;
mod queued;
mod timer;

pub use dispatcher::{CampaignDispatcher, ScheduledCampaign};
pub use queued::{QueuedStepScheduler, campaign_task_handler};
pub use timer::TimerStepScheduler;

/// Which step scheduler backs the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CampaignBackend {
    /// Detached in-process timers. Lost on restart.
    #[default]
    Timer,
    /// Due-dated task records polled by a worker.
    Queue,
}

impl CampaignBackend {
    pub fn from_env() -> Self {
        match std::env::var("CAMPAIGN_BACKEND").as_deref() {
            Ok("queue") => CampaignBackend::Queue,
            Ok("timer") | Err(_) => CampaignBackend::Timer,
            Ok(other) => {
                tracing::warn!(backend = %other, "Unknown CAMPAIGN_BACKEND, using timer");
                CampaignBackend::Timer
            }
        }
    }
}
