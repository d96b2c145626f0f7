//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod mail;
mod pricing;
mod rate_limit;
mod repository;
mod scheduler;
mod task_queue;

pub use mail::{EmailSender, MailError, SendReceipt};
pub use pricing::{PriceProvider, PricingError};
pub use rate_limit::RateLimiter;
pub use repository::SubmissionRepository;
pub use scheduler::{ScheduleError, StepScheduler};
pub use task_queue::{
    CampaignTask, QueueStats, TaskHandler, TaskQueue, TaskQueueError, TaskResult, TaskStatus,
    task_handler,
};
