//! Cron runner for the rate-limit sweep, over tokio-cron-scheduler.
//!
//! Only compiled with the `scheduler` feature; without it the sweep runs on a
//! plain tokio interval.

use std::future::Future;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub struct Scheduler {
    jobs: JobScheduler,
}

impl Scheduler {
    pub async fn new() -> Result<Self, JobSchedulerError> {
        Ok(Self {
            jobs: JobScheduler::new().await?,
        })
    }

    /// Run `task` on a six-field cron expression (seconds first), e.g. the
    /// five-minute limiter sweep `0 */5 * * * *`.
    pub async fn add_cron<F, Fut>(&self, schedule: &str, task: F) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_id, _scheduler| {
            let task = task.clone();
            Box::pin(async move { task().await })
        })?;

        let id = self.jobs.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Sweep job registered");
        Ok(id)
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        self.jobs.start().await?;
        tracing::info!("Background sweep running");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.jobs.shutdown().await?;
        tracing::info!("Background sweep stopped");
        Ok(())
    }
}
