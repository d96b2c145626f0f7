//! Background jobs: periodic cleanup of the in-process rate limiter.

#[cfg(feature = "scheduler")]
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use sambal_infra::InMemoryRateLimiter;

#[cfg(feature = "scheduler")]
use scheduler::Scheduler;

/// Every five minutes, on the minute.
#[cfg(feature = "scheduler")]
const SWEEP_CRON: &str = "0 */5 * * * *";
#[cfg(not(feature = "scheduler"))]
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: crate::config::flag("SCHEDULER_ENABLED", true),
        }
    }
}

/// Handles to running jobs. Dropping it leaves the jobs running.
#[derive(Default)]
pub struct BackgroundJobs {
    #[cfg(feature = "scheduler")]
    scheduler: Option<Scheduler>,
    #[cfg(not(feature = "scheduler"))]
    sweeper: Option<tokio::task::JoinHandle<()>>,
}

#[cfg(feature = "scheduler")]
impl BackgroundJobs {
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    pub async fn shutdown(self) {
        if let Some(mut scheduler) = self.scheduler {
            if let Err(e) = scheduler.shutdown().await {
                tracing::warn!(error = %e, "Scheduler did not stop cleanly");
            }
        }
    }
}

#[cfg(not(feature = "scheduler"))]
impl BackgroundJobs {
    pub fn is_running(&self) -> bool {
        self.sweeper.is_some()
    }

    pub async fn shutdown(self) {
        if let Some(sweeper) = self.sweeper {
            sweeper.abort();
        }
    }
}

/// Drop expired limiter windows.
fn sweep(limiter: &InMemoryRateLimiter) {
    let removed = limiter.sweep_expired();
    if removed > 0 {
        tracing::info!(removed, "Expired rate limit windows swept");
    }
}

/// Start the sweep when limits are kept in process. Redis expires its own keys.
pub async fn start(
    config: &SchedulerConfig,
    limiter: Option<Arc<InMemoryRateLimiter>>,
) -> std::io::Result<BackgroundJobs> {
    let Some(limiter) = limiter else {
        return Ok(BackgroundJobs::default());
    };
    if !config.enabled {
        tracing::info!("Background jobs disabled");
        return Ok(BackgroundJobs::default());
    }

    run_sweep(limiter).await
}

#[cfg(feature = "scheduler")]
async fn run_sweep(limiter: Arc<InMemoryRateLimiter>) -> std::io::Result<BackgroundJobs> {
    let scheduler = Scheduler::new().await.map_err(std::io::Error::other)?;
    scheduler
        .add_cron(SWEEP_CRON, move || {
            let limiter = limiter.clone();
            async move { sweep(&limiter) }
        })
        .await
        .map_err(std::io::Error::other)?;
    scheduler.start().await.map_err(std::io::Error::other)?;

    Ok(BackgroundJobs {
        scheduler: Some(scheduler),
    })
}

#[cfg(not(feature = "scheduler"))]
async fn run_sweep(limiter: Arc<InMemoryRateLimiter>) -> std::io::Result<BackgroundJobs> {
    Ok(BackgroundJobs {
        sweeper: Some(spawn_sweeper(limiter, SWEEP_INTERVAL)),
    })
}

/// Interval loop used when the cron scheduler is compiled out.
#[cfg_attr(feature = "scheduler", allow(dead_code))]
fn spawn_sweeper(
    limiter: Arc<InMemoryRateLimiter>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep(&limiter);
        }
    })
}
