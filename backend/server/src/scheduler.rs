//! # Scheduler
//!
//! Daily leaderboard refresh, independent of HTTP traffic.
//!
//! - One cron job, default `0 0 0 * * *` (midnight UTC, seconds field first)
//! - Start-up runs one refresh right away through the same path
//! - Runs never overlap: a trigger that finds a run in progress is dropped
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use process::generate;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                running: self.running.clone(),
            })
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Held for the length of one run.
#[derive(Debug)]
pub struct RunPermit {
    running: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// One aggregator run. Returns whether a new snapshot was written.
pub async fn refresh(state: Arc<AppState>) -> bool {
    let Some(_permit) = state.guard.try_acquire() else {
        warn!("Leaderboard update already running, skipping");
        return false;
    };

    info!("Starting leaderboard update for {}", state.config.organization);

    match generate(
        &state.github,
        &state.config.organization,
        &state.throttle,
        &state.store,
    )
    .await
    {
        Ok(snapshot) => {
            info!(
                "Leaderboard updated successfully, {} contributors",
                snapshot.leaderboard.len()
            );
            true
        }
        Err(e) => {
            error!("Leaderboard update failed: {e}");
            false
        }
    }
}

pub async fn start_scheduler(state: Arc<AppState>) -> Result<JobScheduler, AppError> {
    let scheduler = JobScheduler::new().await?;

    let job_state = state.clone();
    let job = Job::new_async(state.config.cron.as_str(), move |_id, _scheduler| {
        let state = job_state.clone();

        Box::pin(async move {
            refresh(state).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Leaderboard update scheduled at {}", state.config.cron);
    Ok(scheduler)
}
