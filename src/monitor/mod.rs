//! Stale crawl monitor
//!
//! A periodic sweep over persisted crawl rows, independent of any live
//! orchestrator. Crawls whose heartbeat has gone quiet past the running
//! timeout, or that never left the pending state within the queued
//! timeout, are transitioned to failed with a diagnostic message. The
//! sweep is idempotent: terminal crawls are never touched, so running it
//! twice (or concurrently) produces the same final state.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::MonitorConfig;
use crate::storage::{CrawlStatus, Storage};
use crate::Result;

/// Timeouts that define staleness
#[derive(Debug, Clone, Copy)]
pub struct StalePolicy {
    /// Maximum quiet time for a running crawl
    pub running_timeout: Duration,
    /// Maximum age for a crawl still pending
    pub queued_timeout: Duration,
}

impl StalePolicy {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            running_timeout: Duration::minutes(config.running_timeout_minutes),
            queued_timeout: Duration::minutes(config.queued_timeout_minutes),
        }
    }
}

/// Runs one sweep, returning the number of crawls failed
pub fn sweep<S: Storage>(storage: &Arc<Mutex<S>>, policy: &StalePolicy) -> Result<usize> {
    let stale = {
        let guard = lock(storage);
        guard.get_stale_crawls(policy.running_timeout, policy.queued_timeout)?
    };

    let mut reaped = 0;
    for crawl in stale {
        let reason = match crawl.status {
            CrawlStatus::Running => format!(
                "crawl stalled: no heartbeat for over {} minutes",
                policy.running_timeout.num_minutes()
            ),
            _ => format!(
                "crawl never started within {} minutes of creation",
                policy.queued_timeout.num_minutes()
            ),
        };

        // The guarded update makes a lost race (orchestrator finishing
        // between query and update) a no-op.
        let transitioned =
            lock(storage).update_crawl_status(crawl.id, CrawlStatus::Failed, Some(&reason))?;
        if transitioned {
            warn!(crawl_id = crawl.id, %reason, "reaped stale crawl");
            reaped += 1;
        }
    }

    Ok(reaped)
}

/// Runs the sweep on a fixed interval until shutdown is signalled
pub async fn run_monitor<S: Storage>(
    storage: Arc<Mutex<S>>,
    config: MonitorConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let policy = StalePolicy::from_config(&config);
    let mut interval =
        tokio::time::interval(StdDuration::from_secs(config.sweep_interval_minutes * 60));

    info!(
        interval_minutes = config.sweep_interval_minutes,
        "stale crawl monitor started"
    );
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match sweep(&storage, &policy) {
                    Ok(0) => {}
                    Ok(reaped) => info!(reaped, "stale sweep reaped crawls"),
                    Err(e) => error!(error = %e, "stale sweep failed"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("stale crawl monitor stopping");
                    return;
                }
            }
        }
    }
}

fn lock<S>(storage: &Arc<Mutex<S>>) -> std::sync::MutexGuard<'_, S> {
    match storage.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
