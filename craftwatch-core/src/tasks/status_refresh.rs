// File: src/tasks/status_refresh.rs
//
// Drives the probe→aggregate→render→publish cycle. One serialized loop:
// cycles never overlap, and a force signal only cancels the wait between
// cycles, never an in-flight probe. The interval restarts from every run,
// forced or scheduled.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info};

use crate::models::EndpointSpec;
use crate::probe::probe;
use crate::services::render::render;
use crate::services::status_publisher::StatusPublisher;
use crate::services::summary::summarize;

/// Scheduler state readable from outside the loop (command handlers).
pub struct RefreshScheduler {
    interval: Duration,
    next_due_epoch: AtomicI64,
    running: AtomicBool,
    force_tx: mpsc::Sender<()>,
    /// Taken by the refresh task on startup.
    force_rx: Mutex<Option<mpsc::Receiver<()>>>,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        // Capacity 1: a pending force request already guarantees a run.
        let (force_tx, force_rx) = mpsc::channel(1);
        Self {
            interval,
            next_due_epoch: AtomicI64::new(0),
            running: AtomicBool::new(false),
            force_tx,
            force_rx: Mutex::new(Some(force_rx)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Requests an immediate refresh cycle. If one is in flight, the forced
    /// run happens right after it finishes.
    pub fn force(&self) {
        let _ = self.force_tx.try_send(());
    }

    pub fn next_due_epoch(&self) -> i64 {
        self.next_due_epoch.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Seconds until the next scheduled run, clamped at zero.
    pub fn seconds_until_next(&self) -> i64 {
        (self.next_due_epoch() - Utc::now().timestamp()).max(0)
    }
}

/// Probes every registry endpoint concurrently, merges the results, and
/// pushes the rendered payload to all destinations.
pub async fn run_refresh_cycle(
    registry: &[EndpointSpec],
    publisher: &StatusPublisher,
    next_due_epoch: i64,
) {
    let results = join_all(registry.iter().map(probe)).await;
    let summary = summarize(results, registry, next_due_epoch);
    let payload = render(&summary);
    publisher.publish(&payload).await;
}

/// Spawns the periodic refresh loop. The first cycle runs immediately;
/// callers should wait for session readiness before spawning.
pub fn spawn_status_refresh_task(
    scheduler: Arc<RefreshScheduler>,
    registry: Vec<EndpointSpec>,
    publisher: Arc<StatusPublisher>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut force_rx = match scheduler.force_rx.lock().await.take() {
            Some(rx) => rx,
            None => {
                error!("status refresh task spawned twice for one scheduler");
                return;
            }
        };

        let interval = scheduler.interval;
        info!("status refresh task started (every {:?})", interval);

        loop {
            // Record the due time before probing so the displayed countdown
            // reflects the cycle that just started.
            let cycle_started = Instant::now();
            scheduler
                .next_due_epoch
                .store(Utc::now().timestamp() + interval.as_secs() as i64, Ordering::Relaxed);
            scheduler.running.store(true, Ordering::Relaxed);

            run_refresh_cycle(&registry, &publisher, scheduler.next_due_epoch()).await;

            scheduler.running.store(false, Ordering::Relaxed);

            // Next firing is `interval` after this run started, scheduled
            // or forced alike. A queued force request fires straight away.
            tokio::select! {
                _ = sleep_until(cycle_started + interval) => {}
                Some(_) = force_rx.recv() => {
                    info!("forced status refresh requested");
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("status refresh task stopped");
    })
}
