//! Fixed-interval driver for the poll cycle
//!
//! A ticker task fires every interval and offers a tick to a single-slot
//! channel. One consumer runs one cycle per tick. While a cycle is running,
//! or a tick is already pending, new ticks are dropped and counted instead
//! of queued, so a slow cycle never causes a burst of catch-up cycles.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::poller::{Dispatcher, PollerState};

/// Totals for one scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerReport {
    pub cycles: u64,
    pub ticks_skipped: u64,
}

/// Drives a [`Dispatcher`] on a fixed interval
pub struct Scheduler {
    dispatcher: Dispatcher,
    interval: Duration,
    ready_retry: Duration,
}

impl Scheduler {
    pub fn new(dispatcher: Dispatcher, interval: Duration, ready_retry: Duration) -> Self {
        Self {
            dispatcher,
            interval,
            ready_retry,
        }
    }

    /// Run until `shutdown` resolves
    ///
    /// A cycle in progress is allowed to finish before returning.
    pub async fn run_until<F>(&mut self, shutdown: F) -> SchedulerReport
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut report = SchedulerReport::default();

        if !self.wait_until_ready(&mut shutdown).await {
            info!("Shutdown requested before the sink became ready");
            return report;
        }
        self.dispatcher.set_state(PollerState::Idle);

        let (tx, mut rx) = mpsc::channel::<()>(1);
        let busy = Arc::new(AtomicBool::new(false));
        let skipped = Arc::new(AtomicU64::new(0));

        let ticker = {
            let busy = Arc::clone(&busy);
            let skipped = Arc::clone(&skipped);
            let period = self.interval;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    if busy.load(Ordering::Acquire) {
                        skipped.fetch_add(1, Ordering::Relaxed);
                        metrics::record_tick_skipped();
                        info!("Previous cycle still running, tick skipped");
                        continue;
                    }
                    match tx.try_send(()) {
                        Ok(()) => debug!("Tick sent"),
                        Err(TrySendError::Full(())) => {
                            skipped.fetch_add(1, Ordering::Relaxed);
                            metrics::record_tick_skipped();
                            info!("Tick already pending, tick skipped");
                        }
                        Err(TrySendError::Closed(())) => break,
                    }
                }
            })
        };

        info!(
            interval_secs = self.interval.as_secs(),
            feed_key = %self.dispatcher.target().feed_key,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                tick = rx.recv() => {
                    if tick.is_none() {
                        break;
                    }
                    busy.store(true, Ordering::Release);
                    self.dispatcher.run_cycle().await;
                    report.cycles += 1;
                    busy.store(false, Ordering::Release);
                }
            }
        }

        ticker.abort();
        report.ticks_skipped = skipped.load(Ordering::Relaxed);
        info!(
            cycles = report.cycles,
            ticks_skipped = report.ticks_skipped,
            "Scheduler stopped"
        );
        report
    }

    /// Retry the sink readiness check; false when shutdown came first
    async fn wait_until_ready<F>(&mut self, shutdown: &mut std::pin::Pin<&mut F>) -> bool
    where
        F: Future<Output = ()>,
    {
        self.dispatcher.set_state(PollerState::WaitingForReady);
        let sink = Arc::clone(self.dispatcher.sink());

        loop {
            tokio::select! {
                _ = shutdown.as_mut() => return false,
                result = sink.ready() => match result {
                    Ok(()) => {
                        info!(sink = sink.name(), "Sink ready");
                        return true;
                    }
                    Err(e) => warn!(
                        sink = sink.name(),
                        error = %e,
                        retry_secs = self.ready_retry.as_secs(),
                        "Sink not ready, retrying"
                    ),
                }
            }

            tokio::select! {
                _ = shutdown.as_mut() => return false,
                _ = tokio::time::sleep(self.ready_retry) => {}
            }
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Give back the dispatcher, ending the scheduler
    pub fn into_dispatcher(self) -> Dispatcher {
        self.dispatcher
    }
}
