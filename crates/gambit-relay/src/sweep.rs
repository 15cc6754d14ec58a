//! The periodic sweep: re-broadcast every session on a fixed interval.

use std::sync::Arc;

use gambit_rules::RulesEngine;
use gambit_tick::{TickConfig, TickScheduler, TickStats};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Relay;

/// Spawns the sweep task.
pub struct PeriodicSweep;

impl PeriodicSweep {
    /// Starts sweeping `relay` on the schedule in `config`.
    ///
    /// The task runs until [`SweepHandle::stop`] is called or the handle
    /// is dropped.
    pub fn spawn<E: RulesEngine>(
        relay: Arc<Relay<E>>,
        config: TickConfig,
    ) -> SweepHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run(relay, TickScheduler::new(config), stop_rx));
        SweepHandle { stop_tx, task }
    }
}

async fn run<E: RulesEngine>(
    relay: Arc<Relay<E>>,
    mut scheduler: TickScheduler,
    mut stop: watch::Receiver<bool>,
) -> TickStats {
    tracing::info!(
        interval_ms = scheduler.interval().as_millis() as u64,
        "periodic sweep started"
    );

    loop {
        tokio::select! {
            // Either an explicit stop or the handle being dropped.
            _ = stop.changed() => break,
            info = scheduler.wait_for_tick() => {
                let sessions = relay.broadcast_all().await;
                scheduler.record_tick_end();
                tracing::trace!(tick = info.tick, sessions, "sweep tick");
            }
        }
    }

    let stats = scheduler.stats().clone();
    tracing::info!(
        ticks = stats.total_ticks,
        overruns = stats.total_overruns,
        skipped = stats.total_skipped,
        max_tick_ms = stats.max_tick_time.as_secs_f64() * 1000.0,
        "periodic sweep stopped"
    );
    stats
}

/// Controls a running sweep.
pub struct SweepHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<TickStats>,
}

impl SweepHandle {
    /// Signals the sweep to stop, waits for it to finish its current
    /// tick, and returns its counters.
    pub async fn stop(self) -> TickStats {
        let _ = self.stop_tx.send(true);
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "periodic sweep task failed");
                TickStats::default()
            }
        }
    }

    /// Returns `true` once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
