//! Fixed-interval tick scheduler for Gambit.
//!
//! Drives the relay's periodic sweep: once per interval the sweep
//! re-broadcasts every live session, so elapsed-time displays keep moving
//! and a missed push heals itself on the next tick.
//!
//! # Integration
//!
//! The scheduler sits inside a `tokio::select!` loop next to a stop signal:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = stop.changed() => break,
//!         info = scheduler.wait_for_tick() => {
//!             broadcast_all().await;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! All timing uses `tokio::time`, so tests can pause and advance the
//! clock.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick fires late (the previous one ran long, or the
/// runtime was starved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Keep the original cadence; late ticks fire back to back until the
    /// schedule catches up.
    Drop,
}

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Default: one second.
    pub interval: Duration,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Fraction of the interval (0.0–1.0) a tick's work may take before a
    /// warning is logged. Default: 0.80.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
        }
    }
}

impl TickConfig {
    /// Shortest interval accepted; anything below is raised to this.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// A config for a specific interval with the other defaults.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called by [`TickScheduler::new`]. The interval is raised to
    /// [`Self::MIN_INTERVAL`] and the threshold clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_secs_f64() * 1000.0,
                "tick interval below minimum, raising to 1ms"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by
/// [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number, starting at 1.
    pub tick: u64,
    /// `true` if this tick fired more than a tenth of an interval late.
    pub overrun: bool,
    /// Whole intervals skipped because of the overrun (always 0 under
    /// [`TickPolicy::Drop`]).
    pub ticks_skipped: u64,
}

/// Running counters, updated on every tick. The sweep logs them when it
/// stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickStats {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Longest work time reported through
    /// [`TickScheduler::record_tick_end`].
    pub max_tick_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fires at a fixed interval.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    next_tick: Instant,
    /// When the current tick's work started. Set by `wait_for_tick`,
    /// consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    stats: TickStats,
}

impl TickScheduler {
    /// Creates a scheduler whose first tick is one interval from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let next_tick = Instant::now() + config.interval;

        debug!(
            interval_ms = config.interval.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            config,
            tick_count: 0,
            next_tick,
            tick_start: None,
            stats: TickStats::default(),
        }
    }

    /// A scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(TickConfig::with_interval(interval))
    }

    /// Waits until the next tick is due.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// schedule untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let due = self.next_tick;
        let interval = self.config.interval;

        time::sleep_until(due).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.tick_start = Some(now);

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > interval / 10;
        let mut ticks_skipped = 0u64;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped =
                        (late_by.as_nanos() / interval.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "tick overrun, skipping ahead"
                        );
                    }
                }
                now + interval
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, keeping original cadence"
                    );
                }
                due + interval
            }
        };

        self.stats.total_ticks += 1;
        self.stats.total_skipped += ticks_skipped;
        if overrun {
            self.stats.total_overruns += 1;
        }

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Records that the work for the current tick is done.
    ///
    /// Logs a warning when the work used more than the configured share of
    /// the interval. A no-op without a preceding tick.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        if elapsed > self.stats.max_tick_time {
            self.stats.max_tick_time = elapsed;
        }

        let utilization =
            elapsed.as_secs_f64() / self.config.interval.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                interval_ms = self.config.interval.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick work approaching interval"
            );
        }
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }
}
