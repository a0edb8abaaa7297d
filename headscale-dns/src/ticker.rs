//! Schedules sync passes.

use tokio::time::{Duration, Interval, MissedTickBehavior};

/// Drives the sync loop of [`RecordSync`](crate::RecordSync).
#[async_trait::async_trait]
pub trait Ticker {
    /// Wait until the next pass is due.
    ///
    /// Returns `false` once no more passes should run, which ends the loop.
    async fn tick(&mut self) -> bool;
}

/// Ticks immediately, then once every `period`, forever.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Create a ticker with the given period. The first tick completes immediately.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        // A slow pass pushes the schedule back instead of triggering a burst of catch-up passes.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { interval }
    }
}

#[async_trait::async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}
