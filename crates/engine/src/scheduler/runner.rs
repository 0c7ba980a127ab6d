//! The tick loop.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::core::ChaosScheduler;

impl ChaosScheduler {
    /// Tick every `interval`, forever. The first tick runs immediately.
    ///
    /// Ticks never overlap. A tick that overruns the interval is followed
    /// straight away by the ones it delayed. A failed registration read is
    /// logged and the loop waits for the next tick.
    pub async fn run_forever(mut self, interval: Duration) {
        info!(
            interval_secs = interval.as_secs(),
            "chaos scheduler started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_tick().await {
                warn!(error = %e, "failed to load bound applications, skipping tick");
            }
        }
    }
}
