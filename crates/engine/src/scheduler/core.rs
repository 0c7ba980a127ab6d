//! [`ChaosScheduler`] — the per-tick orchestration routine.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use havoc_core::config::EngineConfig;
use havoc_core::BoundApp;
use havoc_platform::{is_healthy, pick_instance, PlatformError, PlatformProbe};
use havoc_store::{RegistrationStore, StoreError};

use crate::clock::{Clock, SystemClock};
use crate::eligibility::{is_due, should_inject};

use super::outcome::{FailureStage, TickReport, UnitOutcome};

/// Evaluates every bound application once per tick.
///
/// Dependencies are injected so ticks can run against in-memory stores, fake
/// platforms and manual clocks.
pub struct ChaosScheduler {
    store: Arc<dyn RegistrationStore>,
    probe: Arc<dyn PlatformProbe>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    unit_timeout: Duration,
}

impl ChaosScheduler {
    /// Scheduler on the system clock with an RNG seeded from the current time.
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        probe: Arc<dyn PlatformProbe>,
        config: &EngineConfig,
    ) -> Self {
        let seed = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros()) as u64;
        Self {
            store,
            probe,
            clock: Arc::new(SystemClock),
            rng: StdRng::seed_from_u64(seed),
            unit_timeout: config.unit_timeout(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = timeout;
        self
    }

    /// Run one tick.
    ///
    /// Fails only when the registration list cannot be read; in that case
    /// nothing was claimed or killed. Unit-level failures are folded into the
    /// returned report.
    pub async fn run_tick(&mut self) -> Result<TickReport, StoreError> {
        let units = self.store.list_bound_applications().await?;
        let mut report = TickReport::default();

        if units.is_empty() {
            debug!("chaos tick: no bound applications");
            return Ok(report);
        }

        for unit in &units {
            let outcome = self.process_unit(unit).await;
            report.record(&outcome);
        }

        info!(%report, "chaos tick complete");
        Ok(report)
    }

    /// Take one unit through eligibility → claim → roll → probe → kill.
    pub async fn process_unit(&mut self, unit: &BoundApp) -> UnitOutcome {
        let app_id = unit.app_id.as_str();
        let now = self.clock.now();

        if !is_due(unit.frequency, unit.last_processed.as_deref(), now) {
            debug!(app_id = %app_id, "skipping, not due");
            return UnitOutcome::NotDue;
        }

        info!(app_id = %app_id, "processing chaos");
        // Claim before rolling so a unit that fails downstream waits a full
        // interval instead of being retried every tick.
        if let Err(e) = self.store.mark_processed(app_id, now).await {
            warn!(app_id = %app_id, error = %e, "failed to claim unit");
            return UnitOutcome::ClaimFailed;
        }

        if !should_inject(&mut self.rng, unit.probability) {
            info!(app_id = %app_id, probability = unit.probability, "not running chaos");
            return UnitOutcome::Spared;
        }

        info!(app_id = %app_id, "running chaos");
        let states = match self.bounded(self.probe.list_instance_states(app_id)).await {
            Ok(states) => states,
            Err(error) => {
                warn!(app_id = %app_id, %error, "failed to list instances");
                return UnitOutcome::Failed {
                    stage: FailureStage::Probe,
                    error,
                };
            }
        };

        if !is_healthy(&states) {
            info!(app_id = %app_id, instances = states.len(), "app is unhealthy, skipping");
            return UnitOutcome::Unhealthy;
        }

        let index = pick_instance(&states);
        info!(app_id = %app_id, index, "killing app instance");
        if let Err(error) = self.bounded(self.probe.kill_instance(app_id, index)).await {
            warn!(app_id = %app_id, index, %error, "failed to kill instance");
            return UnitOutcome::Failed {
                stage: FailureStage::Kill,
                error,
            };
        }

        let killed_at = self.clock.now();
        if let Err(e) = self.store.mark_processed(app_id, killed_at).await {
            warn!(app_id = %app_id, error = %e, "failed to record kill time");
        }

        UnitOutcome::Killed { index }
    }

    /// Await a platform call under the per-unit timeout, flattening errors to
    /// text.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, PlatformError>>,
    ) -> Result<T, String> {
        match tokio::time::timeout(self.unit_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "{} call timed out after {}s",
                self.probe.name(),
                self.unit_timeout.as_secs()
            )),
        }
    }
}
