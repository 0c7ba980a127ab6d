//! Tests for the scheduler module.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use havoc_core::config::EngineConfig;
use havoc_core::{format_timestamp, BoundApp, ServiceBinding, ServiceInstance};
use havoc_platform::{InstanceState, InstanceStates, PlatformError, PlatformProbe};
use havoc_store::{MemoryStore, ProvisioningStore};

use crate::clock::ManualClock;
use crate::scheduler::{ChaosScheduler, FailureStage, TickReport, UnitOutcome};

#[derive(Default)]
struct ScriptedProbe {
    states: Mutex<HashMap<String, InstanceStates>>,
    kills: Mutex<Vec<(String, u32)>>,
    fail_list: bool,
    fail_kill: bool,
}

impl ScriptedProbe {
    fn with_app(self, app_id: &str, states: &[(u32, InstanceState)]) -> Self {
        self.states
            .lock()
            .unwrap()
            .insert(app_id.to_string(), states.iter().cloned().collect());
        self
    }

    fn kills(&self) -> Vec<(String, u32)> {
        self.kills.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformProbe for ScriptedProbe {
    async fn list_instance_states(&self, app_id: &str) -> Result<InstanceStates, PlatformError> {
        if self.fail_list {
            return Err(PlatformError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(app_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn kill_instance(&self, app_id: &str, index: u32) -> Result<(), PlatformError> {
        if self.fail_kill {
            return Err(PlatformError::Api {
                status: 500,
                body: "boom".to_string(),
            });
        }
        self.kills.lock().unwrap().push((app_id.to_string(), index));
        Ok(())
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn unit(app_id: &str, probability: f64, last_processed: Option<&str>) -> BoundApp {
    BoundApp {
        app_id: app_id.to_string(),
        probability,
        frequency: 5,
        last_processed: last_processed.map(String::from),
    }
}

async fn store_with(app_id: &str, probability: f64) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .create_instance(&ServiceInstance {
            id: "I1".to_string(),
            dashboard_url: String::new(),
            plan_id: "default".to_string(),
            probability,
            frequency: 5,
        })
        .await
        .unwrap();
    store
        .create_binding(&ServiceBinding {
            id: "B1".to_string(),
            app_id: app_id.to_string(),
            service_plan_id: "default".to_string(),
            service_instance_id: "I1".to_string(),
            last_processed: None,
        })
        .await
        .unwrap();
    store
}

fn scheduler(store: Arc<MemoryStore>, probe: Arc<ScriptedProbe>) -> ChaosScheduler {
    ChaosScheduler::new(store, probe, &EngineConfig::default())
        .with_clock(Arc::new(ManualClock::new(start())))
        .with_rng(StdRng::seed_from_u64(1))
}

fn running(indices: &[u32]) -> Vec<(u32, InstanceState)> {
    indices.iter().map(|i| (*i, InstanceState::Running)).collect()
}

// -- process_unit ----------------------------------------------------------

#[tokio::test]
async fn not_due_unit_has_no_side_effects() {
    let store = store_with("A1", 1.0).await;
    let probe = Arc::new(ScriptedProbe::default().with_app("A1", &running(&[0, 1])));
    let mut sched = scheduler(store.clone(), probe.clone());

    let recent = format_timestamp(start() - chrono::Duration::minutes(2));
    let outcome = sched.process_unit(&unit("A1", 1.0, Some(&recent))).await;

    assert_eq!(outcome, UnitOutcome::NotDue);
    assert!(store.processed_log().await.is_empty());
    assert!(probe.kills().is_empty());
}

#[tokio::test]
async fn malformed_timestamp_suppresses_processing() {
    let store = store_with("A1", 1.0).await;
    let probe = Arc::new(ScriptedProbe::default().with_app("A1", &running(&[0])));
    let mut sched = scheduler(store.clone(), probe.clone());

    let outcome = sched.process_unit(&unit("A1", 1.0, Some("garbage"))).await;

    assert_eq!(outcome, UnitOutcome::NotDue);
    assert!(store.processed_log().await.is_empty());
}

#[tokio::test]
async fn claim_failure_skips_roll_and_kill() {
    let store = store_with("A1", 1.0).await;
    store.set_fail_writes(true).await;
    let probe = Arc::new(ScriptedProbe::default().with_app("A1", &running(&[0, 1])));
    let mut sched = scheduler(store.clone(), probe.clone());

    let outcome = sched.process_unit(&unit("A1", 1.0, None)).await;

    assert_eq!(outcome, UnitOutcome::ClaimFailed);
    assert!(probe.kills().is_empty());
}

#[tokio::test]
async fn spared_unit_is_still_claimed() {
    let store = store_with("A1", 0.0).await;
    let probe = Arc::new(ScriptedProbe::default().with_app("A1", &running(&[0, 1])));
    let mut sched = scheduler(store.clone(), probe.clone());

    let outcome = sched.process_unit(&unit("A1", 0.0, None)).await;

    assert_eq!(outcome, UnitOutcome::Spared);
    let log = store.processed_log().await;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].at, start());
    assert!(probe.kills().is_empty());
}

#[tokio::test]
async fn unhealthy_app_is_not_killed() {
    let store = store_with("A1", 1.0).await;
    let probe = Arc::new(ScriptedProbe::default().with_app(
        "A1",
        &[(0, InstanceState::Running), (1, InstanceState::Crashed)],
    ));
    let mut sched = scheduler(store.clone(), probe.clone());

    let outcome = sched.process_unit(&unit("A1", 1.0, None)).await;

    assert_eq!(outcome, UnitOutcome::Unhealthy);
    assert!(probe.kills().is_empty());
    assert_eq!(store.processed_log().await.len(), 1);
}

#[tokio::test]
async fn healthy_app_loses_one_instance() {
    let store = store_with("A1", 1.0).await;
    let probe = Arc::new(ScriptedProbe::default().with_app("A1", &running(&[0, 1])));
    let mut sched = scheduler(store.clone(), probe.clone());

    let outcome = sched.process_unit(&unit("A1", 1.0, None)).await;

    let kills = probe.kills();
    assert_eq!(kills.len(), 1);
    assert_eq!(kills[0].0, "A1");
    assert!(kills[0].1 <= 1);
    assert_eq!(outcome, UnitOutcome::Killed { index: kills[0].1 });
    assert_eq!(store.processed_log().await.len(), 2);
}

#[tokio::test]
async fn app_without_instances_targets_index_zero() {
    let store = store_with("A1", 1.0).await;
    let probe = Arc::new(ScriptedProbe::default());
    let mut sched = scheduler(store.clone(), probe.clone());

    let outcome = sched.process_unit(&unit("A1", 1.0, None)).await;

    assert_eq!(outcome, UnitOutcome::Killed { index: 0 });
    assert_eq!(probe.kills(), vec![("A1".to_string(), 0)]);
}

#[tokio::test]
async fn probe_failure_is_reported_per_unit() {
    let store = store_with("A1", 1.0).await;
    let probe = Arc::new(ScriptedProbe {
        fail_list: true,
        ..Default::default()
    });
    let mut sched = scheduler(store.clone(), probe.clone());

    let outcome = sched.process_unit(&unit("A1", 1.0, None)).await;

    assert!(matches!(
        outcome,
        UnitOutcome::Failed {
            stage: FailureStage::Probe,
            ..
        }
    ));
    // Claimed up front, so the unit waits a full interval before retrying.
    assert_eq!(store.processed_log().await.len(), 1);
}

#[tokio::test]
async fn kill_failure_skips_second_claim() {
    let store = store_with("A1", 1.0).await;
    let probe = Arc::new(ScriptedProbe {
        fail_kill: true,
        ..Default::default()
    }
    .with_app("A1", &running(&[0])));
    let mut sched = scheduler(store.clone(), probe.clone());

    let outcome = sched.process_unit(&unit("A1", 1.0, None)).await;

    assert!(matches!(
        outcome,
        UnitOutcome::Failed {
            stage: FailureStage::Kill,
            ..
        }
    ));
    assert_eq!(store.processed_log().await.len(), 1);
}

// -- run_tick --------------------------------------------------------------

#[tokio::test]
async fn tick_on_empty_store_is_a_noop() {
    let store = Arc::new(MemoryStore::new());
    let probe = Arc::new(ScriptedProbe::default());
    let mut sched = scheduler(store, probe.clone());

    let report = sched.run_tick().await.unwrap();

    assert_eq!(report, TickReport::default());
    assert!(probe.kills().is_empty());
}

#[tokio::test]
async fn second_tick_inside_interval_is_not_due() {
    let store = store_with("A1", 1.0).await;
    let probe = Arc::new(ScriptedProbe::default().with_app("A1", &running(&[0, 1])));
    let clock = Arc::new(ManualClock::new(start()));
    let mut sched = ChaosScheduler::new(store.clone(), probe.clone(), &EngineConfig::default())
        .with_clock(clock.clone())
        .with_rng(StdRng::seed_from_u64(3));

    let first = sched.run_tick().await.unwrap();
    clock.advance(chrono::Duration::minutes(1));
    let second = sched.run_tick().await.unwrap();
    clock.advance(chrono::Duration::minutes(5));
    let third = sched.run_tick().await.unwrap();

    assert_eq!(first.killed, 1);
    assert_eq!(second.not_due, 1);
    assert_eq!(third.killed, 1);
    assert_eq!(probe.kills().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn hanging_platform_call_times_out() {
    struct HangingProbe;

    #[async_trait]
    impl PlatformProbe for HangingProbe {
        async fn list_instance_states(&self, _: &str) -> Result<InstanceStates, PlatformError> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(InstanceStates::new())
        }

        async fn kill_instance(&self, _: &str, _: u32) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    let store = store_with("A1", 1.0).await;
    let mut sched = ChaosScheduler::new(store, Arc::new(HangingProbe), &EngineConfig::default())
        .with_clock(Arc::new(ManualClock::new(start())))
        .with_unit_timeout(Duration::from_secs(5));

    let outcome = sched.process_unit(&unit("A1", 1.0, None)).await;

    match outcome {
        UnitOutcome::Failed { stage, error } => {
            assert_eq!(stage, FailureStage::Probe);
            assert!(error.contains("timed out"), "{error}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn report_tallies_every_outcome() {
    let mut report = TickReport::default();
    for outcome in [
        UnitOutcome::NotDue,
        UnitOutcome::ClaimFailed,
        UnitOutcome::Spared,
        UnitOutcome::Unhealthy,
        UnitOutcome::Killed { index: 2 },
        UnitOutcome::Failed {
            stage: FailureStage::Kill,
            error: "x".to_string(),
        },
    ] {
        report.record(&outcome);
    }

    assert_eq!(report.evaluated, 6);
    assert_eq!(
        report.to_string(),
        "evaluated=6 not_due=1 claim_failed=1 spared=1 unhealthy=1 killed=1 failed=1"
    );
}
