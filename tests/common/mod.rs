//! Shared fixtures for progression integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;

use stepquest::config::{Config, EngineSettings};
use stepquest::coordinator::{AutoConfirm, Coordinator, CoordinatorHandle, StaticEntitlement};
use stepquest::{ActivitySnapshot, ManualClock, MemoryStore, PersistenceStore, ProgressionEngine, SubscriptionStatus};
use tokio::task::JoinHandle;

/// Tests run in October 2026
pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).expect("Invalid test day")
}

pub fn free() -> SubscriptionStatus {
    SubscriptionStatus::free()
}

pub fn premium() -> SubscriptionStatus {
    SubscriptionStatus::premium()
}

/// Steps-only snapshot for day `d`
pub fn steps(d: u32, today: i64, lifetime: i64) -> ActivitySnapshot {
    ActivitySnapshot::steps(day(d), today, lifetime)
}

/// Engine over zero state with a clock at 09:00 UTC on day `d`
pub fn engine_at(d: u32) -> (Arc<ManualClock>, ProgressionEngine) {
    let clock = Arc::new(ManualClock::at_day(day(d), 9));
    let engine = ProgressionEngine::new(clock.clone(), EngineSettings::default());
    (clock, engine)
}

/// Engine restored from `store` with a clock at 09:00 UTC on day `d`
pub fn engine_from(store: &dyn PersistenceStore, d: u32) -> (Arc<ManualClock>, ProgressionEngine) {
    let clock = Arc::new(ManualClock::at_day(day(d), 9));
    let engine = ProgressionEngine::load(store, clock.clone(), EngineSettings::default());
    (clock, engine)
}

/// Config with fast persistence retries
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.write_attempts = 2;
    config.storage.write_timeout_ms = 500;
    config.coordinator.entitlement_timeout_ms = 200;
    config
}

/// A running coordinator and everything needed to poke at it
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub entitlement: Arc<StaticEntitlement>,
    pub handle: CoordinatorHandle,
    pub task: JoinHandle<()>,
}

impl Harness {
    pub fn start(d: u32, premium: bool, confirm_rewards: bool) -> Self {
        Self::start_with_store(Arc::new(MemoryStore::new()), d, premium, confirm_rewards)
    }

    pub fn start_with_store(store: Arc<MemoryStore>, d: u32, premium: bool, confirm_rewards: bool) -> Self {
        let (clock, engine) = engine_from(store.as_ref(), d);
        let entitlement = Arc::new(StaticEntitlement::new(premium));
        let (handle, task) = Coordinator::spawn(
            engine,
            store.clone(),
            entitlement.clone(),
            Arc::new(AutoConfirm(confirm_rewards)),
            &test_config(),
        );

        Self {
            clock,
            store,
            entitlement,
            handle,
            task,
        }
    }

    pub async fn stop(self) -> Arc<MemoryStore> {
        self.handle.shutdown().await.expect("Coordinator already stopped");
        self.task.await.expect("Coordinator task panicked");
        self.store
    }
}
