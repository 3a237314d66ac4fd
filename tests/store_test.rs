//! Progression state round-trips through the SQLite store

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use common::{engine_at, engine_from, free, steps};
use stepquest::progression::challenges::ChallengeKind;
use stepquest::progression::pets::PetKind;
use stepquest::store::EntityKey;
use stepquest::{PersistenceStore, SqliteStore};

#[test]
fn test_engine_state_survives_reopening_database() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("progress.db");

    let (clock, mut engine) = engine_at(14);
    {
        let store = SqliteStore::open(&path).expect("Failed to open database");
        engine.on_activity_update(&steps(14, 12_000, 12_000), free());
        engine.create_pet("Miso", PetKind::Cat).expect("cat");
        engine
            .create_challenge(ChallengeKind::WeeklySteps, 50_000, 7)
            .expect("challenge");
        clock.advance_days(1);
        engine.on_activity_update(&steps(15, 11_000, 23_000), free());
        engine.persist_to(&store).expect("Failed to persist");
    }

    let store = SqliteStore::open(&path).expect("Failed to reopen database");
    let (_, restored) = engine_from(&store, 15);
    assert_eq!(restored.state(), engine.state());
    assert_eq!(restored.generation(), engine.generation());
    assert_eq!(restored.snapshot().streak(), 2);
}

#[test]
fn test_every_entity_gets_its_own_row() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(&dir.path().join("progress.db")).expect("open");

    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 12_000, 12_000), free());
    engine.create_pet("Miso", PetKind::Cat).expect("cat");
    engine.persist_to(&store).expect("persist");

    let keys: Vec<String> = store
        .generations()
        .expect("generations")
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    for key in [EntityKey::Profile, EntityKey::Achievements, EntityKey::Streak, EntityKey::Quests, EntityKey::Pets] {
        assert!(keys.contains(&key.as_str().to_string()), "missing {key}");
    }
}

#[test]
fn test_wipe_clears_database() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(&dir.path().join("progress.db")).expect("open");

    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 12_000, 12_000), free());
    engine.persist_to(&store).expect("persist");
    assert!(store.load(EntityKey::Profile).expect("load").is_some());

    engine.wipe();
    engine.persist_to(&store).expect("persist");
    assert!(store.generations().expect("generations").is_empty());

    let (_, restored) = engine_from(&store, 14);
    assert_eq!(restored.snapshot().profile.total_xp, 0);
}

#[tokio::test]
async fn test_coordinator_over_sqlite() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("progress.db");
    let store = Arc::new(SqliteStore::open(&path).expect("open"));

    let (_, engine) = engine_from(store.as_ref(), 14);
    let (handle, task) = stepquest::Coordinator::spawn(
        engine,
        store.clone(),
        Arc::new(stepquest::coordinator::StaticEntitlement::new(false)),
        Arc::new(stepquest::coordinator::AutoConfirm::default()),
        &common::test_config(),
    );

    let delta = handle
        .on_activity_update(steps(14, 8_000, 8_000))
        .await
        .expect("signal");
    handle.shutdown().await.expect("shutdown");
    task.await.expect("Coordinator task panicked");

    let reopened = SqliteStore::open(&path).expect("reopen");
    let (_, restored) = engine_from(&reopened, 14);
    assert_eq!(restored.snapshot().profile.total_xp, delta.xp_awarded);
}
