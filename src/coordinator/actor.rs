//! Async coordinator task
//!
//! Commands are drained from one bounded queue in arrival order, so no two
//! mutations ever interleave. Snapshots go out through a watch channel and
//! deltas through a broadcast channel. Store writes run on the blocking pool
//! under a timeout with a bounded number of attempts; whatever fails stays
//! dirty in memory and is retried after the next command.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::engine::ProgressionEngine;
use super::gates::{EntitlementSource, RewardGate};
use super::CoordinatorError;
use crate::config::{Config, CoordinatorSettings, StorageSettings};
use crate::progression::activity::{ActivitySnapshot, SubscriptionStatus};
use crate::progression::challenges::{Challenge, ChallengeKind, GroupChallenge, ParticipantProgress};
use crate::progression::delta::{ProgressionDelta, ProgressionSnapshot};
use crate::progression::pets::{AccessoryCategory, AccessoryId, Pet, PetKind};
use crate::progression::quests::DailyQuest;
use crate::store::PersistenceStore;

/// Placement name passed to the reward gate before a quest refresh
pub const REFRESH_QUEST_PLACEMENT: &str = "refresh_quest";

type Reply = Box<dyn FnOnce() + Send>;
type Mutation = Box<dyn FnOnce(&mut ProgressionEngine) -> Reply + Send>;

enum Command {
    Activity {
        signal: ActivitySnapshot,
        reply: oneshot::Sender<ProgressionDelta>,
    },
    RefreshEntitlements {
        reply: oneshot::Sender<Option<ProgressionDelta>>,
    },
    Mutate(Mutation),
    Wipe {
        reply: oneshot::Sender<()>,
    },
    Flush {
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// The task that owns the engine
pub struct Coordinator {
    engine: ProgressionEngine,
    store: Arc<dyn PersistenceStore>,
    entitlements: Arc<dyn EntitlementSource>,
    settings: CoordinatorSettings,
    storage: StorageSettings,
    last_status: SubscriptionStatus,
    snapshot_tx: watch::Sender<Arc<ProgressionSnapshot>>,
    delta_tx: broadcast::Sender<ProgressionDelta>,
}

impl Coordinator {
    /// Start the coordinator task
    pub fn spawn(
        engine: ProgressionEngine,
        store: Arc<dyn PersistenceStore>,
        entitlements: Arc<dyn EntitlementSource>,
        reward_gate: Arc<dyn RewardGate>,
        config: &Config,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.coordinator.queue_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (delta_tx, _) = broadcast::channel(config.coordinator.delta_buffer.max(1));

        let last_status = SubscriptionStatus {
            is_premium_active: engine.snapshot().premium(),
        };

        let coordinator = Coordinator {
            engine,
            store,
            entitlements,
            settings: config.coordinator.clone(),
            storage: config.storage.clone(),
            last_status,
            snapshot_tx,
            delta_tx: delta_tx.clone(),
        };

        let task = tokio::spawn(coordinator.run(rx));
        let handle = CoordinatorHandle {
            tx,
            snapshots: snapshot_rx,
            deltas: delta_tx,
            reward_gate,
        };
        (handle, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!(generation = self.engine.generation(), "Progression coordinator started");

        while let Some(command) = rx.recv().await {
            match command {
                Command::Activity { signal, reply } => {
                    let status = self.current_status().await;
                    let delta = self.engine.on_activity_update(&signal, status);
                    self.publish();
                    // No subscribers is fine
                    let _ = self.delta_tx.send(delta.clone());
                    let _ = reply.send(delta);
                    self.persist().await;
                }
                Command::RefreshEntitlements { reply } => {
                    let status = self.current_status().await;
                    let delta = self.engine.refresh_entitlements(status);
                    self.publish();
                    if let Some(delta) = &delta {
                        let _ = self.delta_tx.send(delta.clone());
                    }
                    let _ = reply.send(delta);
                    self.persist().await;
                }
                Command::Mutate(action) => {
                    let respond = action(&mut self.engine);
                    self.publish();
                    respond();
                    self.persist().await;
                }
                Command::Wipe { reply } => {
                    self.engine.wipe();
                    self.publish();
                    self.persist().await;
                    let _ = reply.send(());
                }
                Command::Flush { reply } => {
                    let clean = self.persist().await;
                    let _ = reply.send(clean);
                }
                Command::Shutdown { reply } => {
                    rx.close();
                    self.persist().await;
                    let _ = reply.send(());
                    break;
                }
            }
        }

        if self.engine.has_pending_writes() && !self.persist().await {
            error!("Progression coordinator stopped with unsaved changes");
        }
        info!("Progression coordinator stopped");
    }

    fn publish(&self) {
        let snapshot = self.engine.snapshot();
        if self.snapshot_tx.borrow().generation != snapshot.generation {
            self.snapshot_tx.send_replace(snapshot);
        }
    }

    /// Ask the entitlement source, falling back to the last known status
    async fn current_status(&mut self) -> SubscriptionStatus {
        match timeout(self.settings.entitlement_timeout(), self.entitlements.status()).await {
            Ok(Ok(status)) => {
                if status != self.last_status {
                    info!(premium = status.is_premium_active, "Subscription status changed");
                }
                self.last_status = status;
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Entitlement check failed, using last known status");
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.settings.entitlement_timeout_ms,
                    "Entitlement check timed out, using last known status"
                );
            }
        }
        self.last_status
    }

    /// Write pending entities; returns whether nothing is left pending
    async fn persist(&mut self) -> bool {
        if !self.engine.has_pending_writes() {
            return true;
        }

        let pending = match self.engine.pending_writes() {
            Ok(pending) => pending,
            Err(e) => {
                error!(error = %e, "Failed to encode progression state");
                return false;
            }
        };

        let attempts = self.storage.write_attempts.max(1);
        for attempt in 1..=attempts {
            let store = Arc::clone(&self.store);
            let batch = pending.clone();

            // A timed-out write keeps running; the store's generation rule
            // drops it if newer state landed first.
            match timeout(
                self.storage.write_timeout(),
                tokio::task::spawn_blocking(move || batch.apply(store.as_ref())),
            )
            .await
            {
                Ok(Ok(Ok(()))) => {
                    self.engine.mark_persisted(&pending);
                    debug!(
                        entities = pending.blobs.len(),
                        cleared = pending.clear.is_some(),
                        generation = self.engine.generation(),
                        "Persisted progression state"
                    );
                    return !self.engine.has_pending_writes();
                }
                Ok(Ok(Err(e))) => warn!(attempt, error = %e, "Progression write failed"),
                Ok(Err(e)) => warn!(attempt, error = %e, "Progression write task failed"),
                Err(_) => warn!(
                    attempt,
                    timeout_ms = self.storage.write_timeout_ms,
                    "Progression write timed out"
                ),
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(25 * u64::from(attempt))).await;
            }
        }

        warn!("Keeping unsaved progression changes in memory for the next cycle");
        false
    }
}

/// Cloneable front door to the coordinator task
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Arc<ProgressionSnapshot>>,
    deltas: broadcast::Sender<ProgressionDelta>,
    reward_gate: Arc<dyn RewardGate>,
}

impl CoordinatorHandle {
    /// Latest committed snapshot
    pub fn snapshot(&self) -> Arc<ProgressionSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn watch_snapshots(&self) -> watch::Receiver<Arc<ProgressionSnapshot>> {
        self.snapshots.clone()
    }

    /// Receive every delta published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressionDelta> {
        self.deltas.subscribe()
    }

    async fn request<T>(&self, command: Command, rx: oneshot::Receiver<T>) -> Result<T, CoordinatorError> {
        self.tx.send(command).await.map_err(|_| CoordinatorError::Closed)?;
        rx.await.map_err(|_| CoordinatorError::Closed)
    }

    pub async fn on_activity_update(&self, signal: ActivitySnapshot) -> Result<ProgressionDelta, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Activity { signal, reply }, rx).await
    }

    /// Re-check the subscription and let gated progress catch up
    pub async fn refresh_entitlements(&self) -> Result<Option<ProgressionDelta>, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::RefreshEntitlements { reply }, rx).await
    }

    /// Run `action` on the engine between cycles
    pub async fn mutate<T, F>(&self, action: F) -> Result<T, CoordinatorError>
    where
        T: Send + 'static,
        F: FnOnce(&mut ProgressionEngine) -> T + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let mutation: Mutation = Box::new(move |engine| {
            let out = action(engine);
            Box::new(move || {
                let _ = reply.send(out);
            })
        });
        self.request(Command::Mutate(mutation), rx).await
    }

    /// Refresh a quest once the reward gate confirms
    ///
    /// The gate is awaited here, before anything is queued, so the
    /// coordinator keeps processing while the player watches the ad.
    pub async fn refresh_quest(&self, quest_id: &str) -> Result<DailyQuest, CoordinatorError> {
        let confirmed = self
            .reward_gate
            .confirm(REFRESH_QUEST_PLACEMENT)
            .await
            .map_err(|e| CoordinatorError::RewardGate(e.to_string()))?;
        if !confirmed {
            return Err(CoordinatorError::RewardDeclined);
        }

        let quest_id = quest_id.to_string();
        Ok(self.mutate(move |engine| engine.refresh_quest(&quest_id)).await??)
    }

    pub async fn create_challenge(&self, kind: ChallengeKind, target: u64, duration_days: u32) -> Result<Challenge, CoordinatorError> {
        Ok(self
            .mutate(move |engine| engine.create_challenge(kind, target, duration_days))
            .await??)
    }

    pub async fn cancel_challenge(&self, id: Uuid) -> Result<Challenge, CoordinatorError> {
        Ok(self.mutate(move |engine| engine.cancel_challenge(id)).await??)
    }

    pub async fn create_group_challenge(
        &self,
        name: &str,
        kind: ChallengeKind,
        target: u64,
        duration_days: u32,
        participants: Vec<ParticipantProgress>,
    ) -> Result<GroupChallenge, CoordinatorError> {
        let name = name.to_string();
        Ok(self
            .mutate(move |engine| {
                engine.create_group_challenge(&name, kind, target, duration_days, participants)
            })
            .await??)
    }

    pub async fn sync_group_progress(&self, id: Uuid, updates: Vec<ParticipantProgress>) -> Result<GroupChallenge, CoordinatorError> {
        Ok(self
            .mutate(move |engine| engine.sync_group_progress(id, &updates))
            .await??)
    }

    pub async fn delete_group_challenge(&self, id: Uuid) -> Result<GroupChallenge, CoordinatorError> {
        Ok(self.mutate(move |engine| engine.delete_group_challenge(id)).await??)
    }

    pub async fn create_pet(&self, name: &str, kind: PetKind) -> Result<Pet, CoordinatorError> {
        let name = name.to_string();
        Ok(self.mutate(move |engine| engine.create_pet(&name, kind)).await??)
    }

    pub async fn select_pet(&self, id: Uuid) -> Result<(), CoordinatorError> {
        Ok(self.mutate(move |engine| engine.select_pet(id)).await??)
    }

    pub async fn rename_pet(&self, id: Uuid, name: &str) -> Result<(), CoordinatorError> {
        let name = name.to_string();
        Ok(self.mutate(move |engine| engine.rename_pet(id, &name)).await??)
    }

    pub async fn delete_pet(&self, id: Uuid) -> Result<Pet, CoordinatorError> {
        Ok(self.mutate(move |engine| engine.delete_pet(id)).await??)
    }

    pub async fn equip_accessory(&self, accessory: AccessoryId) -> Result<(), CoordinatorError> {
        Ok(self.mutate(move |engine| engine.equip_accessory(accessory)).await??)
    }

    pub async fn unequip_accessory(&self, category: AccessoryCategory) -> Result<Option<AccessoryId>, CoordinatorError> {
        Ok(self.mutate(move |engine| engine.unequip_accessory(category)).await??)
    }

    /// Erase all progression data, between cycles
    pub async fn wipe(&self) -> Result<(), CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Wipe { reply }, rx).await
    }

    /// Retry pending writes now; `true` when the store is up to date
    pub async fn flush(&self) -> Result<bool, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Flush { reply }, rx).await
    }

    /// Flush and stop the task; other handles see `Closed` afterwards
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Shutdown { reply }, rx).await
    }
}
