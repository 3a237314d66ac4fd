//! Synchronous progression engine
//!
//! Owns the committed state. Every signal and user action runs against a
//! cloned working copy that replaces the committed copy only when the whole
//! step finished, so a snapshot is always either fully before or fully after
//! a cycle. Persistence is compute-all-then-write-all: the engine tracks
//! which entities changed and hands them out as one batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::EngineSettings;
use crate::progression::achievements::MetricSet;
use crate::progression::activity::{ActivitySnapshot, DailyActivity, SubscriptionStatus};
use crate::progression::challenges::{
    Challenge, ChallengeError, ChallengeKind, GroupChallenge, ParticipantProgress,
};
use crate::progression::delta::{ProgressionDelta, ProgressionEvent, ProgressionSnapshot, XpSource};
use crate::progression::pets::{AccessoryCategory, AccessoryId, Pet, PetError, PetKind};
use crate::progression::quests::{DailyQuest, QuestError};
use crate::progression::state::ProgressionState;
use crate::store::{EntityKey, PersistenceStore, StoreError, StoredBlob};

/// Entities to write, produced by [`ProgressionEngine::pending_writes`]
#[derive(Debug, Clone, Default)]
pub struct PendingWrites {
    /// Clear the store at this floor generation before writing (a wipe happened)
    pub clear: Option<u64>,
    pub blobs: Vec<(EntityKey, StoredBlob)>,
}

impl PendingWrites {
    pub fn is_empty(&self) -> bool {
        self.clear.is_none() && self.blobs.is_empty()
    }

    /// Write the batch; blocking
    pub fn apply(&self, store: &dyn PersistenceStore) -> Result<(), StoreError> {
        if let Some(floor) = self.clear {
            store.clear(floor)?;
        }
        for (key, blob) in &self.blobs {
            store.store(*key, blob)?;
        }
        Ok(())
    }
}

/// Context shared by user actions
struct ActionContext {
    now: DateTime<Utc>,
    day: NaiveDate,
    premium: bool,
    today: DailyActivity,
}

pub struct ProgressionEngine {
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
    committed: ProgressionState,
    generation: u64,
    /// Changed entities and the generation that changed them
    dirty: BTreeMap<EntityKey, u64>,
    /// Generation of the latest wipe not yet applied to the store
    pending_clear: Option<u64>,
    snapshot: Arc<ProgressionSnapshot>,
}

impl ProgressionEngine {
    /// Engine with zero state
    pub fn new(clock: Arc<dyn Clock>, settings: EngineSettings) -> Self {
        Self::from_state(clock, settings, ProgressionState::default(), 0)
    }

    /// Engine restored from `store`
    ///
    /// Unreadable entities start from zero. Achievement records that met
    /// their requirement without an unlock are repaired without paying
    /// their bonus again.
    pub fn load(store: &dyn PersistenceStore, clock: Arc<dyn Clock>, settings: EngineSettings) -> Self {
        let (mut state, generation) = ProgressionState::load(store);

        let healed = state.achievements.heal();
        debug_assert!(
            healed.is_empty(),
            "achievement records lost their unlock: {healed:?}"
        );

        let mut engine = Self::from_state(clock, settings, state, generation);
        if !healed.is_empty() {
            engine.dirty.insert(EntityKey::Achievements, generation);
        }
        info!(generation, "Loaded progression state");
        engine
    }

    fn from_state(clock: Arc<dyn Clock>, settings: EngineSettings, state: ProgressionState, generation: u64) -> Self {
        let snapshot = Arc::new(ProgressionSnapshot::new(generation, state.clone(), settings.step_goal()));
        Self {
            clock,
            settings,
            committed: state,
            generation,
            dirty: BTreeMap::new(),
            pending_clear: None,
            snapshot,
        }
    }

    pub fn snapshot(&self) -> Arc<ProgressionSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn state(&self) -> &ProgressionState {
        &self.committed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Day a cycle runs on
    ///
    /// Never earlier than the last processed day. A signal dated up to one
    /// day ahead of the clock moves the day forward; further ahead is
    /// treated as malformed.
    fn processing_day(&self, signal_date: Option<NaiveDate>) -> NaiveDate {
        let clock_day = self.clock.today();
        let mut day = clock_day;
        if let Some(last) = self.committed.profile.last_processed_day {
            day = day.max(last);
        }
        if let Some(date) = signal_date {
            if date > day && date <= clock_day + Duration::days(1) {
                day = date;
            }
        }
        day
    }

    // ========== Activity cycle ==========

    /// Process one activity signal
    pub fn on_activity_update(&mut self, signal: &ActivitySnapshot, subscription: SubscriptionStatus) -> ProgressionDelta {
        let premium = subscription.is_premium_active;
        let now = self.clock.now();
        let day = self.processing_day(Some(signal.date));
        let goal = self.settings.step_goal();

        let mut work = self.committed.clone();
        let mut events = Vec::new();
        let mut xp = 0u64;

        // Activity
        let reading = work.profile.activity.absorb(signal, day, goal);
        let activity_xp = work.profile.rewards.credit(&reading, goal);
        for (amount, source) in [
            (activity_xp.step_xp, XpSource::Steps),
            (activity_xp.tier_xp, XpSource::StepTier),
            (activity_xp.goal_bonus_xp, XpSource::DailyGoal),
        ] {
            if amount > 0 {
                events.push(ProgressionEvent::XpAwarded { amount, source });
            }
        }
        xp += activity_xp.total();

        // Streak
        let previous_streak = work.streak.current;
        let credit = work.streak.credit_day(
            reading.today.steps >= goal,
            day,
            self.settings.weekly_streak_bonus_xp,
        );
        if credit.extended {
            events.push(ProgressionEvent::StreakExtended { days: work.streak.current });
        }
        if credit.broken {
            events.push(ProgressionEvent::StreakBroken { was: previous_streak });
        }
        for days in &credit.milestones {
            events.push(ProgressionEvent::StreakMilestone { days: *days });
        }
        if credit.bonus_xp > 0 {
            events.push(ProgressionEvent::XpAwarded {
                amount: credit.bonus_xp,
                source: XpSource::Streak,
            });
        }
        xp += credit.bonus_xp;

        // Achievements
        let metrics = MetricSet::new(&reading, &work.streak, goal);
        let outcome = work.achievements.evaluate(&metrics, premium, now);
        let unlocked_achievement_ids = outcome.unlocked.iter().map(|u| u.achievement.id).collect();
        for unlock in &outcome.unlocked {
            events.push(ProgressionEvent::AchievementUnlocked {
                id: unlock.achievement.id,
                xp: unlock.xp,
                retroactive: unlock.retroactive,
            });
        }
        for id in &outcome.awaiting_premium {
            events.push(ProgressionEvent::AchievementAwaitingPremium { id: *id });
        }
        xp += outcome.xp();

        // Quests
        let mut expired_quest_ids = Vec::new();
        if let Some(rollover) = work.quests.roll_over(day) {
            for quest in rollover.expired {
                events.push(ProgressionEvent::QuestExpired { id: quest.id.clone() });
                expired_quest_ids.push(quest.id);
            }
            events.push(ProgressionEvent::QuestsGenerated { day: rollover.day });
        }
        let completed_quests = work.quests.advance(&reading.today, premium, now);
        let mut completed_quest_ids = Vec::with_capacity(completed_quests.len());
        for quest in completed_quests {
            xp += quest.xp_reward;
            events.push(ProgressionEvent::QuestCompleted {
                id: quest.id.clone(),
                xp: quest.xp_reward,
            });
            completed_quest_ids.push(quest.id);
        }

        // Challenges
        let update = work.challenges.advance(day, &reading.today, work.streak.current, now);
        for challenge in &update.expired {
            events.push(ProgressionEvent::ChallengeExpired { id: challenge.id });
        }
        for challenge in &update.completed {
            events.push(ProgressionEvent::ChallengeCompleted {
                id: challenge.id,
                xp: challenge.xp_reward,
            });
        }
        xp += update.xp();
        for id in work.groups.advance(day, &reading.today, work.streak.current, now) {
            events.push(ProgressionEvent::GroupGoalReached { id });
        }

        // XP ledger, once for the whole cycle
        let total_before = work.profile.xp.total_xp();
        let level_up = work.profile.xp.award(xp);
        let total_after = work.profile.xp.total_xp();
        if let Some(level_up) = &level_up {
            for level in &level_up.levels_crossed {
                events.push(ProgressionEvent::LevelReached { level: *level });
            }
            if level_up.rank_changed() {
                events.push(ProgressionEvent::RankChanged {
                    from: level_up.old_rank,
                    to: level_up.new_rank,
                });
            }
        }

        // Pets
        work.pets.enforce_entitlement(premium, now);
        let growth = work.pets.feed_active(self.settings.pet_share(total_before, total_after), now);
        let mut new_pet_stage = None;
        let mut unlocked_accessories = Vec::new();
        if let Some(growth) = growth {
            if let Some(stage) = growth.new_stage {
                events.push(ProgressionEvent::PetEvolved {
                    pet_id: growth.pet_id,
                    stage,
                });
                new_pet_stage = Some(stage);
            }
            for accessory in growth.unlocked {
                events.push(ProgressionEvent::AccessoryUnlocked {
                    pet_id: growth.pet_id,
                    accessory,
                });
                unlocked_accessories.push(accessory);
            }
        }

        work.profile.last_processed_day = Some(day);
        work.profile.last_premium = premium;
        work.profile.last_snapshot = Some(*signal);

        self.commit(work);

        debug!(
            generation = self.generation,
            day = %day,
            xp,
            total_xp = self.committed.profile.xp.total_xp(),
            level = self.snapshot.profile.level,
            streak = self.committed.streak.current,
            "Processed activity signal"
        );

        ProgressionDelta {
            xp_awarded: xp,
            new_level: level_up.as_ref().map(|l| l.new_level),
            levels_crossed: level_up.as_ref().map(|l| l.levels_crossed.clone()).unwrap_or_default(),
            new_rank: level_up.as_ref().filter(|l| l.rank_changed()).map(|l| l.new_rank),
            unlocked_achievement_ids,
            completed_quest_ids,
            expired_quest_ids,
            completed_challenge_ids: update.completed.iter().map(|c| c.id).collect(),
            expired_challenge_ids: update.expired.iter().map(|c| c.id).collect(),
            new_streak: self.committed.streak.current,
            new_pet_stage,
            unlocked_accessories,
            events,
            snapshot: self.snapshot(),
        }
    }

    /// Apply a changed entitlement without new activity
    ///
    /// Re-runs the last signal so gated achievements and quests catch up;
    /// before any signal only the pet restrictions are applied.
    pub fn refresh_entitlements(&mut self, subscription: SubscriptionStatus) -> Option<ProgressionDelta> {
        if let Some(signal) = self.committed.profile.last_snapshot {
            return Some(self.on_activity_update(&signal, subscription));
        }

        let premium = subscription.is_premium_active;
        let now = self.clock.now();
        let mut work = self.committed.clone();
        work.profile.last_premium = premium;
        work.pets.enforce_entitlement(premium, now);
        self.commit(work);
        None
    }

    fn commit(&mut self, work: ProgressionState) {
        let changed = work.changed_keys(&self.committed);
        if !changed.is_empty() {
            self.generation += 1;
            for key in changed {
                self.dirty.insert(key, self.generation);
            }
        }
        self.committed = work;
        self.snapshot = Arc::new(ProgressionSnapshot::new(
            self.generation,
            self.committed.clone(),
            self.settings.step_goal(),
        ));
    }

    // ========== User actions ==========

    /// Run a user action on a working copy, committing only on success
    fn transact<T, E>(&mut self, action: impl FnOnce(&mut ProgressionState, &ActionContext) -> Result<T, E>) -> Result<T, E> {
        let day = self.processing_day(None);
        let ctx = ActionContext {
            now: self.clock.now(),
            day,
            premium: self.committed.profile.last_premium,
            today: self
                .committed
                .profile
                .activity
                .reading(day, self.settings.step_goal())
                .today,
        };

        let mut work = self.committed.clone();
        let out = action(&mut work, &ctx)?;
        self.commit(work);
        Ok(out)
    }

    /// Swap one of today's quests; the caller confirms the reward gate first
    pub fn refresh_quest(&mut self, quest_id: &str) -> Result<DailyQuest, QuestError> {
        self.transact(|state, ctx| {
            state.quests.roll_over(ctx.day);
            state.quests.refresh(quest_id)
        })
    }

    pub fn create_challenge(&mut self, kind: ChallengeKind, target: u64, duration_days: u32) -> Result<Challenge, ChallengeError> {
        self.transact(|state, ctx| {
            state
                .challenges
                .create(kind, target, duration_days, ctx.now, ctx.day, &ctx.today)
        })
    }

    pub fn cancel_challenge(&mut self, id: Uuid) -> Result<Challenge, ChallengeError> {
        self.transact(|state, _| state.challenges.cancel(id))
    }

    pub fn create_group_challenge(
        &mut self,
        name: &str,
        kind: ChallengeKind,
        target: u64,
        duration_days: u32,
        participants: Vec<ParticipantProgress>,
    ) -> Result<GroupChallenge, ChallengeError> {
        self.transact(|state, ctx| {
            state.groups.create(
                name,
                kind,
                target,
                duration_days,
                participants,
                ctx.premium,
                ctx.now,
                ctx.day,
                &ctx.today,
            )
        })
    }

    /// Replace remote participants' progress with freshly supplied values
    pub fn sync_group_progress(&mut self, id: Uuid, updates: &[ParticipantProgress]) -> Result<GroupChallenge, ChallengeError> {
        self.transact(|state, _| state.groups.sync(id, updates).cloned())
    }

    pub fn delete_group_challenge(&mut self, id: Uuid) -> Result<GroupChallenge, ChallengeError> {
        self.transact(|state, _| state.groups.delete(id))
    }

    pub fn create_pet(&mut self, name: &str, kind: PetKind) -> Result<Pet, PetError> {
        self.transact(|state, ctx| state.pets.create(name, kind, ctx.premium, ctx.now))
    }

    pub fn select_pet(&mut self, id: Uuid) -> Result<(), PetError> {
        self.transact(|state, ctx| state.pets.select(id, ctx.premium))
    }

    pub fn rename_pet(&mut self, id: Uuid, name: &str) -> Result<(), PetError> {
        self.transact(|state, _| state.pets.rename(id, name))
    }

    pub fn delete_pet(&mut self, id: Uuid) -> Result<Pet, PetError> {
        self.transact(|state, _| state.pets.delete(id))
    }

    pub fn equip_accessory(&mut self, accessory: AccessoryId) -> Result<(), PetError> {
        self.transact(|state, ctx| state.pets.equip(accessory, ctx.premium))
    }

    pub fn unequip_accessory(&mut self, category: AccessoryCategory) -> Result<Option<AccessoryId>, PetError> {
        self.transact(|state, _| state.pets.unequip(category))
    }

    /// Reset every entity to zero and schedule the store to be cleared
    pub fn wipe(&mut self) {
        self.committed = ProgressionState::default();
        self.generation += 1;
        self.dirty.clear();
        self.pending_clear = Some(self.generation);
        self.snapshot = Arc::new(ProgressionSnapshot::new(
            self.generation,
            ProgressionState::default(),
            self.settings.step_goal(),
        ));
        info!(generation = self.generation, "Wiped progression data");
    }

    // ========== Persistence ==========

    pub fn has_pending_writes(&self) -> bool {
        self.pending_clear.is_some() || !self.dirty.is_empty()
    }

    /// Encode every changed entity at the current generation
    pub fn pending_writes(&self) -> Result<PendingWrites, StoreError> {
        let mut blobs = Vec::with_capacity(self.dirty.len());
        for key in self.dirty.keys() {
            blobs.push((*key, self.committed.encode(*key, self.generation)?));
        }
        Ok(PendingWrites {
            clear: self.pending_clear,
            blobs,
        })
    }

    /// Forget entities that `written` covered
    ///
    /// Entities changed again after the batch was taken stay dirty.
    pub fn mark_persisted(&mut self, written: &PendingWrites) {
        if written.clear.is_some() && written.clear >= self.pending_clear {
            self.pending_clear = None;
        }
        for (key, blob) in &written.blobs {
            if self.dirty.get(key).is_some_and(|changed| *changed <= blob.generation) {
                self.dirty.remove(key);
            }
        }
    }

    /// Write pending entities to `store` on the current thread
    pub fn persist_to(&mut self, store: &dyn PersistenceStore) -> Result<usize, StoreError> {
        let pending = self.pending_writes()?;
        if pending.is_empty() {
            return Ok(0);
        }
        if let Err(e) = pending.apply(store) {
            error!(error = %e, "Failed to persist progression state");
            return Err(e);
        }
        self.mark_persisted(&pending);
        Ok(pending.blobs.len())
    }
}
