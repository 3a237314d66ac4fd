//! Owned progression entities and their persisted form
//!
//! Each entity maps to one store key. The coordinator clones the whole state
//! into a working copy, runs a cycle on it, and compares it with the
//! committed copy to find which keys need writing.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::achievements::AchievementBook;
use super::activity::{ActivityLedger, ActivitySnapshot};
use super::challenges::{ChallengeBook, GroupChallenges};
use super::levels::XpLedger;
use super::pets::PetRoster;
use super::quests::QuestBoard;
use super::rewards::ActivityRewards;
use super::streaks::StreakRecord;
use crate::store::{encode, load_entity, EntityKey, PersistenceStore, StoreError, StoredBlob};

/// XP total, activity totals, and cycle bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub xp: XpLedger,
    #[serde(default)]
    pub activity: ActivityLedger,
    #[serde(default)]
    pub rewards: ActivityRewards,
    #[serde(default)]
    pub last_processed_day: Option<NaiveDate>,
    /// Entitlement seen by the most recent cycle
    #[serde(default)]
    pub last_premium: bool,
    #[serde(default)]
    pub last_snapshot: Option<ActivitySnapshot>,
}

/// Every entity behind the coordinator's write path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressionState {
    pub profile: ProfileRecord,
    pub achievements: AchievementBook,
    pub streak: StreakRecord,
    pub quests: QuestBoard,
    pub challenges: ChallengeBook,
    pub groups: GroupChallenges,
    pub pets: PetRoster,
}

impl ProgressionState {
    /// Keys whose entity differs from `other`
    pub fn changed_keys(&self, other: &ProgressionState) -> Vec<EntityKey> {
        EntityKey::all()
            .iter()
            .copied()
            .filter(|key| match key {
                EntityKey::Profile => self.profile != other.profile,
                EntityKey::Achievements => self.achievements != other.achievements,
                EntityKey::Streak => self.streak != other.streak,
                EntityKey::Quests => self.quests != other.quests,
                EntityKey::Challenges => self.challenges != other.challenges,
                EntityKey::GroupChallenges => self.groups != other.groups,
                EntityKey::Pets => self.pets != other.pets,
            })
            .collect()
    }

    /// Serialize the entity stored under `key`
    pub fn encode(&self, key: EntityKey, generation: u64) -> Result<StoredBlob, StoreError> {
        match key {
            EntityKey::Profile => encode(key, &self.profile, generation),
            EntityKey::Achievements => encode(key, &self.achievements, generation),
            EntityKey::Streak => encode(key, &self.streak, generation),
            EntityKey::Quests => encode(key, &self.quests, generation),
            EntityKey::Challenges => encode(key, &self.challenges, generation),
            EntityKey::GroupChallenges => encode(key, &self.groups, generation),
            EntityKey::Pets => encode(key, &self.pets, generation),
        }
    }

    /// Load every entity, using the zero state for absent or unreadable ones
    ///
    /// Returns the state and the highest generation found, counting blobs
    /// that failed to decode.
    pub fn load(store: &dyn PersistenceStore) -> (Self, u64) {
        let mut generation = store.floor_generation().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read store generation floor");
            0
        });
        let state = Self {
            profile: take(store, EntityKey::Profile, &mut generation),
            achievements: take(store, EntityKey::Achievements, &mut generation),
            streak: take(store, EntityKey::Streak, &mut generation),
            quests: take(store, EntityKey::Quests, &mut generation),
            challenges: take(store, EntityKey::Challenges, &mut generation),
            groups: take(store, EntityKey::GroupChallenges, &mut generation),
            pets: take(store, EntityKey::Pets, &mut generation),
        };
        (state, generation)
    }
}

fn take<T: DeserializeOwned + Default>(store: &dyn PersistenceStore, key: EntityKey, generation: &mut u64) -> T {
    let (value, stored) = load_entity(store, key);
    *generation = (*generation).max(stored);
    value.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_changed_keys() {
        let a = ProgressionState::default();
        let mut b = a.clone();
        assert!(b.changed_keys(&a).is_empty());

        b.streak.current = 3;
        b.profile.last_premium = true;
        assert_eq!(b.changed_keys(&a), vec![EntityKey::Profile, EntityKey::Streak]);
    }

    #[test]
    fn test_load_uses_zero_state_for_corrupt_entities() {
        let store = MemoryStore::new();
        let mut state = ProgressionState::default();
        state.streak.current = 4;
        state.streak.best = 9;
        store
            .store(EntityKey::Streak, &state.encode(EntityKey::Streak, 7).unwrap())
            .unwrap();
        store.put_raw(
            EntityKey::Pets,
            StoredBlob {
                schema_version: 1,
                generation: 9,
                payload: "{not json".to_string(),
            },
        );

        let (loaded, generation) = ProgressionState::load(&store);
        assert_eq!(loaded.streak.best, 9);
        assert_eq!(loaded.pets, PetRoster::default());
        // The unreadable blob still holds its generation on disk
        assert_eq!(generation, 9);
    }
}
