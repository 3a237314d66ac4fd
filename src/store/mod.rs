//! Durable blob storage for progression entities
//!
//! One blob per entity type, each tagged with a schema version and the
//! commit generation that produced it. Backends apply last-writer-wins by
//! generation, so a delayed write of older state never replaces newer state.

pub mod memory;
pub mod sqlite;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Schema version written into every blob produced by this build
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Entity types, one storage key each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Profile,
    Achievements,
    Streak,
    Quests,
    Challenges,
    GroupChallenges,
    Pets,
}

impl EntityKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKey::Profile => "profile",
            EntityKey::Achievements => "achievements",
            EntityKey::Streak => "streak",
            EntityKey::Quests => "quests",
            EntityKey::Challenges => "challenges",
            EntityKey::GroupChallenges => "group_challenges",
            EntityKey::Pets => "pets",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }

    pub fn all() -> &'static [EntityKey] {
        &[
            EntityKey::Profile,
            EntityKey::Achievements,
            EntityKey::Streak,
            EntityKey::Quests,
            EntityKey::Challenges,
            EntityKey::GroupChallenges,
            EntityKey::Pets,
        ]
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted, versioned entity payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub schema_version: u32,
    /// Commit generation of the state this blob was taken from
    pub generation: u64,
    /// JSON document
    pub payload: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode {key}: {source}")]
    Encode {
        key: EntityKey,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value blob storage used by the coordinator
///
/// Calls are blocking; the async coordinator runs them on the blocking pool.
pub trait PersistenceStore: Send + Sync {
    fn load(&self, key: EntityKey) -> Result<Option<StoredBlob>, StoreError>;

    /// Write `blob` unless the stored generation is newer or it is older
    /// than the floor set by the last clear
    fn store(&self, key: EntityKey, blob: &StoredBlob) -> Result<(), StoreError>;

    fn remove(&self, key: EntityKey) -> Result<(), StoreError>;

    /// Remove every entity and refuse later writes below `floor_generation`
    fn clear(&self, floor_generation: u64) -> Result<(), StoreError>;

    /// Floor recorded by the last clear, 0 if never cleared
    fn floor_generation(&self) -> Result<u64, StoreError>;
}

/// Serialize an entity into a blob at `generation`
pub fn encode<T: Serialize>(
    key: EntityKey,
    value: &T,
    generation: u64,
) -> Result<StoredBlob, StoreError> {
    let payload = serde_json::to_string(value).map_err(|source| StoreError::Encode { key, source })?;
    Ok(StoredBlob {
        schema_version: CURRENT_SCHEMA_VERSION,
        generation,
        payload,
    })
}

/// Decode a blob, treating anything unreadable as absent
///
/// Older schema versions decode through serde defaults on added fields.
/// Blobs from a newer build and payloads that fail to parse are logged and
/// dropped so the caller falls back to the entity's zero state.
pub fn decode<T: DeserializeOwned>(key: EntityKey, blob: &StoredBlob) -> Option<T> {
    if blob.schema_version > CURRENT_SCHEMA_VERSION {
        warn!(
            key = %key,
            version = blob.schema_version,
            supported = CURRENT_SCHEMA_VERSION,
            "Stored entity has a newer schema version, treating as absent"
        );
        return None;
    }

    match serde_json::from_str(&blob.payload) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Corrupt stored entity, treating as absent");
            None
        }
    }
}

/// Load and decode one entity; I/O failures are logged and read as absent
///
/// The stored generation is returned even when the payload is unreadable,
/// so later writes can be numbered above whatever occupies the key.
pub fn load_entity<T: DeserializeOwned>(
    store: &dyn PersistenceStore,
    key: EntityKey,
) -> (Option<T>, u64) {
    match store.load(key) {
        Ok(Some(blob)) => (decode(key, &blob), blob.generation),
        Ok(None) => (None, 0),
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read stored entity");
            (None, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        total: u64,
        #[serde(default)]
        added_later: bool,
    }

    #[test]
    fn test_entity_key_names_roundtrip() {
        for key in EntityKey::all() {
            assert_eq!(EntityKey::from_str(key.as_str()), Some(*key));
        }
        assert_eq!(EntityKey::from_str("nope"), None);
    }

    #[test]
    fn test_decode_corrupt_payload_is_absent() {
        let blob = StoredBlob {
            schema_version: CURRENT_SCHEMA_VERSION,
            generation: 3,
            payload: "{not json".to_string(),
        };
        assert_eq!(decode::<Sample>(EntityKey::Profile, &blob), None);
    }

    #[test]
    fn test_decode_future_version_is_absent() {
        let blob = StoredBlob {
            schema_version: CURRENT_SCHEMA_VERSION + 1,
            generation: 3,
            payload: r#"{"total": 5}"#.to_string(),
        };
        assert_eq!(decode::<Sample>(EntityKey::Profile, &blob), None);
    }

    #[test]
    fn test_decode_older_payload_fills_defaults() {
        let blob = StoredBlob {
            schema_version: 0,
            generation: 1,
            payload: r#"{"total": 5}"#.to_string(),
        };
        assert_eq!(
            decode::<Sample>(EntityKey::Profile, &blob),
            Some(Sample {
                total: 5,
                added_later: false
            })
        );
    }
}
