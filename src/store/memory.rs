//! In-process store used by tests and ephemeral sessions

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{EntityKey, PersistenceStore, StoreError, StoredBlob};

/// HashMap-backed store with switchable write failures
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<EntityKey, StoredBlob>>,
    fail_writes: AtomicBool,
    write_count: AtomicUsize,
    /// Only read or written while `blobs` is locked
    floor: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write (and clear) fail until switched back
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful blob writes
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: EntityKey) -> Option<StoredBlob> {
        self.blobs().get(&key).cloned()
    }

    /// Replace a blob bypassing the generation rule
    pub fn put_raw(&self, key: EntityKey, blob: StoredBlob) {
        self.blobs().insert(key, blob);
    }

    pub fn len(&self) -> usize {
        self.blobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn blobs(&self) -> MutexGuard<'_, HashMap<EntityKey, StoredBlob>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl PersistenceStore for MemoryStore {
    fn load(&self, key: EntityKey) -> Result<Option<StoredBlob>, StoreError> {
        Ok(self.get(key))
    }

    fn store(&self, key: EntityKey, blob: &StoredBlob) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut blobs = self.blobs();
        let stale = blob.generation < self.floor.load(Ordering::SeqCst)
            || blobs
                .get(&key)
                .is_some_and(|existing| existing.generation > blob.generation);
        if !stale {
            blobs.insert(key, blob.clone());
            self.write_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn remove(&self, key: EntityKey) -> Result<(), StoreError> {
        self.check_writable()?;
        self.blobs().remove(&key);
        Ok(())
    }

    fn clear(&self, floor_generation: u64) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut blobs = self.blobs();
        blobs.clear();
        self.floor.fetch_max(floor_generation, Ordering::SeqCst);
        Ok(())
    }

    fn floor_generation(&self) -> Result<u64, StoreError> {
        let _blobs = self.blobs();
        Ok(self.floor.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(generation: u64, payload: &str) -> StoredBlob {
        StoredBlob {
            schema_version: 1,
            generation,
            payload: payload.to_string(),
        }
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let store = MemoryStore::new();
        store.store(EntityKey::Streak, &blob(5, "new")).unwrap();
        store.store(EntityKey::Streak, &blob(4, "old")).unwrap();
        assert_eq!(store.get(EntityKey::Streak).unwrap().payload, "new");

        store.store(EntityKey::Streak, &blob(5, "same-gen")).unwrap();
        assert_eq!(store.get(EntityKey::Streak).unwrap().payload, "same-gen");
    }

    #[test]
    fn test_clear_refuses_writes_below_floor() {
        let store = MemoryStore::new();
        store.store(EntityKey::Pets, &blob(8, "before")).unwrap();
        store.clear(10).unwrap();
        assert!(store.is_empty());

        store.store(EntityKey::Pets, &blob(9, "late")).unwrap();
        assert!(store.get(EntityKey::Pets).is_none());

        store.store(EntityKey::Pets, &blob(10, "after")).unwrap();
        assert_eq!(store.get(EntityKey::Pets).unwrap().payload, "after");

        store.clear(4).unwrap();
        assert_eq!(store.floor_generation().unwrap(), 10);
    }

    #[test]
    fn test_injected_failure() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.store(EntityKey::Pets, &blob(1, "x")).is_err());
        assert!(store.is_empty());

        store.set_fail_writes(false);
        store.store(EntityKey::Pets, &blob(1, "x")).unwrap();
        assert_eq!(store.write_count(), 1);
    }
}
