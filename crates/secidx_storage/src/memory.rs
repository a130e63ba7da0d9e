//! In-memory key-value store.

use crate::backend::{KeyValueStore, StoreEntry};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(bytes: Vec<u8>, ttl: Option<Duration>, now: Instant) -> Self {
        // A zero TTL, or one past the clock's range, means no expiry.
        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .and_then(|ttl| now.checked_add(ttl));
        Self { bytes, expires_at }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// An in-memory key-value store.
///
/// This store keeps every entry in a hash map and is suitable for:
/// - Unit and integration tests
/// - Single-process caches that don't need persistence
///
/// Expired entries read as absent immediately; their memory is reclaimed
/// lazily on the next write to the same key or by [`purge_expired`](Self::purge_expired).
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use secidx_storage::{InMemoryStore, KeyValueStore};
/// use std::time::Duration;
///
/// let store = InMemoryStore::new();
/// store.set("session", b"token".to_vec(), Some(Duration::from_secs(60))).unwrap();
/// assert!(store.has("session").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the keys of all live entries, sorted.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, value)| value.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Returns the raw bytes under `key`, if live.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .filter(|value| value.is_live(now))
            .map(|value| value.bytes.clone())
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|value| value.is_live(now))
            .count()
    }

    /// Returns true if there are no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, value| value.is_live(now));
        before - entries.len()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.raw(key))
    }

    fn get_many(&self, keys: &[String]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(keys
            .iter()
            .map(|key| {
                entries
                    .get(key)
                    .filter(|value| value.is_live(now))
                    .map(|value| value.bytes.clone())
            })
            .collect())
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StorageResult<bool> {
        let stored = StoredValue::new(value, ttl, Instant::now());
        self.entries.write().insert(key.to_string(), stored);
        Ok(true)
    }

    fn set_many(&self, batch: Vec<StoreEntry>) -> StorageResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        for entry in batch {
            entries.insert(entry.key, StoredValue::new(entry.value, entry.ttl, now));
        }
        Ok(true)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .write()
            .remove(key)
            .is_some_and(|value| value.is_live(now)))
    }

    fn delete_many(&self, keys: &[String]) -> StorageResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let mut removed_any = false;
        for key in keys {
            if let Some(value) = entries.remove(key) {
                removed_any |= value.is_live(now);
            }
        }
        Ok(removed_any)
    }

    fn clear(&self) -> StorageResult<()> {
        self.entries.write().clear();
        Ok(())
    }
}
