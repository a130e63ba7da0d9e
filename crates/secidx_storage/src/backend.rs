//! Key-value store trait definition.

use crate::error::StorageResult;
use std::time::Duration;

/// One write in a batched [`KeyValueStore::set_many`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// The key to write.
    pub key: String,
    /// The opaque value bytes.
    pub value: Vec<u8>,
    /// Optional time-to-live, relative to the moment of the write.
    pub ttl: Option<Duration>,
}

impl StoreEntry {
    /// Creates an entry without expiry.
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: None,
        }
    }

    /// Sets the entry's time-to-live.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A key-value engine that secondary indexes are layered on.
///
/// Stores are **opaque**: keys are strings, values are bytes, and the
/// store never looks inside either. Secondary index bookkeeping lives in
/// the same key space as ordinary records; the store does not know the
/// difference.
///
/// # Invariants
///
/// - `get` after a successful `set` returns the written bytes until the
///   entry expires, is overwritten, or is deleted
/// - `get_many` and `has_many` return exactly one result per requested
///   key, in request order
/// - Expired entries behave exactly like absent ones
/// - Stores must be `Send + Sync` for concurrent access
///
/// The batch methods have default implementations in terms of the
/// single-key ones; engines with native batch support should override them.
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For tests and ephemeral data
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the read.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Reads several keys at once.
    ///
    /// The result has the same length and order as `keys`.
    ///
    /// # Errors
    ///
    /// Returns an error if any read fails.
    fn get_many(&self, keys: &[String]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Returns whether a live entry exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the read.
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Checks several keys at once, preserving request order.
    ///
    /// # Errors
    ///
    /// Returns an error if any check fails.
    fn has_many(&self, keys: &[String]) -> StorageResult<Vec<bool>> {
        keys.iter().map(|key| self.has(key)).collect()
    }

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// Returns `true` if the store accepted the write.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StorageResult<bool>;

    /// Writes several entries, in order.
    ///
    /// Returns `true` if every write was accepted.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failing write.
    fn set_many(&self, entries: Vec<StoreEntry>) -> StorageResult<bool> {
        let mut all_accepted = true;
        for entry in entries {
            all_accepted &= self.set(&entry.key, entry.value, entry.ttl)?;
        }
        Ok(all_accepted)
    }

    /// Removes the entry under `key`.
    ///
    /// Returns `true` if a live entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Removes several entries.
    ///
    /// Returns `true` if at least one live entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failing delete.
    fn delete_many(&self, keys: &[String]) -> StorageResult<bool> {
        let mut removed_any = false;
        for key in keys {
            removed_any |= self.delete(key)?;
        }
        Ok(removed_any)
    }

    /// Removes every entry from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    fn clear(&self) -> StorageResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn get_many(&self, keys: &[String]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        (**self).get_many(keys)
    }

    fn has(&self, key: &str) -> StorageResult<bool> {
        (**self).has(key)
    }

    fn has_many(&self, keys: &[String]) -> StorageResult<Vec<bool>> {
        (**self).has_many(keys)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StorageResult<bool> {
        (**self).set(key, value, ttl)
    }

    fn set_many(&self, entries: Vec<StoreEntry>) -> StorageResult<bool> {
        (**self).set_many(entries)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        (**self).delete(key)
    }

    fn delete_many(&self, keys: &[String]) -> StorageResult<bool> {
        (**self).delete_many(keys)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }
}
