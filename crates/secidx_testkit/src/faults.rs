//! Fault injection for secidx stores.
//!
//! This module provides store wrappers for testing how index maintenance
//! behaves when the underlying store misbehaves or when writers race.
//!
//! ## Test Strategy
//!
//! 1. **Failing writes** - [`FaultyStore`] rejects writes to chosen keys or
//!    after a number of writes, to check error propagation and gate release;
//!    it can also be closed, failing reads and writes alike
//! 2. **Racing writers** - [`BarrierStore`] holds readers of one key until
//!    all of them have read, so unserialized writers deterministically lose
//!    each other's updates
//!
//! ## Usage
//!
//! ```rust
//! use secidx_core::{Config, SecondaryStore};
//! use secidx_testkit::{age_index, FaultyStore, Person};
//!
//! let backend = FaultyStore::in_memory();
//! backend.fail_writes_to("$secondary-index:age:");
//! let store = SecondaryStore::new(backend, Config::new().index(age_index())).unwrap();
//!
//! assert!(store.set(1, &Person::new("Ivan", "Ivanov", 30)).is_err());
//! ```

use parking_lot::Mutex;
use secidx_storage::{InMemoryStore, KeyValueStore, StorageError, StorageResult, StoreEntry};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Barrier;
use std::time::Duration;

/// A store wrapper that can reject writes.
pub struct FaultyStore<S = InMemoryStore> {
    inner: S,
    fail_prefix: Mutex<Option<String>>,
    fail_after_writes: AtomicUsize,
    writes: AtomicUsize,
    failures: AtomicUsize,
    closed: AtomicBool,
}

impl FaultyStore<InMemoryStore> {
    /// Creates a faulty store over a fresh [`InMemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(InMemoryStore::new())
    }
}

impl<S> FaultyStore<S> {
    /// Creates a faulty store wrapping `inner`. No faults are armed.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_prefix: Mutex::new(None),
            fail_after_writes: AtomicUsize::new(usize::MAX),
            writes: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Rejects every write (set or delete) to a key starting with `prefix`.
    pub fn fail_writes_to(&self, prefix: &str) {
        *self.fail_prefix.lock() = Some(prefix.to_string());
    }

    /// Rejects every write after the first `writes` successful ones.
    pub fn fail_after(&self, writes: usize) {
        self.writes.store(0, Ordering::SeqCst);
        self.fail_after_writes.store(writes, Ordering::SeqCst);
    }

    /// Closes the store: every read and write fails with
    /// [`StorageError::Closed`] until [`reset`](Self::reset).
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Disarms all faults and reopens the store.
    pub fn reset(&self) {
        self.closed.store(false, Ordering::SeqCst);
        *self.fail_prefix.lock() = None;
        self.fail_after_writes.store(usize::MAX, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }

    /// Returns how many writes were rejected so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn check_write(&self, key: &str) -> StorageResult<()> {
        self.check_open()?;
        let prefix_hit = self
            .fail_prefix
            .lock()
            .as_deref()
            .is_some_and(|prefix| key.starts_with(prefix));
        let budget_spent =
            self.writes.load(Ordering::SeqCst) >= self.fail_after_writes.load(Ordering::SeqCst);

        if prefix_hit || budget_spent {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::unavailable(format!(
                "injected failure writing '{key}'"
            )));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for FaultyStore<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.check_open()?;
        self.inner.get(key)
    }

    fn get_many(&self, keys: &[String]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        self.check_open()?;
        self.inner.get_many(keys)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StorageResult<bool> {
        self.check_write(key)?;
        self.inner.set(key, value, ttl)
    }

    fn set_many(&self, entries: Vec<StoreEntry>) -> StorageResult<bool> {
        for entry in &entries {
            self.check_write(&entry.key)?;
        }
        self.inner.set_many(entries)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.check_write(key)?;
        self.inner.delete(key)
    }

    fn delete_many(&self, keys: &[String]) -> StorageResult<bool> {
        for key in keys {
            self.check_write(key)?;
        }
        self.inner.delete_many(keys)
    }

    fn clear(&self) -> StorageResult<()> {
        self.check_open()?;
        self.inner.clear()
    }
}

/// A store wrapper that makes concurrent readers of one key wait for each other.
///
/// The first `parties` reads of the watched key each read the value and
/// then block until all `parties` reads have happened. Every such reader
/// therefore sees the value as it was before any of them could write.
/// Later reads pass straight through.
///
/// Only useful with a locker that lets writers overlap: under the default
/// queue the second reader never arrives and the first one blocks forever.
pub struct BarrierStore<S = InMemoryStore> {
    inner: S,
    watched: String,
    remaining: AtomicUsize,
    barrier: Barrier,
}

impl<S> BarrierStore<S> {
    /// Watches reads of `key`, holding the first `parties` of them together.
    pub fn new(inner: S, key: impl Into<String>, parties: usize) -> Self {
        Self {
            inner,
            watched: key.into(),
            remaining: AtomicUsize::new(parties),
            barrier: Barrier::new(parties),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn claim_slot(&self, key: &str) -> bool {
        key == self.watched
            && self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok()
    }
}

impl<S: KeyValueStore> KeyValueStore for BarrierStore<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let held = self.claim_slot(key);
        let value = self.inner.get(key)?;
        if held {
            self.barrier.wait();
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StorageResult<bool> {
        self.inner.set(key, value, ttl)
    }

    fn set_many(&self, entries: Vec<StoreEntry>) -> StorageResult<bool> {
        self.inner.set_many(entries)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.inner.delete(key)
    }

    fn delete_many(&self, keys: &[String]) -> StorageResult<bool> {
        self.inner.delete_many(keys)
    }

    fn clear(&self) -> StorageResult<()> {
        self.inner.clear()
    }
}
