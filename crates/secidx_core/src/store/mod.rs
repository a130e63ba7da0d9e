//! The secondary store facade.

mod batch;

pub use batch::BatchEntry;

use crate::codec;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::gate::Gate;
use crate::index::keys::{entry_key, is_reserved};
use crate::index::{IndexMaintainer, IndexRegistry, IndexValue};
use crate::stats::{StatsSnapshot, StoreStats};
use secidx_storage::{InMemoryStore, KeyValueStore, StoreEntry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::time::Duration;
use tracing::{debug, trace};

/// A key-value store with secondary indexes.
///
/// `SecondaryStore` wraps a [`KeyValueStore`] and keeps one or more
/// secondary indexes consistent with the records written through it:
/// - Reads (`get`, `get_many`, `has`, `has_many`) go straight to the store
/// - Writes and deletes update every index, then the record itself
/// - [`get_by_index`](Self::get_by_index) returns all records whose index
///   value equals a given value
///
/// Mutating calls are serialized by the store's locker (a FIFO queue
/// unless configured otherwise). Reads are not, so a reader can briefly
/// see a record whose index entries are still being updated.
///
/// Keys in the reserved `$secondary-index:` namespace are passed to the
/// underlying store untouched and are never indexed.
///
/// # Example
///
/// ```rust
/// use secidx_core::{Config, IndexDefinition, SecondaryStore};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let config = Config::new().index(IndexDefinition::new("age").field("age"));
/// let store = SecondaryStore::in_memory(config)?;
///
/// store.set(1, &Person { name: "Ivan".into(), age: 30 })?;
/// store.set(2, &Person { name: "Anna".into(), age: 59 })?;
///
/// let people = store.get_by_index("age", 59)?;
/// assert_eq!(people.len(), 1);
/// assert_eq!(people[0].name, "Anna");
/// # Ok::<(), secidx_core::CoreError>(())
/// ```
pub struct SecondaryStore<R, S = InMemoryStore> {
    /// Underlying key-value store.
    backend: S,
    /// Validated index definitions.
    registry: IndexRegistry<R>,
    /// Serializes mutating operations.
    gate: Gate,
    /// Operation counters.
    stats: StoreStats,
    /// TTL for writes without an explicit one.
    default_ttl: Option<Duration>,
}

impl<R> SecondaryStore<R, InMemoryStore>
where
    R: Serialize + DeserializeOwned,
{
    /// Creates a store over a fresh [`InMemoryStore`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an index definition is invalid.
    pub fn in_memory(config: Config<R>) -> CoreResult<Self> {
        Self::new(InMemoryStore::new(), config)
    }
}

impl<R, S> SecondaryStore<R, S>
where
    R: Serialize + DeserializeOwned,
    S: KeyValueStore,
{
    /// Creates a store over `backend`.
    ///
    /// Index definitions are validated here; no store is produced if any
    /// of them is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIndexDefinition`] or
    /// [`CoreError::DuplicateIndex`] for a bad definition.
    pub fn new(backend: S, mut config: Config<R>) -> CoreResult<Self> {
        let locker = config.take_locker();
        let registry = IndexRegistry::new(config.indexes)?;
        debug!(indexes = registry.len(), "secondary store opened");

        Ok(Self {
            backend,
            registry,
            gate: Gate::new(locker),
            stats: StoreStats::new(),
            default_ttl: config.default_ttl,
        })
    }

    fn maintainer(&self) -> IndexMaintainer<'_, R, S> {
        IndexMaintainer::new(&self.registry, &self.backend, &self.stats)
    }

    fn read_record(&self, key: &str) -> CoreResult<Option<R>> {
        codec::decode_opt(self.backend.get(key)?)
    }

    // ==================== Reads ====================

    /// Reads the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the stored bytes are not a record.
    pub fn get(&self, key: impl Display) -> CoreResult<Option<R>> {
        self.stats.record_reads(1);
        self.read_record(&key.to_string())
    }

    /// Reads several records, one result per key in request order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or any stored value is not a record.
    pub fn get_many<K: Display>(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> CoreResult<Vec<Option<R>>> {
        let keys = normalize(keys);
        self.stats.record_reads(keys.len());
        self.backend
            .get_many(&keys)?
            .into_iter()
            .map(codec::decode_opt)
            .collect()
    }

    /// Returns whether a record exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn has(&self, key: impl Display) -> CoreResult<bool> {
        self.stats.record_reads(1);
        Ok(self.backend.has(&key.to_string())?)
    }

    /// Checks several keys at once, preserving request order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn has_many<K: Display>(&self, keys: impl IntoIterator<Item = K>) -> CoreResult<Vec<bool>> {
        let keys = normalize(keys);
        self.stats.record_reads(keys.len());
        Ok(self.backend.has_many(&keys)?)
    }

    /// Returns the records whose `index` value equals `value`.
    ///
    /// Records come back in the order their keys joined the index entry.
    /// Keys whose record has since disappeared are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownIndex`] if no index is called `index`,
    /// or an error if the store fails.
    pub fn get_by_index(&self, index: &str, value: impl Into<IndexValue>) -> CoreResult<Vec<R>> {
        let members = self.index_members(index, value)?.unwrap_or_default();
        self.stats.record_index_lookup();
        if members.is_empty() {
            return Ok(Vec::new());
        }

        self.stats.record_reads(members.len());
        self.backend
            .get_many(&members)?
            .into_iter()
            .filter_map(|bytes| codec::decode_opt(bytes).transpose())
            .collect()
    }

    /// Returns the raw key list of one index entry.
    ///
    /// `None` means the entry was never created; `Some(vec![])` means it
    /// was created and later emptied.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownIndex`] if no index is called `index`,
    /// or an error if the store fails.
    pub fn index_members(
        &self,
        index: &str,
        value: impl Into<IndexValue>,
    ) -> CoreResult<Option<Vec<String>>> {
        if !self.registry.contains(index) {
            return Err(CoreError::unknown_index(index));
        }
        let entry = entry_key(index, &value.into());
        codec::decode_members(self.backend.get(&entry)?)
    }

    // ==================== Writes ====================

    /// Stores `value` under `key` and updates every index.
    ///
    /// Uses the configured default TTL. Returns the store's success flag.
    ///
    /// # Errors
    ///
    /// Returns an error if an index value cannot be derived or the store
    /// fails. Index edits made before the failure stay applied.
    pub fn set(&self, key: impl Display, value: &R) -> CoreResult<bool> {
        self.write(key.to_string(), value, self.default_ttl)
    }

    /// Like [`set`](Self::set), with an explicit time-to-live.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    pub fn set_with_ttl(&self, key: impl Display, value: &R, ttl: Duration) -> CoreResult<bool> {
        self.write(key.to_string(), value, Some(ttl))
    }

    fn write(&self, key: String, value: &R, ttl: Option<Duration>) -> CoreResult<bool> {
        if is_reserved(&key) {
            trace!(key, "reserved key written directly");
            self.stats.record_writes(1);
            return Ok(self.backend.set(&key, codec::encode(value)?, ttl)?);
        }

        self.gate.run(&self.stats, || {
            let old = self.read_record(&key)?;
            debug!(key, replacing = old.is_some(), "set");
            self.maintainer().reconcile(&key, old.as_ref(), Some(value), ttl)
        })
    }

    /// Removes the record under `key` from the store and from every index.
    ///
    /// Returns `true` if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if an index value cannot be derived or the store fails.
    pub fn delete(&self, key: impl Display) -> CoreResult<bool> {
        let key = key.to_string();
        if is_reserved(&key) {
            trace!(key, "reserved key deleted directly");
            let removed = self.backend.delete(&key)?;
            if removed {
                self.stats.record_deletes(1);
            }
            return Ok(removed);
        }

        self.gate.run(&self.stats, || {
            let old = self.read_record(&key)?;
            debug!(key, existed = old.is_some(), "delete");
            self.maintainer().reconcile(&key, old.as_ref(), None, None)
        })
    }

    /// Stores a batch of records.
    ///
    /// Reserved-namespace entries are written directly. The rest run under
    /// one gate acquisition, in input order: each entry sees the index
    /// edits and the pending value of every earlier entry in the batch.
    /// Records are then written with a single batched store call; when a
    /// key repeats, its last value wins.
    ///
    /// Returns `true` if the store accepted every write.
    ///
    /// # Errors
    ///
    /// Returns an error if an index value cannot be derived or the store
    /// fails. Entries processed before the failure keep their index edits,
    /// but no record of the batch is written.
    pub fn set_many(&self, entries: impl IntoIterator<Item = BatchEntry<R>>) -> CoreResult<bool> {
        let (reserved, ordinary): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| is_reserved(&entry.key));

        let mut accepted = true;
        if !reserved.is_empty() {
            let writes = reserved
                .into_iter()
                .map(|entry| -> CoreResult<StoreEntry> {
                    let bytes = codec::encode(&entry.value)?;
                    Ok(StoreEntry::new(entry.key, bytes).with_ttl(entry.ttl.or(self.default_ttl)))
                })
                .collect::<CoreResult<Vec<_>>>()?;
            trace!(entries = writes.len(), "reserved keys written directly");
            self.stats.record_writes(writes.len());
            accepted &= self.backend.set_many(writes)?;
        }

        if !ordinary.is_empty() {
            accepted &= self.gate.run(&self.stats, || self.write_batch(ordinary))?;
        }
        Ok(accepted)
    }

    fn write_batch(&self, entries: Vec<BatchEntry<R>>) -> CoreResult<bool> {
        debug!(entries = entries.len(), "set_many");
        let maintainer = self.maintainer();
        let mut pending: HashMap<String, R> = HashMap::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut writes: Vec<StoreEntry> = Vec::with_capacity(entries.len());

        for BatchEntry { key, value, ttl } in entries {
            let bytes = codec::encode(&value)?;
            let old = match pending.remove(&key) {
                Some(pending_value) => Some(pending_value),
                None => self.read_record(&key)?,
            };
            maintainer.apply(&key, old.as_ref(), Some(&value))?;

            let write = StoreEntry::new(key.clone(), bytes).with_ttl(ttl.or(self.default_ttl));
            match slots.get(&key) {
                Some(&slot) => writes[slot] = write,
                None => {
                    slots.insert(key.clone(), writes.len());
                    writes.push(write);
                }
            }
            pending.insert(key, value);
        }

        self.stats.record_writes(writes.len());
        Ok(self.backend.set_many(writes)?)
    }

    /// Removes a batch of records from the store and from every index.
    ///
    /// Reserved-namespace keys are deleted directly. The rest run under one
    /// gate acquisition: old records are read in one batch, every affected
    /// index entry is read and rewritten in one batch each, and the records
    /// are deleted in one batch. Keys with no record are ignored.
    ///
    /// Returns `true` if at least one entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if an index value cannot be derived or the store fails.
    pub fn delete_many<K: Display>(&self, keys: impl IntoIterator<Item = K>) -> CoreResult<bool> {
        let (reserved, ordinary): (Vec<String>, Vec<String>) =
            normalize(keys).into_iter().partition(|key| is_reserved(key));

        let mut removed = false;
        if !reserved.is_empty() {
            trace!(keys = reserved.len(), "reserved keys deleted directly");
            let present = self.backend.has_many(&reserved)?;
            self.stats
                .record_deletes(present.into_iter().filter(|has| *has).count());
            removed |= self.backend.delete_many(&reserved)?;
        }

        if !ordinary.is_empty() {
            removed |= self.gate.run(&self.stats, || self.delete_batch(&ordinary))?;
        }
        Ok(removed)
    }

    fn delete_batch(&self, keys: &[String]) -> CoreResult<bool> {
        debug!(keys = keys.len(), "delete_many");
        let mut existing = Vec::with_capacity(keys.len());
        for (key, bytes) in keys.iter().zip(self.backend.get_many(keys)?) {
            if let Some(record) = codec::decode_opt::<R>(bytes)? {
                existing.push((key.clone(), record));
            }
        }

        self.maintainer().detach_many(&existing)?;
        self.stats.record_deletes(existing.len());
        Ok(self.backend.delete_many(keys)?)
    }

    // ==================== Administration ====================

    /// Runs `f` as one gated operation.
    ///
    /// Every `set`, `delete` and batch call that `f` makes on this store
    /// runs inside the same gate acquisition, so the locker is asked only
    /// once and no other writer can interleave.
    ///
    /// # Errors
    ///
    /// Returns `f`'s error, or [`CoreError::LockNotAcquired`].
    pub fn locked<T>(&self, f: impl FnOnce(&Self) -> CoreResult<T>) -> CoreResult<T> {
        self.gate.run(&self.stats, || f(self))
    }

    /// Removes every record and every index entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn clear(&self) -> CoreResult<()> {
        self.gate.run(&self.stats, || {
            debug!("clear");
            Ok(self.backend.clear()?)
        })
    }

    /// Returns a snapshot of the store's counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the underlying store.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Returns index names in registration order.
    pub fn index_names(&self) -> Vec<String> {
        self.registry.names()
    }
}

impl<R, S> fmt::Debug for SecondaryStore<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryStore")
            .field("indexes", &self.registry.names())
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

fn normalize<K: Display>(keys: impl IntoIterator<Item = K>) -> Vec<String> {
    keys.into_iter().map(|key| key.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::PassthroughLocker;
    use crate::index::IndexDefinition;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: u32,
    }

    fn person(name: &str, age: u32) -> Person {
        Person {
            name: name.into(),
            age,
        }
    }

    fn by_age() -> Config<Person> {
        Config::new().index(IndexDefinition::new("age").field("age"))
    }

    fn names(people: &[Person]) -> Vec<&str> {
        people.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn lookup_by_index_in_insertion_order() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store.set(1, &person("Ivan", 30)).unwrap();
        store.set(2, &person("Anna", 59)).unwrap();
        store.set(3, &person("Petr", 17)).unwrap();

        assert_eq!(names(&store.get_by_index("age", 59).unwrap()), vec!["Anna"]);

        store.set(4, &person("Olga", 59)).unwrap();
        assert_eq!(
            names(&store.get_by_index("age", 59).unwrap()),
            vec!["Anna", "Olga"]
        );
    }

    #[test]
    fn filter_excludes_records() {
        let config = Config::new().index(
            IndexDefinition::new("senior")
                .field("age")
                .filter(|p: &Person| p.age > 30),
        );
        let store = SecondaryStore::in_memory(config).unwrap();
        store.set(1, &person("Ivan", 30)).unwrap();
        store.set(2, &person("Anna", 59)).unwrap();

        assert_eq!(store.index_members("senior", 30).unwrap(), None);
        assert_eq!(
            store.index_members("senior", 59).unwrap(),
            Some(vec!["2".to_string()])
        );
    }

    #[test]
    fn update_moves_key_and_keeps_empty_entry() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store.set("k", &person("Anna", 59)).unwrap();
        store.set("k", &person("Anna", 40)).unwrap();

        assert_eq!(store.index_members("age", 59).unwrap(), Some(vec![]));
        assert_eq!(
            store.index_members("age", 40).unwrap(),
            Some(vec!["k".to_string()])
        );
        assert!(store.get_by_index("age", 59).unwrap().is_empty());
    }

    #[test]
    fn repeated_set_does_not_duplicate() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        for _ in 0..3 {
            store.set("k", &person("Anna", 59)).unwrap();
        }
        assert_eq!(
            store.index_members("age", 59).unwrap(),
            Some(vec!["k".to_string()])
        );
    }

    #[test]
    fn delete_many_skips_absent_keys() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store.set("a", &person("Anna", 59)).unwrap();
        store.set("c", &person("Olga", 59)).unwrap();
        store.set("d", &person("Petr", 17)).unwrap();

        assert!(store.delete_many(["a", "b", "c"]).unwrap());

        assert_eq!(store.index_members("age", 59).unwrap(), Some(vec![]));
        assert_eq!(
            store.index_members("age", 17).unwrap(),
            Some(vec!["d".to_string()])
        );
        assert_eq!(store.get_many(["a", "b", "c"]).unwrap(), vec![None, None, None]);
        assert_eq!(store.stats().gate_acquisitions, 4);
        assert_eq!(store.stats().deletes, 2);
    }

    #[test]
    fn delete_removes_from_indexes() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store.set(1, &person("Anna", 59)).unwrap();

        assert!(store.delete(1).unwrap());
        assert!(!store.delete(1).unwrap());
        assert!(!store.has(1).unwrap());
        assert_eq!(store.index_members("age", 59).unwrap(), Some(vec![]));
        assert_eq!(store.stats().deletes, 1);
    }

    #[test]
    fn deletes_count_only_removed_records() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store.set("$secondary-index:raw:1", &person("Raw", 1)).unwrap();

        assert!(!store.delete("$secondary-index:raw:2").unwrap());
        assert!(store
            .delete_many(["$secondary-index:raw:1", "$secondary-index:raw:2"])
            .unwrap());
        assert!(!store.delete_many(["x", "y"]).unwrap());
        assert_eq!(store.stats().deletes, 1);
    }

    #[test]
    fn reserved_keys_bypass_indexing() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        let key = "$secondary-index:age:99";
        let record = person("Ghost", 12);

        assert!(store.set(key, &record).unwrap());
        assert_eq!(store.get(key).unwrap(), Some(record));
        assert_eq!(store.index_members("age", 12).unwrap(), None);

        let snap = store.stats();
        assert_eq!(snap.gate_acquisitions, 0);
        assert_eq!(snap.index_entry_writes, 0);

        assert!(store.delete(key).unwrap());
        assert_eq!(store.stats().gate_acquisitions, 0);
    }

    #[test]
    fn set_many_sees_earlier_entries() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store
            .set_many(vec![
                BatchEntry::new("a", person("Anna", 10)),
                BatchEntry::new("b", person("Olga", 10)),
                BatchEntry::new("a", person("Anna", 20)),
            ])
            .unwrap();

        assert_eq!(
            store.index_members("age", 10).unwrap(),
            Some(vec!["b".to_string()])
        );
        assert_eq!(
            store.index_members("age", 20).unwrap(),
            Some(vec!["a".to_string()])
        );
        assert_eq!(store.get("a").unwrap(), Some(person("Anna", 20)));
        assert_eq!(store.stats().gate_acquisitions, 1);
    }

    #[test]
    fn set_many_routes_reserved_entries_directly() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store
            .set_many(vec![
                BatchEntry::new("$secondary-index:age:1", person("Raw", 1)),
                BatchEntry::new("x", person("Ivan", 30)),
            ])
            .unwrap();

        assert_eq!(store.index_members("age", 1).unwrap(), None);
        assert_eq!(
            store.get("$secondary-index:age:1").unwrap(),
            Some(person("Raw", 1))
        );
        assert_eq!(
            store.index_members("age", 30).unwrap(),
            Some(vec!["x".to_string()])
        );
    }

    #[test]
    fn stale_members_are_skipped() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store.set("a", &person("Anna", 59)).unwrap();
        store.set("b", &person("Olga", 59)).unwrap();
        // Remove the record behind the index's back.
        store.backend().delete("a").unwrap();

        assert_eq!(names(&store.get_by_index("age", 59).unwrap()), vec!["Olga"]);
    }

    #[test]
    fn unknown_index_is_an_error() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        let err = store.get_by_index("height", 180).unwrap_err();
        assert!(matches!(err, CoreError::UnknownIndex { .. }));
    }

    #[test]
    fn invalid_definition_fails_construction() {
        let config = Config::<Person>::new().index(IndexDefinition::new("nothing"));
        let err = SecondaryStore::in_memory(config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn derivation_error_releases_gate() {
        let config = Config::new().index(IndexDefinition::new("checked").try_derive(
            |p: &Person| {
                if p.age == 13 {
                    Err("unlucky age")
                } else {
                    Ok(p.age)
                }
            },
        ));
        let store = SecondaryStore::in_memory(config).unwrap();

        let err = store.set(1, &person("Bad", 13)).unwrap_err();
        assert!(matches!(err, CoreError::Derivation { .. }));
        assert!(!store.has(1).unwrap());

        assert!(store.set(2, &person("Good", 14)).unwrap());
        assert_eq!(
            store.index_members("checked", 14).unwrap(),
            Some(vec!["2".to_string()])
        );
    }

    #[test]
    fn locked_acquires_custom_locker_once() {
        let acquisitions = Arc::new(AtomicUsize::new(0));
        let mutex = Arc::new(Mutex::new(()));
        let counter = Arc::clone(&acquisitions);
        let locker = move |critical: &mut dyn FnMut()| {
            let _held = mutex.lock();
            counter.fetch_add(1, Ordering::SeqCst);
            critical();
        };
        let store = SecondaryStore::in_memory(by_age().locker(locker)).unwrap();

        store
            .locked(|s| {
                s.set(1, &person("Anna", 59))?;
                s.set_many(vec![BatchEntry::new(2, person("Olga", 59))])?;
                s.delete(1)?;
                s.delete_many([2])
            })
            .unwrap();

        assert_eq!(acquisitions.load(Ordering::SeqCst), 1);
        assert_eq!(store.stats().reentrant_entries, 4);
        assert_eq!(store.index_members("age", 59).unwrap(), Some(vec![]));
    }

    #[test]
    fn passthrough_locker_still_maintains_indexes() {
        let store =
            SecondaryStore::in_memory(by_age().locker(PassthroughLocker)).unwrap();
        store.set(1, &person("Anna", 59)).unwrap();
        assert_eq!(names(&store.get_by_index("age", 59).unwrap()), vec!["Anna"]);
    }

    #[test]
    fn huge_ttl_keeps_record_and_releases_gate() {
        let store = SecondaryStore::in_memory(by_age().default_ttl(Duration::MAX)).unwrap();
        assert!(store.set_with_ttl(1, &person("Anna", 59), Duration::MAX).unwrap());
        assert!(store
            .set_many(vec![BatchEntry::new(2, person("Olga", 59)).ttl(Duration::MAX)])
            .unwrap());
        assert!(store.set(3, &person("Petr", 59)).unwrap());

        assert_eq!(names(&store.get_by_index("age", 59).unwrap()), vec!["Anna", "Olga", "Petr"]);
    }

    #[test]
    fn default_ttl_applies_to_plain_writes() {
        let config = by_age().default_ttl(Duration::from_millis(20));
        let store = SecondaryStore::in_memory(config).unwrap();
        store.set(1, &person("Brief", 5)).unwrap();
        store
            .set_with_ttl(2, &person("Lasting", 5), Duration::from_secs(3600))
            .unwrap();

        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(store.get(1).unwrap(), None);
        assert!(store.has(2).unwrap());
        // the index entry itself never expires; the stale member is skipped
        assert_eq!(names(&store.get_by_index("age", 5).unwrap()), vec!["Lasting"]);
    }

    #[test]
    fn clear_wipes_records_and_entries() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store.set(1, &person("Anna", 59)).unwrap();
        store.clear().unwrap();

        assert!(store.backend().is_empty());
        assert_eq!(store.index_members("age", 59).unwrap(), None);
    }

    #[test]
    fn has_many_preserves_order() {
        let store = SecondaryStore::in_memory(by_age()).unwrap();
        store.set("a", &person("Anna", 1)).unwrap();
        assert_eq!(
            store.has_many(["x", "a", "y"]).unwrap(),
            vec![false, true, false]
        );
    }

    #[test]
    fn index_names_follow_registration() {
        let config = by_age().index(IndexDefinition::new("name").field("name"));
        let store = SecondaryStore::in_memory(config).unwrap();
        assert_eq!(store.index_names(), vec!["age", "name"]);
    }
}
