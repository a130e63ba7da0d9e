//! Index maintenance.
//!
//! The maintainer turns a record transition (`old -> new`, or `old -> gone`)
//! into index entry edits and applies them to the store. It holds no state
//! between calls: every entry is re-read from the store before it is
//! rewritten.
//!
//! # Invariants
//!
//! - A key is removed from the entry of its old derived value whenever an
//!   old record exists, whether or not the old record passed the filter
//! - A key is added to the entry of its new derived value only when the
//!   new record passes the filter
//! - An entry never lists the same key twice
//! - Entries are shrunk, never deleted; an emptied entry stays in the store
//! - An old value that cannot be used as an index value names no entry, so
//!   there is nothing to remove; derivation failures still propagate
//!
//! Edits are not atomic with each other. Callers that need a logical
//! write to look indivisible must run it under the gate.

use crate::codec;
use crate::error::{CoreError, CoreResult};
use crate::index::definition::{IndexRegistry, RegisteredIndex};
use crate::index::{keys, IndexValue};
use crate::stats::StoreStats;
use secidx_storage::{KeyValueStore, StoreEntry};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::trace;

/// Applies index edits for record transitions.
pub(crate) struct IndexMaintainer<'a, R, S: ?Sized> {
    registry: &'a IndexRegistry<R>,
    backend: &'a S,
    stats: &'a StoreStats,
}

impl<'a, R, S> IndexMaintainer<'a, R, S>
where
    R: Serialize,
    S: KeyValueStore + ?Sized,
{
    pub(crate) fn new(registry: &'a IndexRegistry<R>, backend: &'a S, stats: &'a StoreStats) -> Self {
        Self {
            registry,
            backend,
            stats,
        }
    }

    fn read_members(&self, entry_key: &str) -> CoreResult<Option<Vec<String>>> {
        codec::decode_members(self.backend.get(entry_key)?)
    }

    fn write_members(&self, entry_key: &str, members: &[String]) -> CoreResult<()> {
        self.backend
            .set(entry_key, codec::encode_members(members)?, None)?;
        self.stats.record_index_entry_writes(1);
        Ok(())
    }

    /// Edits every index so that `key` reflects `new` instead of `old`.
    ///
    /// Indexes are processed in registration order; for each one the stale
    /// membership is removed before the new one is added. The primary
    /// record itself is not touched.
    ///
    /// # Errors
    ///
    /// Fails on the first derivation, codec or store error. Edits made to
    /// earlier indexes before the failure stay applied.
    pub(crate) fn apply(&self, key: &str, old: Option<&R>, new: Option<&R>) -> CoreResult<()> {
        for index in self.registry.iter() {
            if let Some(value) = old.map(|old| stale_value(index, old)).transpose()?.flatten() {
                let entry_key = keys::entry_key(index.name(), &value);
                if let Some(mut members) = self.read_members(&entry_key)? {
                    members.retain(|member| member != key);
                    self.write_members(&entry_key, &members)?;
                    trace!(key, entry = %entry_key, "detached from index entry");
                }
            }

            if let Some(new) = new.filter(|record| index.accepts(record)) {
                let entry_key = keys::entry_key(index.name(), &index.select(new)?);
                let mut members = self.read_members(&entry_key)?.unwrap_or_default();
                if !members.iter().any(|member| member == key) {
                    members.push(key.to_string());
                }
                self.write_members(&entry_key, &members)?;
                trace!(key, entry = %entry_key, "attached to index entry");
            }
        }
        Ok(())
    }

    /// Applies index edits and then writes (or deletes) the primary record.
    ///
    /// Returns the store's success flag for the primary write or delete.
    pub(crate) fn reconcile(
        &self,
        key: &str,
        old: Option<&R>,
        new: Option<&R>,
        ttl: Option<Duration>,
    ) -> CoreResult<bool> {
        // Encode up front so a record that cannot be stored leaves no index edits behind.
        let encoded = new.map(codec::encode).transpose()?;

        self.apply(key, old, new)?;

        match encoded {
            Some(bytes) => {
                self.stats.record_writes(1);
                Ok(self.backend.set(key, bytes, ttl)?)
            }
            None => {
                let removed = self.backend.delete(key)?;
                if removed {
                    self.stats.record_deletes(1);
                }
                Ok(removed)
            }
        }
    }

    /// Removes each key from every entry its old record belonged to.
    ///
    /// Affected entries are collected across all indexes and all keys
    /// first, read in one batch, and written back in one batch. Entries
    /// that do not exist are left alone.
    pub(crate) fn detach_many(&self, removed: &[(String, R)]) -> CoreResult<()> {
        let mut affected: Vec<(String, HashSet<&str>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (key, old) in removed {
            for index in self.registry.iter() {
                let Some(value) = stale_value(index, old)? else {
                    continue;
                };
                let entry_key = keys::entry_key(index.name(), &value);
                let slot = match positions.get(&entry_key) {
                    Some(&slot) => slot,
                    None => {
                        positions.insert(entry_key.clone(), affected.len());
                        affected.push((entry_key, HashSet::new()));
                        affected.len() - 1
                    }
                };
                affected[slot].1.insert(key.as_str());
            }
        }

        if affected.is_empty() {
            return Ok(());
        }

        let entry_keys: Vec<String> = affected.iter().map(|(k, _)| k.clone()).collect();
        let current = self.backend.get_many(&entry_keys)?;

        let mut updates = Vec::with_capacity(affected.len());
        for ((entry_key, doomed), bytes) in affected.into_iter().zip(current) {
            let Some(mut members) = codec::decode_members(bytes)? else {
                continue;
            };
            members.retain(|member| !doomed.contains(member.as_str()));
            trace!(entry = %entry_key, detached = doomed.len(), "shrinking index entry");
            updates.push(StoreEntry::new(entry_key, codec::encode_members(&members)?));
        }

        if !updates.is_empty() {
            let count = updates.len();
            self.backend.set_many(updates)?;
            self.stats.record_index_entry_writes(count);
        }
        Ok(())
    }
}

/// Derives the value whose entry may still list a key for `old`.
///
/// An unsupported value can never have been attached to an entry, so it
/// yields `None` instead of failing the removal.
fn stale_value<R: Serialize>(index: &RegisteredIndex<R>, old: &R) -> CoreResult<Option<IndexValue>> {
    match index.select(old) {
        Ok(value) => Ok(Some(value)),
        Err(CoreError::UnsupportedIndexValue { index, kind }) => {
            trace!(index = %index, kind, "old value names no index entry");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexDefinition;
    use secidx_storage::InMemoryStore;
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct Person {
        age: u32,
        last_name: String,
    }

    fn person(age: u32, last_name: &str) -> Person {
        Person {
            age,
            last_name: last_name.into(),
        }
    }

    fn registry() -> IndexRegistry<Person> {
        IndexRegistry::new(vec![
            IndexDefinition::new("byAge").field("age"),
            IndexDefinition::new("byLastName")
                .field("last_name")
                .filter(|p: &Person| p.last_name.starts_with('L')),
        ])
        .unwrap()
    }

    fn members(store: &InMemoryStore, entry: &str) -> Option<Vec<String>> {
        codec::decode_members(store.get(entry).unwrap()).unwrap()
    }

    #[test]
    fn apply_inserts_into_matching_entries() {
        let registry = registry();
        let store = InMemoryStore::new();
        let stats = StoreStats::new();
        let maintainer = IndexMaintainer::new(&registry, &store, &stats);

        maintainer
            .apply("3", None, Some(&person(17, "Lukov")))
            .unwrap();

        assert_eq!(
            members(&store, "$secondary-index:byAge:17"),
            Some(vec!["3".to_string()])
        );
        assert_eq!(
            members(&store, "$secondary-index:byLastName:Lukov"),
            Some(vec!["3".to_string()])
        );
        // primary record untouched
        assert_eq!(store.get("3").unwrap(), None);
    }

    #[test]
    fn filtered_out_record_gets_no_entry() {
        let registry = registry();
        let store = InMemoryStore::new();
        let stats = StoreStats::new();
        let maintainer = IndexMaintainer::new(&registry, &store, &stats);

        maintainer
            .apply("1", None, Some(&person(30, "Ivanova")))
            .unwrap();

        assert_eq!(members(&store, "$secondary-index:byLastName:Ivanova"), None);
        assert!(members(&store, "$secondary-index:byAge:30").is_some());
    }

    #[test]
    fn repeated_apply_does_not_duplicate() {
        let registry = registry();
        let store = InMemoryStore::new();
        let stats = StoreStats::new();
        let maintainer = IndexMaintainer::new(&registry, &store, &stats);
        let p = person(59, "Lukov");

        maintainer.apply("4", None, Some(&p)).unwrap();
        maintainer.apply("4", Some(&p), Some(&p)).unwrap();
        maintainer.apply("4", None, Some(&p)).unwrap();

        assert_eq!(
            members(&store, "$secondary-index:byAge:59"),
            Some(vec!["4".to_string()])
        );
    }

    #[test]
    fn transition_leaves_empty_old_entry() {
        let registry = registry();
        let store = InMemoryStore::new();
        let stats = StoreStats::new();
        let maintainer = IndexMaintainer::new(&registry, &store, &stats);
        let before = person(59, "Lukov");
        let after = person(40, "Korchagina");

        maintainer.apply("4", None, Some(&before)).unwrap();
        maintainer.apply("4", Some(&before), Some(&after)).unwrap();

        assert_eq!(members(&store, "$secondary-index:byAge:59"), Some(vec![]));
        assert_eq!(
            members(&store, "$secondary-index:byAge:40"),
            Some(vec!["4".to_string()])
        );
        assert_eq!(
            members(&store, "$secondary-index:byLastName:Lukov"),
            Some(vec![])
        );
        assert_eq!(
            members(&store, "$secondary-index:byLastName:Korchagina"),
            None
        );
    }

    #[test]
    fn reconcile_writes_and_deletes_primary() {
        let registry = registry();
        let store = InMemoryStore::new();
        let stats = StoreStats::new();
        let maintainer = IndexMaintainer::new(&registry, &store, &stats);
        let p = person(30, "Lukov");

        assert!(maintainer.reconcile("7", None, Some(&p), None).unwrap());
        assert!(store.get("7").unwrap().is_some());

        assert!(maintainer.reconcile("7", Some(&p), None, None).unwrap());
        assert!(store.get("7").unwrap().is_none());
        assert_eq!(members(&store, "$secondary-index:byAge:30"), Some(vec![]));

        let snap = stats.snapshot();
        assert_eq!(snap.writes, 1);
        assert_eq!(snap.deletes, 1);
    }

    #[test]
    fn detach_many_batches_shared_entries() {
        let registry = registry();
        let store = InMemoryStore::new();
        let stats = StoreStats::new();
        let maintainer = IndexMaintainer::new(&registry, &store, &stats);
        let a = person(59, "Lukov");
        let b = person(59, "Lukov");
        let c = person(17, "Lukov");

        maintainer.apply("a", None, Some(&a)).unwrap();
        maintainer.apply("b", None, Some(&b)).unwrap();
        maintainer.apply("c", None, Some(&c)).unwrap();

        let before = stats.snapshot().index_entry_writes;
        maintainer
            .detach_many(&[("a".to_string(), a), ("b".to_string(), b)])
            .unwrap();

        assert_eq!(members(&store, "$secondary-index:byAge:59"), Some(vec![]));
        assert_eq!(
            members(&store, "$secondary-index:byLastName:Lukov"),
            Some(vec!["c".to_string()])
        );
        // two distinct entries affected, each written once
        assert_eq!(stats.snapshot().index_entry_writes - before, 2);
    }

    #[test]
    fn detach_many_skips_missing_entries() {
        let registry = registry();
        let store = InMemoryStore::new();
        let stats = StoreStats::new();
        let maintainer = IndexMaintainer::new(&registry, &store, &stats);

        maintainer
            .detach_many(&[("ghost".to_string(), person(1, "Nobody"))])
            .unwrap();

        assert!(store.is_empty());
    }
}
