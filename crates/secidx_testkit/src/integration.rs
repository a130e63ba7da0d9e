//! Cross-crate integration test helpers.
//!
//! Provides a membership checker that compares every index entry in a
//! store with what the stored records say it should contain, and a
//! harness that mirrors operations into a model for verification.

use crate::fixtures::{standard_config, test_store, Person, TestStore};
use crate::generators::StoreOperation;
use secidx_core::keys::{self, INDEX_NAMESPACE};
use secidx_core::{BatchEntry, CoreResult};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// The value an index is expected to file a record under.
#[derive(Clone, Copy)]
pub struct ExpectedIndex {
    /// Index name.
    pub name: &'static str,
    /// Index value as text, or `None` if the record is filtered out.
    pub value_of: fn(&Person) -> Option<String>,
}

/// Expectations matching [`standard_indexes`](crate::fixtures::standard_indexes).
pub fn standard_expectations() -> Vec<ExpectedIndex> {
    vec![
        ExpectedIndex {
            name: "age",
            value_of: |p| Some(p.age.to_string()),
        },
        ExpectedIndex {
            name: "senior",
            value_of: |p| (p.age > 30).then(|| p.age.to_string()),
        },
        ExpectedIndex {
            name: "lastName",
            value_of: |p| Some(p.last_name.clone()),
        },
        ExpectedIndex {
            name: "initial",
            value_of: |p| Some(p.last_name.chars().take(1).collect()),
        },
        ExpectedIndex {
            name: "city",
            value_of: |p| Some(p.city.clone().unwrap_or_else(|| "null".to_string())),
        },
    ]
}

/// Reads every record in `store`, keyed by primary key.
pub fn stored_records(store: &TestStore) -> CoreResult<BTreeMap<String, Person>> {
    let mut records = BTreeMap::new();
    for key in store.backend().keys() {
        if keys::is_reserved(&key) {
            continue;
        }
        if let Some(person) = store.get(&key)? {
            records.insert(key, person);
        }
    }
    Ok(records)
}

/// Checks index membership and duplicate-freedom for every index.
///
/// For each expected index, every stored record whose value is defined
/// must be a member of exactly the entry for that value, and no entry may
/// hold a key twice or hold a key that does not belong there.
///
/// Returns a description of the first violation found.
pub fn check_membership(store: &TestStore, expected: &[ExpectedIndex]) -> Result<(), String> {
    let records = stored_records(store).map_err(|e| format!("failed to read records: {e}"))?;
    let all_keys = store.backend().keys();

    for index in expected {
        let mut wanted: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (key, person) in &records {
            if let Some(value) = (index.value_of)(person) {
                wanted.entry(value).or_default().insert(key.clone());
            }
        }

        let prefix = format!("{INDEX_NAMESPACE}:{}:", index.name);
        let mut values: BTreeSet<String> = wanted.keys().cloned().collect();
        values.extend(
            all_keys
                .iter()
                .filter_map(|key| key.strip_prefix(&prefix))
                .map(str::to_string),
        );

        for value in values {
            let members = store
                .index_members(index.name, value.as_str())
                .map_err(|e| format!("failed to read {}:{value}: {e}", index.name))?
                .unwrap_or_default();

            if let Some(dup) = first_duplicate(&members) {
                return Err(format!(
                    "key '{dup}' appears twice in {}:{value}",
                    index.name
                ));
            }

            let actual: BTreeSet<String> = members.into_iter().collect();
            let expected_members = wanted.remove(&value).unwrap_or_default();
            if actual != expected_members {
                return Err(format!(
                    "{}:{value} holds {actual:?}, expected {expected_members:?}",
                    index.name
                ));
            }
        }
    }

    Ok(())
}

fn first_duplicate(members: &[String]) -> Option<&String> {
    let mut seen = HashSet::new();
    members.iter().find(|member| !seen.insert(member.as_str()))
}

/// A test harness that mirrors every operation into a model.
pub struct IntegrationHarness {
    /// The store under test.
    pub store: TestStore,
    /// Records the store should hold.
    model: BTreeMap<String, Person>,
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegrationHarness {
    /// Creates a harness over a store with the standard indexes.
    pub fn new() -> Self {
        Self {
            store: test_store(standard_config()),
            model: BTreeMap::new(),
        }
    }

    /// Applies `op` to the store and to the model.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the model is left untouched in that case.
    pub fn apply(&mut self, op: &StoreOperation) -> CoreResult<()> {
        match op {
            StoreOperation::Set { key, person } => {
                self.store.set(key, person)?;
                self.model.insert(key.clone(), person.clone());
            }
            StoreOperation::Delete { key } => {
                self.store.delete(key)?;
                self.model.remove(key);
            }
            StoreOperation::SetMany { entries } => {
                self.store.set_many(
                    entries
                        .iter()
                        .map(|(key, person)| BatchEntry::new(key, person.clone())),
                )?;
                for (key, person) in entries {
                    self.model.insert(key.clone(), person.clone());
                }
            }
            StoreOperation::DeleteMany { keys } => {
                self.store.delete_many(keys)?;
                for key in keys {
                    self.model.remove(key);
                }
            }
        }
        Ok(())
    }

    /// Returns the records the store should hold.
    pub fn model(&self) -> &BTreeMap<String, Person> {
        &self.model
    }

    /// Verifies stored records against the model and index membership
    /// against the stored records.
    pub fn verify(&self) -> Result<(), String> {
        let records =
            stored_records(&self.store).map_err(|e| format!("failed to read records: {e}"))?;
        if records != self.model {
            return Err(format!(
                "store holds {:?}, model holds {:?}",
                records.keys().collect::<Vec<_>>(),
                self.model.keys().collect::<Vec<_>>()
            ));
        }
        check_membership(&self.store, &standard_expectations())
    }
}
