//! Property-based test generators using proptest.
//!
//! Key and value spaces are kept small on purpose so that generated
//! operations collide: the same key is rewritten, and different keys
//! share index values.

use crate::fixtures::Person;
use proptest::prelude::*;

/// Strategy for primary keys drawn from a small pool.
pub fn key_strategy() -> impl Strategy<Value = String> {
    (0u8..12).prop_map(|n| format!("k{n}"))
}

/// Strategy for people whose index values often coincide.
pub fn person_strategy() -> impl Strategy<Value = Person> {
    (
        prop::sample::select(vec!["Ivan", "Anna", "Petr", "Olga"]),
        prop::sample::select(vec!["Ivanov", "Lukov", "Lukova", "Korchagina"]),
        25u32..40,
        prop::option::of(prop::sample::select(vec!["Kazan", "Minsk"])),
    )
        .prop_map(|(first, last, age, city)| {
            let person = Person::new(first, last, age);
            match city {
                Some(city) => person.in_city(city),
                None => person,
            }
        })
}

/// A mutating store operation.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Store one record
    Set {
        /// Primary key
        key: String,
        /// Record
        person: Person,
    },
    /// Delete one record
    Delete {
        /// Primary key
        key: String,
    },
    /// Store a batch of records
    SetMany {
        /// Key and record pairs, in batch order
        entries: Vec<(String, Person)>,
    },
    /// Delete a batch of records
    DeleteMany {
        /// Primary keys
        keys: Vec<String>,
    },
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        4 => (key_strategy(), person_strategy())
            .prop_map(|(key, person)| StoreOperation::Set { key, person }),
        2 => key_strategy().prop_map(|key| StoreOperation::Delete { key }),
        2 => prop::collection::vec((key_strategy(), person_strategy()), 1..6)
            .prop_map(|entries| StoreOperation::SetMany { entries }),
        1 => prop::collection::vec(key_strategy(), 1..5)
            .prop_map(|keys| StoreOperation::DeleteMany { keys }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
