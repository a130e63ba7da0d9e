//! Test fixtures and store helpers.
//!
//! Provides a sample record type, the index sets the tests use, and
//! convenience functions for building stores.

use secidx_core::{Config, IndexDefinition, SecondaryStore};
use serde::{Deserialize, Serialize};

/// The record type used throughout the tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Age in years.
    pub age: u32,
    /// Home city, if known.
    pub city: Option<String>,
}

impl Person {
    /// Creates a person without a city.
    pub fn new(first_name: &str, last_name: &str, age: u32) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
            city: None,
        }
    }

    /// Sets the home city.
    #[must_use]
    pub fn in_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }
}

/// A store of [`Person`] records over an in-memory backend.
pub type TestStore = SecondaryStore<Person>;

/// Index `age`: every person, by age.
pub fn age_index() -> IndexDefinition<Person> {
    IndexDefinition::new("age").field("age")
}

/// Index `senior`: people older than 30, by age.
pub fn senior_index() -> IndexDefinition<Person> {
    IndexDefinition::new("senior")
        .field("age")
        .filter(|p: &Person| p.age > 30)
}

/// Index `lastName`: every person, by family name.
pub fn last_name_index() -> IndexDefinition<Person> {
    IndexDefinition::new("lastName").field("last_name")
}

/// Index `initial`: every person, by the first letter of the family name.
pub fn initial_index() -> IndexDefinition<Person> {
    IndexDefinition::new("initial").derive(|p: &Person| {
        p.last_name
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default()
    })
}

/// Index `city`: every person, by city (`null` when unknown).
pub fn city_index() -> IndexDefinition<Person> {
    IndexDefinition::new("city").field_path(["city"])
}

/// All indexes above, in a fixed order.
pub fn standard_indexes() -> Vec<IndexDefinition<Person>> {
    vec![
        age_index(),
        senior_index(),
        last_name_index(),
        initial_index(),
        city_index(),
    ]
}

/// Configuration with every standard index and the default locker.
pub fn standard_config() -> Config<Person> {
    Config::new().indexes(standard_indexes())
}

/// Creates an in-memory store with `config`.
///
/// # Panics
///
/// Panics if the configuration is invalid.
pub fn test_store(config: Config<Person>) -> TestStore {
    SecondaryStore::in_memory(config).expect("Failed to build test store")
}

/// Runs a test with a fresh store carrying the standard indexes.
///
/// # Example
///
/// ```rust
/// use secidx_testkit::{with_store, Person};
///
/// with_store(|store| {
///     store.set("1", &Person::new("Ivan", "Ivanov", 30)).unwrap();
///     assert_eq!(store.get_by_index("age", 30).unwrap().len(), 1);
/// });
/// ```
pub fn with_store<F, T>(f: F) -> T
where
    F: FnOnce(&TestStore) -> T,
{
    let store = test_store(standard_config());
    f(&store)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Three people aged 30, 59 and 17 under keys `1`, `2` and `3`.
    pub fn sample_people() -> Vec<(String, Person)> {
        vec![
            ("1".to_string(), Person::new("Ivan", "Ivanov", 30)),
            ("2".to_string(), Person::new("Anna", "Lukova", 59)),
            ("3".to_string(), Person::new("Petr", "Lukov", 17)),
        ]
    }

    /// Creates a store with the standard indexes holding [`sample_people`].
    pub fn populated_store() -> TestStore {
        let store = test_store(standard_config());
        for (key, person) in sample_people() {
            store.set(&key, &person).expect("Failed to insert sample person");
        }
        store
    }

    /// Creates a store holding `count` people spread over ten ages.
    pub fn crowded_store(count: usize) -> TestStore {
        let store = test_store(standard_config());
        for i in 0..count {
            let person = Person::new(&format!("P{i}"), "Crowd", 20 + (i % 10) as u32);
            store.set(i, &person).expect("Failed to insert person");
        }
        store
    }
}
