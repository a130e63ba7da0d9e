//! Batch write entries.

use std::fmt::Display;
use std::time::Duration;

/// One write in a [`SecondaryStore::set_many`](crate::SecondaryStore::set_many) batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry<R> {
    /// Primary key, already normalized to its string form.
    pub key: String,
    /// The record to store.
    pub value: R,
    /// Time-to-live for this record (`None` = the store's default).
    pub ttl: Option<Duration>,
}

impl<R> BatchEntry<R> {
    /// Creates an entry for `key` holding `value`.
    pub fn new(key: impl Display, value: R) -> Self {
        Self {
            key: key.to_string(),
            value,
            ttl: None,
        }
    }

    /// Sets this entry's time-to-live.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl<K: Display, R> From<(K, R)> for BatchEntry<R> {
    fn from((key, value): (K, R)) -> Self {
        Self::new(key, value)
    }
}
