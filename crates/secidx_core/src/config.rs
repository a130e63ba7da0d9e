//! Store configuration.

use crate::gate::{Locker, QueueLocker};
use crate::index::IndexDefinition;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for opening a [`SecondaryStore`](crate::SecondaryStore).
///
/// Indexes are validated when the store is created, not when they are added
/// here.
pub struct Config<R> {
    /// Secondary indexes, in registration order.
    pub indexes: Vec<IndexDefinition<R>>,

    /// Locker guarding mutating operations (`None` = FIFO queue).
    pub locker: Option<Arc<dyn Locker>>,

    /// TTL applied to records written without an explicit one (`None` = no expiry).
    pub default_ttl: Option<Duration>,
}

impl<R> Default for Config<R> {
    fn default() -> Self {
        Self {
            indexes: Vec::new(),
            locker: None,
            default_ttl: None,
        }
    }
}

impl<R> Config<R> {
    /// Creates a configuration with no indexes and the default locker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one index.
    #[must_use]
    pub fn index(mut self, definition: IndexDefinition<R>) -> Self {
        self.indexes.push(definition);
        self
    }

    /// Adds several indexes, keeping their order.
    #[must_use]
    pub fn indexes(mut self, definitions: impl IntoIterator<Item = IndexDefinition<R>>) -> Self {
        self.indexes.extend(definitions);
        self
    }

    /// Replaces the default FIFO queue with a custom locker.
    #[must_use]
    pub fn locker(mut self, locker: impl Locker + 'static) -> Self {
        self.locker = Some(Arc::new(locker));
        self
    }

    /// Sets a TTL for writes that do not carry their own.
    #[must_use]
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub(crate) fn take_locker(&mut self) -> Arc<dyn Locker> {
        self.locker
            .take()
            .unwrap_or_else(|| Arc::new(QueueLocker::new()))
    }
}

impl<R> fmt::Debug for Config<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("indexes", &self.indexes)
            .field("custom_locker", &self.locker.is_some())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::PassthroughLocker;

    #[derive(serde::Serialize)]
    struct Person {
        age: u32,
    }

    #[test]
    fn default_config() {
        let config = Config::<Person>::default();
        assert!(config.indexes.is_empty());
        assert!(config.locker.is_none());
        assert!(config.default_ttl.is_none());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::<Person>::new()
            .index(IndexDefinition::new("byAge").field("age"))
            .indexes([IndexDefinition::new("adults")
                .derive(|p: &Person| p.age >= 18)])
            .locker(PassthroughLocker)
            .default_ttl(Duration::from_secs(60));

        let names: Vec<&str> = config.indexes.iter().map(IndexDefinition::name).collect();
        assert_eq!(names, vec!["byAge", "adults"]);
        assert!(config.locker.is_some());
        assert_eq!(config.default_ttl, Some(Duration::from_secs(60)));
    }

    #[test]
    fn missing_locker_falls_back_to_queue() {
        let mut config = Config::<Person>::new();
        let locker = config.take_locker();
        let mut ran = false;
        locker.with_lock(&mut || ran = true);
        assert!(ran);
    }
}
