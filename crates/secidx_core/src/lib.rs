//! # secidx Core
//!
//! Secondary index maintenance over a key-value store.
//!
//! This crate provides:
//! - Index definitions (field projection or derivation, optional filter)
//! - Index maintenance that keeps entries consistent across single and
//!   batched writes and deletes
//! - A reentrant concurrency gate with a pluggable locker
//! - The [`SecondaryStore`] facade tying it together
//!
//! Index entries live in the same key space as records, under keys of the
//! form `$secondary-index:<index>:<value>` (see [`keys`]).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod config;
mod error;
mod gate;
mod index;
mod stats;
mod store;

pub use config::Config;
pub use error::{CoreError, CoreResult, DeriveError};
pub use gate::{Locker, PassthroughLocker, QueueLocker};
pub use index::keys;
pub use index::{IndexDefinition, IndexValue};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{BatchEntry, SecondaryStore};

pub use secidx_storage::{InMemoryStore, KeyValueStore, StorageError, StoreEntry};
