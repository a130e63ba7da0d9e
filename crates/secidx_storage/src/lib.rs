//! # secidx Storage
//!
//! Key-value store contract and reference implementation for secidx.
//!
//! This crate provides the lowest-level storage abstraction. Stores are
//! **opaque key-value engines** - they map string keys to byte values and
//! never interpret what they hold. Record shapes, index bookkeeping and
//! encodings all live above this layer.
//!
//! ## Design Principles
//!
//! - Stores are simple key-value maps (get, set, delete, and batch forms)
//! - Expiry (TTL) is the store's concern, not the caller's
//! - Must be `Send + Sync` for concurrent access
//! - Batch reads preserve the order and length of the requested keys
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For tests and ephemeral data
//!
//! ## Example
//!
//! ```rust
//! use secidx_storage::{InMemoryStore, KeyValueStore};
//!
//! let store = InMemoryStore::new();
//! store.set("greeting", b"hello".to_vec(), None).unwrap();
//! assert_eq!(store.get("greeting").unwrap(), Some(b"hello".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;

pub use backend::{KeyValueStore, StoreEntry};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
