//! # secidx Testkit
//!
//! Test utilities for secidx.
//!
//! This crate provides:
//! - Test fixtures: a sample record type, index sets and store helpers
//! - Fault-injecting and barrier stores for failure and race tests
//! - Property-based test generators using proptest
//! - An integration harness that checks index membership against a model
//! - Golden snapshots of index contents
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use secidx_testkit::prelude::*;
//!
//! with_store(|store| {
//!     store.set(1, &Person::new("Ivan", "Ivanov", 30)).unwrap();
//!     assert!(check_membership(store, &standard_expectations()).is_ok());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod golden;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::golden::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
pub use golden::*;
pub use integration::*;
pub use stress::*;
