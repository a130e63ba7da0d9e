//! Secondary index definitions and maintenance.
//!
//! Indexes are declared once, when the store is built, and maintained on
//! every write that goes through the store. Each index maps a value derived
//! from a record to the primary keys whose current record has that value.
//!
//! # Storage
//!
//! Index entries live in the same key space as records, under the reserved
//! `$secondary-index:<index>:<value>` keys (see [`keys`]). Their value is the
//! list of member primary keys, in insertion order.

mod definition;
pub mod keys;
mod maintainer;
mod value;

pub use definition::IndexDefinition;
pub use value::IndexValue;

pub(crate) use definition::IndexRegistry;
pub(crate) use maintainer::IndexMaintainer;
