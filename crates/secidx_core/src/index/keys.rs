//! Reserved key namespace for index entries.
//!
//! Index entries share the key space of ordinary records and are told
//! apart only by this prefix. Any key carrying it, whether written by the
//! maintainer or by a caller, is passed straight to the store and never
//! indexed itself.

use crate::index::IndexValue;

/// Namespace that prefixes every index entry key.
pub const INDEX_NAMESPACE: &str = "$secondary-index";

/// Returns true if `key` lives in the reserved index namespace.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    key.strip_prefix(INDEX_NAMESPACE)
        .is_some_and(|rest| rest.starts_with(':'))
}

/// Builds the key of the index entry for `value` in index `index`.
///
/// The format is `$secondary-index:<index>:<value>`.
#[must_use]
pub fn entry_key(index: &str, value: &IndexValue) -> String {
    format!("{INDEX_NAMESPACE}:{index}:{value}")
}
