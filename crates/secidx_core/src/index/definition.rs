//! Index definitions and the registry that validates them.

use crate::codec;
use crate::error::{CoreError, CoreResult, DeriveError};
use crate::index::IndexValue;
use ciborium::Value as CborValue;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type DeriveFn<R> = Arc<dyn Fn(&R) -> Result<IndexValue, DeriveError> + Send + Sync>;
type FilterFn<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// How an index computes its value from a record.
enum Selector<R> {
    /// Read one (possibly nested) field of the serialized record.
    Field(Vec<String>),
    /// Run an arbitrary function over the record.
    Derive(DeriveFn<R>),
}

/// Declaration of one secondary index.
///
/// Exactly one selector must be supplied: a field ([`field`](Self::field)
/// or [`field_path`](Self::field_path)) or a derivation
/// ([`derive`](Self::derive) or [`try_derive`](Self::try_derive)).
/// Definitions are validated when the store is built; a definition with no
/// selector, or with both kinds, fails construction.
///
/// # Example
///
/// ```rust
/// use secidx_core::IndexDefinition;
/// # #[derive(serde::Serialize)]
/// # struct Person { age: u32, last_name: String }
///
/// let by_age = IndexDefinition::<Person>::new("byAge")
///     .field("age")
///     .filter(|p| p.age > 30);
///
/// let by_initial = IndexDefinition::<Person>::new("byInitial")
///     .derive(|p| p.last_name.chars().next().map(String::from));
/// ```
pub struct IndexDefinition<R> {
    name: String,
    field: Option<Vec<String>>,
    derive: Option<DeriveFn<R>>,
    filter: Option<FilterFn<R>>,
}

impl<R> IndexDefinition<R> {
    /// Starts a definition for the index called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            derive: None,
            filter: None,
        }
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indexes the top-level field `field`.
    #[must_use]
    pub fn field(self, field: impl Into<String>) -> Self {
        self.field_path([field.into()])
    }

    /// Indexes a nested field, e.g. `["address", "city"]`.
    #[must_use]
    pub fn field_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field = Some(path.into_iter().map(Into::into).collect());
        self
    }

    /// Indexes the value computed by `derive`.
    #[must_use]
    pub fn derive<F, V>(mut self, derive: F) -> Self
    where
        R: 'static,
        F: Fn(&R) -> V + Send + Sync + 'static,
        V: Into<IndexValue>,
    {
        self.derive = Some(Arc::new(
            move |record: &R| -> Result<IndexValue, DeriveError> { Ok(derive(record).into()) },
        ));
        self
    }

    /// Indexes the value computed by a derivation that can fail.
    ///
    /// A failure aborts the write that triggered it with
    /// [`CoreError::Derivation`].
    #[must_use]
    pub fn try_derive<F, V, E>(mut self, derive: F) -> Self
    where
        R: 'static,
        F: Fn(&R) -> Result<V, E> + Send + Sync + 'static,
        V: Into<IndexValue>,
        E: Into<DeriveError>,
    {
        self.derive = Some(Arc::new(
            move |record: &R| -> Result<IndexValue, DeriveError> {
                derive(record).map(Into::into).map_err(Into::into)
            },
        ));
        self
    }

    /// Restricts the index to records for which `filter` holds.
    ///
    /// Without a filter every record participates.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl<R> fmt::Debug for IndexDefinition<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDefinition")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("derive", &self.derive.is_some())
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// A validated index, ready for maintenance.
pub(crate) struct RegisteredIndex<R> {
    name: String,
    selector: Selector<R>,
    filter: Option<FilterFn<R>>,
}

impl<R: Serialize> RegisteredIndex<R> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether `record` participates in this index.
    pub(crate) fn accepts(&self, record: &R) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(record))
    }

    /// Computes this index's value for `record`.
    pub(crate) fn select(&self, record: &R) -> CoreResult<IndexValue> {
        match &self.selector {
            Selector::Derive(derive) => {
                derive(record).map_err(|source| CoreError::derivation(&self.name, source))
            }
            Selector::Field(path) => {
                let tree = codec::to_value(record)?;
                match project(&tree, path) {
                    Some(value) => IndexValue::from_cbor(&self.name, value),
                    None => Ok(IndexValue::Null),
                }
            }
        }
    }
}

/// Walks `path` through nested maps.
fn project<'v>(tree: &'v CborValue, path: &[String]) -> Option<&'v CborValue> {
    path.iter().try_fold(tree, |current, field| {
        current
            .as_map()?
            .iter()
            .find(|(key, _)| key.as_text() == Some(field.as_str()))
            .map(|(_, value)| value)
    })
}

/// The ordered, validated set of index definitions of one store.
pub(crate) struct IndexRegistry<R> {
    indexes: Vec<RegisteredIndex<R>>,
}

impl<R> IndexRegistry<R> {
    /// Validates `definitions`, keeping their registration order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a definition has no selector,
    /// has both a field and a derivation, has an empty name, or repeats
    /// a name.
    pub(crate) fn new(definitions: Vec<IndexDefinition<R>>) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        let mut indexes = Vec::with_capacity(definitions.len());

        for def in definitions {
            if def.name.is_empty() {
                return Err(CoreError::invalid_index("", "index name must not be empty"));
            }
            if !seen.insert(def.name.clone()) {
                return Err(CoreError::DuplicateIndex { name: def.name });
            }

            let selector = match (def.field, def.derive) {
                (Some(path), None) if path.is_empty() => {
                    return Err(CoreError::invalid_index(def.name, "field path is empty"));
                }
                (Some(path), None) => Selector::Field(path),
                (None, Some(derive)) => Selector::Derive(derive),
                (None, None) => {
                    return Err(CoreError::invalid_index(
                        def.name,
                        "either a field or a derive function must be supplied",
                    ));
                }
                (Some(_), Some(_)) => {
                    return Err(CoreError::invalid_index(
                        def.name,
                        "a field and a derive function are mutually exclusive",
                    ));
                }
            };

            indexes.push(RegisteredIndex {
                name: def.name,
                selector,
                filter: def.filter,
            });
        }

        Ok(Self { indexes })
    }

    /// Iterates indexes in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &RegisteredIndex<R>> {
        self.indexes.iter()
    }

    /// Returns whether an index called `name` is registered.
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.indexes.iter().any(|index| index.name == name)
    }

    /// Returns index names in registration order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.indexes.iter().map(|index| index.name.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.indexes.len()
    }
}
