//! Error types for secidx core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Boxed error produced by a fallible index derivation.
pub type DeriveError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in secidx core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying key-value store error.
    #[error("storage error: {0}")]
    Storage(#[from] secidx_storage::StorageError),

    /// A record or index entry could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// An index definition was rejected at construction.
    #[error("invalid index definition '{name}': {message}")]
    InvalidIndexDefinition {
        /// Name of the offending index.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// Two index definitions share a name.
    #[error("duplicate index name: {name}")]
    DuplicateIndex {
        /// The repeated name.
        name: String,
    },

    /// A lookup named an index that was never registered.
    #[error("unknown index: {name}")]
    UnknownIndex {
        /// The requested name.
        name: String,
    },

    /// A derivation function failed while computing an index value.
    #[error("derivation failed for index '{index}': {source}")]
    Derivation {
        /// Index whose derivation failed.
        index: String,
        /// The error raised by the derivation.
        #[source]
        source: DeriveError,
    },

    /// A field selector reached a value that cannot key an index.
    #[error("index '{index}' cannot use a {kind} value as its key")]
    UnsupportedIndexValue {
        /// Index being maintained.
        index: String,
        /// Kind of the rejected value.
        kind: &'static str,
    },

    /// A custom locker returned without running the critical section.
    #[error("locker returned without running the critical section")]
    LockNotAcquired,
}

impl CoreError {
    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an invalid index definition error.
    pub fn invalid_index(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIndexDefinition {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown index error.
    pub fn unknown_index(name: impl Into<String>) -> Self {
        Self::UnknownIndex { name: name.into() }
    }

    /// Creates a derivation error.
    pub fn derivation(index: impl Into<String>, source: impl Into<DeriveError>) -> Self {
        Self::Derivation {
            index: index.into(),
            source: source.into(),
        }
    }

    /// Returns true if this is a configuration error raised at construction.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidIndexDefinition { .. } | Self::DuplicateIndex { .. }
        )
    }
}
