//! Error types for store operations.

use thiserror::Error;

use crate::address::AddressError;
use crate::coordinator::CoordError;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The resource is not valid for the requested operation.
    #[error("{operation} expects {expected} resource, got '{resource}'")]
    InvalidResource {
        /// The operation that rejected the resource
        operation: &'static str,
        /// What the operation requires
        expected: &'static str,
        /// The rejected resource
        resource: String,
    },
    /// The backend has no entry at the path.
    #[error("no entry at '{path}'")]
    NotFound {
        /// The backend path
        path: String,
    },
    /// A conditional write lost a race against another writer.
    #[error("revision conflict at '{path}'; the entry changed since it was read")]
    Conflict {
        /// The backend path
        path: String,
    },
    /// The coordination backend failed.
    #[error("coordination backend error at '{path}': {source}")]
    Backend {
        /// The backend path
        path: String,
        /// The backend error
        #[source]
        source: CoordError,
    },
    /// The managed tree contains an entry outside the resource grammar.
    #[error("invalid path in service tree: '{path}': {reason}")]
    Corrupt {
        /// The offending backend path
        path: String,
        /// Why it could not be decoded
        reason: String,
    },
    /// A stored value is not a `host:port` address.
    #[error("invalid address stored at '{path}': {source}")]
    InvalidAddress {
        /// The backend path
        path: String,
        /// The parse failure
        #[source]
        source: AddressError,
    },
    /// The in-memory state lock was poisoned by a panicking writer.
    #[error("store state lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Creates an `InvalidResource` error.
    #[must_use]
    pub fn invalid_resource(
        operation: &'static str,
        expected: &'static str,
        resource: impl ToString,
    ) -> Self {
        Self::InvalidResource {
            operation,
            expected,
            resource: resource.to_string(),
        }
    }

    /// Creates a `Corrupt` error.
    #[must_use]
    pub fn corrupt(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Maps a coordination backend error observed at `path`.
    #[must_use]
    pub fn from_coord(path: impl Into<String>, err: CoordError) -> Self {
        let path = path.into();
        match err {
            CoordError::NoEntry => Self::NotFound { path },
            CoordError::Conflict => Self::Conflict { path },
            source => Self::Backend { path, source },
        }
    }

    /// Returns true if this error is a revision conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns true if this error indicates a missing entry.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this error indicates a foreign or damaged entry.
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}
