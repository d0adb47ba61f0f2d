//! Coordination backend interface.
//!
//! The coordinated store talks to a strongly consistent, revisioned
//! key-value tree through this trait. Replication, consensus and the wire
//! protocol of the backend are its own business.

use std::fmt;

use thiserror::Error;

/// A backend revision.
///
/// Revisions increase monotonically with every committed write. Each
/// entry carries the revision of the write that last touched it; a missing
/// entry has [`Revision::NONE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Revision(u64);

impl Revision {
    /// Revision of an entry that does not exist.
    pub const NONE: Self = Self(0);

    /// Creates a revision from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the revision after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors reported by a coordination backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// No entry exists at the path (at the requested revision).
    #[error("no such entry")]
    NoEntry,
    /// The entry's revision moved past the expected one.
    #[error("revision conflict")]
    Conflict,
    /// A directory operation hit a file.
    #[error("not a directory")]
    NotDirectory,
    /// The backend could not serve the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl CoordError {
    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Returns true if this error is a revision conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    /// Returns true if this error indicates a missing entry.
    #[must_use]
    pub const fn is_no_entry(&self) -> bool {
        matches!(self, Self::NoEntry)
    }
}

/// One node visited by [`Coordinator::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute path of the node
    pub path: String,
    /// True for directories
    pub is_dir: bool,
    /// True for files holding a value
    pub is_set: bool,
    /// Revision of the last write to the node (or beneath it, for directories)
    pub revision: Revision,
}

/// Revisioned hierarchical key-value backend.
///
/// Paths are absolute and `/`-separated; directories exist implicitly
/// while they have descendants. Conditional operations succeed only if
/// the entry's current revision is not newer than `expected`, so
/// `Revision::NONE` means "only if missing" and a snapshot revision means
/// "unchanged since that snapshot".
pub trait Coordinator: Send + Sync {
    /// Reads the value at `path`, at `revision` or the latest if `None`.
    ///
    /// Returns the value together with the revision of the write that
    /// produced it.
    ///
    /// # Errors
    ///
    /// Returns `CoordError::NoEntry` if nothing is stored at the path at
    /// that revision.
    fn get(&self, path: &str, revision: Option<Revision>) -> Result<(Vec<u8>, Revision), CoordError>;

    /// Writes `value` at `path` if the entry has not changed since `expected`.
    ///
    /// # Errors
    ///
    /// Returns `CoordError::Conflict` if the entry's revision is newer than
    /// `expected`.
    fn set(&self, path: &str, expected: Revision, value: &[u8]) -> Result<Revision, CoordError>;

    /// Deletes the entry at `path` if it has not changed since `expected`.
    ///
    /// Deleting a missing entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CoordError::Conflict` if the entry's revision is newer than
    /// `expected`.
    fn delete(&self, path: &str, expected: Revision) -> Result<(), CoordError>;

    /// Returns the latest committed revision.
    ///
    /// # Errors
    ///
    /// Returns `CoordError::Unavailable` if the backend cannot answer.
    fn revision(&self) -> Result<Revision, CoordError>;

    /// Lists the names of the immediate children of `path` at `revision`,
    /// in lexicographic order.
    ///
    /// # Errors
    ///
    /// Returns `CoordError::NoEntry` if no directory exists at the path,
    /// or `CoordError::NotDirectory` if the path is a file.
    fn list(&self, path: &str, revision: Revision) -> Result<Vec<String>, CoordError>;

    /// Visits `root` and every node beneath it, as of `revision`.
    ///
    /// # Errors
    ///
    /// Returns `CoordError::NoEntry` if nothing exists at or under `root`.
    fn walk(&self, root: &str, revision: Revision) -> Result<Vec<WalkEntry>, CoordError>;
}
