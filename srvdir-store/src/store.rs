//! Store trait definition for resource bindings.

use std::time::SystemTime;

use srvdir::{Part, Position, Resource};

use crate::{Binding, StoreError};

/// Outcome of [`Store::renew`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewal {
    /// The concrete instance binding the renewal holds
    pub binding: Binding,
    /// When the lease on that instance runs out
    pub expires_at: SystemTime,
    /// True if a new instance slot was claimed, false if a lease was refreshed
    pub created: bool,
}

/// Outcome of [`Store::browse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Browse {
    /// Distinct resources one level below the prefix, sorted
    pub children: Vec<Resource>,
    /// False if the prefix names no directory at all
    pub exists: bool,
}

impl Browse {
    /// A browse result for a prefix that does not exist.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            children: Vec::new(),
            exists: false,
        }
    }

    /// A browse result for an existing prefix.
    #[must_use]
    pub fn found(mut children: Vec<Resource>) -> Self {
        children.sort();
        children.dedup();
        Self {
            children,
            exists: true,
        }
    }
}

/// Binding store operations.
///
/// A store maps fully qualified resources to addresses. Implementations
/// may be in-memory ([`MemStore`](crate::MemStore)) or backed by a
/// coordination service ([`CoordinatedStore`](crate::CoordinatedStore));
/// both give the same answers for the same sequence of calls.
///
/// Methods take `&self`; implementations provide their own synchronization.
pub trait Store: Send + Sync {
    /// Binds a fully qualified resource to an address, replacing any
    /// existing binding at that exact resource.
    ///
    /// Returns the binding that was replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidResource` if the resource is not fully
    /// qualified, or a backend error.
    fn declare(&self, binding: Binding) -> Result<Option<Binding>, StoreError>;

    /// Keeps an address registered under a renewal key.
    ///
    /// The renewal key is the binding's resource without its instance. If
    /// the address already holds an instance in the key's family, that
    /// instance is refreshed; otherwise the lowest free instance number is
    /// claimed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidResource` unless zone, product, env, job
    /// and service are all named, or a backend error.
    fn renew(&self, binding: Binding) -> Result<Renewal, StoreError>;

    /// Removes the binding at a fully qualified resource.
    ///
    /// Returns the removed binding, or None if nothing was bound.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidResource` if the resource is not fully
    /// qualified, or a backend error.
    fn remove(&self, resource: &Resource) -> Result<Option<Binding>, StoreError>;

    /// Returns every binding whose resource `pattern` matches, sorted.
    ///
    /// # Errors
    ///
    /// Returns a backend error, or `StoreError::Corrupt` if the backend
    /// holds entries outside the resource grammar.
    fn matching(&self, pattern: &Resource) -> Result<Vec<Binding>, StoreError>;

    /// Lists the distinct children one level below `prefix`.
    ///
    /// Each child is `prefix` with its first absent part filled in.
    ///
    /// # Errors
    ///
    /// Returns a backend error, or `StoreError::Corrupt` if the backend
    /// holds entries outside the resource grammar.
    fn browse(&self, prefix: &Resource) -> Result<Browse, StoreError>;
}

/// Checks that `resource` names every part.
pub(crate) fn require_fully_qualified(
    operation: &'static str,
    resource: &Resource,
) -> Result<(), StoreError> {
    if resource.is_fully_qualified() {
        Ok(())
    } else {
        Err(StoreError::invalid_resource(
            operation,
            "a fully qualified",
            resource,
        ))
    }
}

/// Checks that `resource` can be renewed and returns its renewal key.
pub(crate) fn renewal_key(resource: &Resource) -> Result<Resource, StoreError> {
    let named = [
        Position::Zone,
        Position::Product,
        Position::Env,
        Position::Job,
        Position::Service,
    ]
    .into_iter()
    .all(|position| resource.part(position).is_set());

    if named {
        Ok(resource.without_instance())
    } else {
        Err(StoreError::invalid_resource(
            "renew",
            "a named zone/product/env/job:service",
            resource,
        ))
    }
}

/// The family of instances sharing `key`'s renewal key.
pub(crate) fn family_pattern(key: &Resource) -> Resource {
    key.clone().with_part(Position::Instance, Part::Wildcard)
}

/// The level a browse of `prefix` lists.
///
/// This is the first absent part, provided every later part is absent too.
/// Fully qualified resources and prefixes with gaps have no such level.
pub(crate) fn browse_level(prefix: &Resource) -> Option<Position> {
    let level = prefix.first_absent()?;
    let mut later = level.next();
    while let Some(position) = later {
        if prefix.part(position).is_present() {
            return None;
        }
        later = position.next();
    }
    Some(level)
}

/// Returns the smallest instance number not among `taken`.
///
/// Instance names that are not plain numbers never block a slot.
///
/// # Examples
///
/// ```
/// use srvdir_store::first_free_slot;
///
/// assert_eq!(first_free_slot(["0", "2"]), 1);
/// assert_eq!(first_free_slot(["0", "1"]), 2);
/// assert_eq!(first_free_slot(Vec::<&str>::new()), 0);
/// ```
#[must_use]
pub fn first_free_slot<I, S>(taken: I) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let taken: Vec<S> = taken.into_iter().collect();
    (0..)
        .find(|slot: &u32| {
            let name = slot.to_string();
            !taken.iter().any(|t| t.as_ref() == name)
        })
        .unwrap_or(u32::MAX)
}
