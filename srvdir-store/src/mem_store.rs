//! In-memory reference store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use srvdir::{Position, Resource};
use tracing::{debug, trace};

use crate::store::{
    browse_level, family_pattern, first_free_slot, renewal_key, require_fully_qualified,
};
use crate::{Address, Binding, Browse, Lease, Renewal, Store, StoreConfig, StoreError};

#[derive(Debug, Default)]
struct MemState {
    /// Live bindings, fully qualified resource to address
    binds: BTreeMap<Resource, Address>,
    /// Instances claimed or refreshed by `renew`
    leases: HashMap<Resource, Lease>,
}

/// In-memory binding store.
///
/// Single-process implementation of [`Store`] that answers every call by
/// direct lookup and iteration over its maps. All state sits behind one
/// `Mutex`, so each operation is atomic with respect to the others,
/// including the scan-then-claim step of `renew`.
///
/// # Examples
///
/// ```
/// use srvdir::Resource;
/// use srvdir_store::{Address, Binding, MemStore, Store};
///
/// let store = MemStore::with_defaults();
///
/// let key = Resource::parse("/zone/product/env/job:http-api").unwrap();
/// let renewal = store.renew(Binding::new(key, Address::new("host", "port"))).unwrap();
///
/// assert!(renewal.created);
/// assert_eq!(renewal.binding.resource().to_string(), "/zone/product/env/job/0:http-api");
///
/// let all = store.matching(&Resource::parse("/*/*/*/*/*:*").unwrap()).unwrap();
/// assert_eq!(all.len(), 1);
/// ```
#[derive(Debug)]
pub struct MemStore {
    state: Mutex<MemState>,
    config: StoreConfig,
}

impl MemStore {
    /// Creates an empty store with the given configuration.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            state: Mutex::new(MemState::default()),
            config,
        }
    }

    /// Creates an empty store with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the number of live bindings.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Poisoned` if the state lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.binds.len())
    }

    /// Returns true if no bindings are live.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Poisoned` if the state lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.binds.is_empty())
    }

    /// Returns the lease on an instance last claimed or refreshed by
    /// `renew`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Poisoned` if the state lock is poisoned.
    pub fn lease(&self, instance: &Resource) -> Result<Option<Lease>, StoreError> {
        Ok(self.lock()?.leases.get(instance).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Store for MemStore {
    fn declare(&self, binding: Binding) -> Result<Option<Binding>, StoreError> {
        require_fully_qualified("declare", binding.resource())?;
        let (resource, address) = binding.into_parts();

        let mut state = self.lock()?;
        debug!(%resource, %address, "declare");
        let previous = state.binds.insert(resource.clone(), address);
        Ok(previous.map(|old| Binding::new(resource, old)))
    }

    fn renew(&self, binding: Binding) -> Result<Renewal, StoreError> {
        let key = renewal_key(binding.resource())?;
        let address = binding.address().clone();
        let ttl = self.config.lease_ttl;
        let family = family_pattern(&key);

        let mut state = self.lock()?;
        let MemState { binds, leases } = &mut *state;

        let held = binds
            .iter()
            .find(|(candidate, bound)| family.matches(candidate) && **bound == address)
            .map(|(candidate, _)| candidate.clone());
        if let Some(instance) = held {
            let expires_at = leases
                .entry(instance.clone())
                .and_modify(|lease| {
                    lease.refresh(ttl);
                })
                .or_insert_with(|| Lease::new(instance.clone(), ttl))
                .expires_at();
            debug!(%key, %instance, "lease refreshed");
            return Ok(Renewal {
                binding: Binding::new(instance, address),
                expires_at,
                created: false,
            });
        }

        let slot = first_free_slot(
            binds
                .keys()
                .filter(|candidate| family.matches(candidate))
                .map(|candidate| candidate.instance().name()),
        );
        let instance = key.with_instance(slot);

        binds.insert(instance.clone(), address.clone());
        let lease = Lease::new(instance.clone(), ttl);
        let expires_at = lease.expires_at();
        leases.insert(instance.clone(), lease);
        debug!(%key, %instance, %address, "instance claimed");

        Ok(Renewal {
            binding: Binding::new(instance, address),
            expires_at,
            created: true,
        })
    }

    fn remove(&self, resource: &Resource) -> Result<Option<Binding>, StoreError> {
        require_fully_qualified("remove", resource)?;

        let mut state = self.lock()?;
        let removed = state.binds.remove(resource);
        state.leases.remove(resource);
        if removed.is_some() {
            debug!(%resource, "removed");
        }
        Ok(removed.map(|address| Binding::new(resource.clone(), address)))
    }

    fn matching(&self, pattern: &Resource) -> Result<Vec<Binding>, StoreError> {
        let state = self.lock()?;
        let bindings: Vec<Binding> = state
            .binds
            .iter()
            .filter(|(resource, _)| pattern.matches(resource))
            .map(|(resource, address)| Binding::new(resource.clone(), address.clone()))
            .collect();
        trace!(%pattern, matched = bindings.len(), "matching");
        Ok(bindings)
    }

    fn browse(&self, prefix: &Resource) -> Result<Browse, StoreError> {
        let Some(level) = browse_level(prefix) else {
            return Ok(Browse::missing());
        };

        let state = self.lock()?;
        let children: Vec<Resource> = state
            .binds
            .keys()
            .filter(|candidate| {
                Position::ALL
                    .into_iter()
                    .take(level.index())
                    .all(|position| prefix.part(position) == candidate.part(position))
            })
            .map(|candidate| candidate.truncated_after(level))
            .collect();
        trace!(%prefix, %level, children = children.len(), "browse");

        if children.is_empty() && !prefix.is_root() {
            return Ok(Browse::missing());
        }
        Ok(Browse::found(children))
    }
}
