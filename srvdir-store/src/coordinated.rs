//! Binding store over a revisioned coordination backend.

use srvdir::Resource;
use tracing::{debug, trace, warn};

use crate::codec::{decode_child, decode_key, encode_key};
use crate::coordinator::{CoordError, Coordinator, Revision};
use crate::lease::expiry_after;
use crate::retry::retry_on_conflict;
use crate::store::{
    browse_level, family_pattern, first_free_slot, renewal_key, require_fully_qualified,
};
use crate::{Address, Binding, Browse, Renewal, Store, StoreConfig, StoreError};

/// Binding store backed by a [`Coordinator`].
///
/// Each binding is one backend file under [`StoreConfig::root`] holding
/// `host:port`. Mutations never take local locks: every write is
/// conditioned on the revision its decision was based on, and `declare`
/// and `renew` rerun their whole read-decide-write cycle when that
/// revision has moved. Reads (`matching`, `browse`) each work on a single
/// backend revision, so their results are consistent snapshots.
///
/// Empty files are treated as absent bindings.
///
/// # Examples
///
/// ```
/// use srvdir::Resource;
/// use srvdir_store::{Address, Binding, CoordinatedStore, MemoryTree, Store};
///
/// let store = CoordinatedStore::with_defaults(MemoryTree::new());
///
/// let res = Resource::parse("/zz/pp/prod/jj/0:http").unwrap();
/// store.declare(Binding::new(res.clone(), Address::new("lolcats", "8000"))).unwrap();
///
/// let found = store.matching(&Resource::parse("/zz/*/*/*/*:http").unwrap()).unwrap();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].resource(), &res);
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatedStore<C> {
    coordinator: C,
    config: StoreConfig,
}

impl<C: Coordinator> CoordinatedStore<C> {
    /// Creates a store over `coordinator`.
    #[must_use]
    pub const fn new(coordinator: C, config: StoreConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Creates a store over `coordinator` with default configuration.
    #[must_use]
    pub fn with_defaults(coordinator: C) -> Self {
        Self::new(coordinator, StoreConfig::default())
    }

    /// Returns the coordination backend.
    #[must_use]
    pub const fn coordinator(&self) -> &C {
        &self.coordinator
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn key(&self, resource: &Resource) -> String {
        encode_key(&self.config.root, resource)
    }

    /// The backend directory holding the whole tree.
    fn root_dir(&self) -> &str {
        if self.config.root.is_empty() {
            "/"
        } else {
            &self.config.root
        }
    }

    fn revision(&self) -> Result<Revision, StoreError> {
        self.coordinator
            .revision()
            .map_err(|err| StoreError::from_coord(self.root_dir(), err))
    }

    /// Reads the raw file at `path`; a missing file reads as empty at
    /// `Revision::NONE`.
    fn read(&self, path: &str, at: Option<Revision>) -> Result<(Vec<u8>, Revision), StoreError> {
        match self.coordinator.get(path, at) {
            Ok(found) => Ok(found),
            Err(CoordError::NoEntry) => Ok((Vec::new(), Revision::NONE)),
            Err(err) => Err(StoreError::from_coord(path, err)),
        }
    }

    fn write(&self, path: &str, address: &Address, expected: Revision) -> Result<Revision, StoreError> {
        self.coordinator
            .set(path, expected, address.to_string().as_bytes())
            .map_err(|err| StoreError::from_coord(path, err))
    }

    /// Every live binding `pattern` matches, as of `revision`.
    fn walk_matching(&self, pattern: &Resource, revision: Revision) -> Result<Vec<Binding>, StoreError> {
        let root = self.root_dir();
        let entries = match self.coordinator.walk(root, revision) {
            Ok(entries) => entries,
            Err(CoordError::NoEntry) => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::from_coord(root, err)),
        };

        let mut bindings = Vec::new();
        for entry in entries {
            if entry.path == root || entry.is_dir || !entry.is_set {
                continue;
            }
            let resource = decode_key(&self.config.root, &entry.path).map_err(|err| {
                warn!(path = %entry.path, %err, "foreign entry in service tree");
                StoreError::corrupt(entry.path.as_str(), err)
            })?;
            if !pattern.matches(&resource) {
                continue;
            }

            let (body, _) = self.read(&entry.path, Some(entry.revision))?;
            if let Some(address) = decode_address(&entry.path, &body)? {
                bindings.push(Binding::new(resource, address));
            }
        }
        bindings.sort();
        trace!(%pattern, %revision, matched = bindings.len(), "walked service tree");
        Ok(bindings)
    }
}

/// Decodes a stored value; empty values are absent bindings.
fn decode_address(path: &str, body: &[u8]) -> Result<Option<Address>, StoreError> {
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return Ok(None);
    }
    Address::parse(&text)
        .map(Some)
        .map_err(|source| StoreError::InvalidAddress {
            path: path.to_string(),
            source,
        })
}

impl<C: Coordinator> Store for CoordinatedStore<C> {
    fn declare(&self, binding: Binding) -> Result<Option<Binding>, StoreError> {
        require_fully_qualified("declare", binding.resource())?;
        let path = self.key(binding.resource());

        retry_on_conflict("declare", self.config.max_conflict_retries, || {
            let (body, revision) = self.read(&path, None)?;
            let previous = decode_address(&path, &body).unwrap_or_else(|err| {
                warn!(%path, %err, "replacing unreadable binding");
                None
            });

            let written = self.write(&path, binding.address(), revision)?;
            debug!(%path, address = %binding.address(), %written, "declared");
            Ok(previous.map(|address| Binding::new(binding.resource().clone(), address)))
        })
    }

    fn renew(&self, binding: Binding) -> Result<Renewal, StoreError> {
        let key = renewal_key(binding.resource())?;
        let family = family_pattern(&key);
        let address = binding.address();
        let ttl = self.config.lease_ttl;

        retry_on_conflict("renew", self.config.max_conflict_retries, || {
            let revision = self.revision()?;
            let members = self.walk_matching(&family, revision)?;

            if let Some(held) = members.iter().find(|member| member.address() == address) {
                debug!(%key, instance = %held.resource(), "renewed existing instance");
                return Ok(Renewal {
                    binding: held.clone(),
                    expires_at: expiry_after(ttl),
                    created: false,
                });
            }

            let slot = first_free_slot(members.iter().map(|member| member.resource().instance().name()));
            let instance = key.with_instance(slot);
            let path = self.key(&instance);
            self.write(&path, address, revision)?;
            debug!(%key, %instance, %address, %revision, "claimed instance");

            Ok(Renewal {
                binding: Binding::new(instance, address.clone()),
                expires_at: expiry_after(ttl),
                created: true,
            })
        })
    }

    fn remove(&self, resource: &Resource) -> Result<Option<Binding>, StoreError> {
        require_fully_qualified("remove", resource)?;
        let path = self.key(resource);

        let (body, revision) = self.read(&path, None)?;
        let Some(address) = decode_address(&path, &body)? else {
            return Ok(None);
        };

        self.coordinator
            .delete(&path, revision)
            .map_err(|err| StoreError::from_coord(path.as_str(), err))?;
        debug!(%path, %revision, "removed");
        Ok(Some(Binding::new(resource.clone(), address)))
    }

    fn matching(&self, pattern: &Resource) -> Result<Vec<Binding>, StoreError> {
        let revision = self.revision()?;
        self.walk_matching(pattern, revision)
    }

    fn browse(&self, prefix: &Resource) -> Result<Browse, StoreError> {
        if browse_level(prefix).is_none() {
            return Ok(Browse::missing());
        }
        let revision = self.revision()?;
        let dir = if prefix.is_root() {
            self.root_dir().to_string()
        } else {
            self.key(prefix)
        };

        let names = match self.coordinator.list(&dir, revision) {
            Ok(names) => names,
            Err(CoordError::NoEntry) if prefix.is_root() => return Ok(Browse::found(Vec::new())),
            Err(CoordError::NoEntry) => return Ok(Browse::missing()),
            Err(err) => return Err(StoreError::from_coord(dir, err)),
        };
        trace!(%prefix, %revision, children = names.len(), "listed");

        let children = names
            .iter()
            .map(|name| {
                decode_child(prefix, name).map_err(|err| {
                    let path = format!("{}/{name}", dir.trim_end_matches('/'));
                    warn!(%path, %err, "foreign entry in service tree");
                    StoreError::corrupt(path, err)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Browse::found(children))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::{MemoryTree, WalkEntry};

    fn res(s: &str) -> Resource {
        Resource::parse(s).unwrap()
    }

    fn bind(r: &str, host: &str, port: &str) -> Binding {
        Binding::new(res(r), Address::new(host, port))
    }

    /// Coordinator that lands a competing write just before the next
    /// conditional write or delete, once per queued interference.
    #[derive(Default)]
    struct Racing {
        tree: MemoryTree,
        interference: Mutex<Vec<(String, String)>>,
    }

    impl Racing {
        fn interfere(&self, path: &str, value: &str) {
            self.interference
                .lock()
                .unwrap()
                .push((path.to_string(), value.to_string()));
        }

        fn race(&self) {
            let next = self.interference.lock().unwrap().pop();
            if let Some((path, value)) = next {
                let latest = self.tree.revision().unwrap();
                self.tree.set(&path, latest, value.as_bytes()).unwrap();
            }
        }
    }

    impl Coordinator for Racing {
        fn get(&self, path: &str, revision: Option<Revision>) -> Result<(Vec<u8>, Revision), CoordError> {
            self.tree.get(path, revision)
        }

        fn set(&self, path: &str, expected: Revision, value: &[u8]) -> Result<Revision, CoordError> {
            self.race();
            self.tree.set(path, expected, value)
        }

        fn delete(&self, path: &str, expected: Revision) -> Result<(), CoordError> {
            self.race();
            self.tree.delete(path, expected)
        }

        fn revision(&self) -> Result<Revision, CoordError> {
            self.tree.revision()
        }

        fn list(&self, path: &str, revision: Revision) -> Result<Vec<String>, CoordError> {
            self.tree.list(path, revision)
        }

        fn walk(&self, root: &str, revision: Revision) -> Result<Vec<WalkEntry>, CoordError> {
            self.tree.walk(root, revision)
        }
    }

    #[test]
    fn declare_stores_escaped_key() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        store.declare(bind("/zz/pp/ee/jj/0:http", "lolcathost", "6060")).unwrap();

        let (value, _) = store.coordinator().get("/srv/zz/pp/ee/jj/0/.http", None).unwrap();
        assert_eq!(value, b"lolcathost:6060");
    }

    #[test]
    fn declare_replaces() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        assert!(store.declare(bind("/zz/pp/ee/jj/0:http", "lolcathost", "6060")).unwrap().is_none());

        let old = store
            .declare(bind("/zz/pp/ee/jj/0:http", "lolcathost", "5050"))
            .unwrap()
            .unwrap();
        assert_eq!(old.address(), &Address::new("lolcathost", "6060"));
    }

    #[test]
    fn declare_retries_and_reports_value_it_replaced() {
        let store = CoordinatedStore::with_defaults(Racing::default());
        store.declare(bind("/zz/pp/ee/jj/0:http", "first", "1")).unwrap();
        store.coordinator().interfere("/srv/zz/pp/ee/jj/0/.http", "racer:2");

        let old = store.declare(bind("/zz/pp/ee/jj/0:http", "mine", "3")).unwrap().unwrap();

        assert_eq!(old.address(), &Address::new("racer", "2"));
        let (value, _) = store.coordinator().get("/srv/zz/pp/ee/jj/0/.http", None).unwrap();
        assert_eq!(value, b"mine:3");
    }

    #[test]
    fn declare_overwrites_unreadable_value() {
        let tree = MemoryTree::new();
        tree.set("/srv/zz/pp/ee/jj/0/.http", Revision::NONE, b"garbage").unwrap();
        let store = CoordinatedStore::with_defaults(tree);

        let old = store.declare(bind("/zz/pp/ee/jj/0:http", "h", "1")).unwrap();
        assert!(old.is_none());
        assert_eq!(store.matching(&res("/zz/pp/ee/jj/0:http")).unwrap().len(), 1);
    }

    #[test]
    fn conflict_limit_surfaces_conflict() {
        let config = StoreConfig::default().with_max_conflict_retries(0);
        let store = CoordinatedStore::new(Racing::default(), config);
        store.coordinator().interfere("/srv/zz/pp/ee/jj/0/.http", "racer:2");

        let err = store.declare(bind("/zz/pp/ee/jj/0:http", "mine", "3")).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn renew_claims_first_instance() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        let renewal = store.renew(bind("/zz/p1/temp/jj:http", "lolcat", "8080")).unwrap();

        assert!(renewal.created);
        assert_eq!(renewal.binding.resource(), &res("/zz/p1/temp/jj/0:http"));
        assert!(renewal.expires_at > SystemTime::now());
    }

    #[test]
    fn renew_survives_oversized_lease_ttl() {
        let config = StoreConfig {
            lease_ttl: Duration::MAX,
            ..StoreConfig::default()
        };
        let store = CoordinatedStore::new(MemoryTree::new(), config);

        let renewal = store.renew(bind("/zz/pp/prod/jj:http", "h", "1")).unwrap();
        assert!(renewal.expires_at > SystemTime::now());
    }

    #[test]
    fn renew_skips_taken_slots_of_same_service() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        store.declare(bind("/zz/pp/prod/jj/0:http", "lolcats", "8000")).unwrap();
        store.declare(bind("/zz/pp/prod/jj/0:http-mgmt", "lolcats", "8001")).unwrap();
        store.declare(bind("/zz/pp/prod/jj/1:http-mgmt", "lolcats", "8002")).unwrap();

        let renewal = store.renew(bind("/zz/pp/prod/jj:http", "lolcats", "8001")).unwrap();
        assert!(renewal.created);
        assert_eq!(renewal.binding.resource(), &res("/zz/pp/prod/jj/1:http"));
    }

    #[test]
    fn renew_reuses_instance_with_same_address() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        let first = store.renew(bind("/zz/pp/prod/jj:http", "host", "1")).unwrap();
        let second = store.renew(bind("/zz/pp/prod/jj:http", "host", "1")).unwrap();

        assert!(!second.created);
        assert_eq!(second.binding, first.binding);
        assert!(second.expires_at >= first.expires_at);
    }

    #[test]
    fn renew_retry_moves_to_next_free_slot() {
        let store = CoordinatedStore::with_defaults(Racing::default());
        store.coordinator().interfere("/srv/zz/pp/prod/jj/0/.http", "racer:1");

        let renewal = store.renew(bind("/zz/pp/prod/jj:http", "mine", "2")).unwrap();

        assert!(renewal.created);
        assert_eq!(renewal.binding.resource(), &res("/zz/pp/prod/jj/1:http"));
        let family = store.matching(&res("/zz/pp/prod/jj/*:http")).unwrap();
        assert_eq!(family.len(), 2);
    }

    #[test]
    fn concurrent_renewals_claim_distinct_slots() {
        let tree = MemoryTree::new();
        let claimed = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = CoordinatedStore::with_defaults(tree.clone());
                let claimed = Arc::clone(&claimed);
                thread::spawn(move || {
                    let renewal = store
                        .renew(bind("/zz/pp/prod/jj:http", "host", &i.to_string()))
                        .unwrap();
                    claimed
                        .lock()
                        .unwrap()
                        .push(renewal.binding.resource().instance().name().to_string());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut slots: Vec<u32> = claimed
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        slots.sort_unstable();
        assert_eq!(slots, (0..8).collect::<Vec<u32>>());
    }

    #[test]
    fn remove_existing_and_missing() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        store.declare(bind("/zz/p1/temp/jj/0:http", "lolcats", "8000")).unwrap();

        let removed = store.remove(&res("/zz/p1/temp/jj/0:http")).unwrap().unwrap();
        assert_eq!(removed.address(), &Address::new("lolcats", "8000"));
        assert!(store.remove(&res("/zz/p1/temp/jj/0:http")).unwrap().is_none());
    }

    #[test]
    fn remove_conflict_is_not_retried() {
        let store = CoordinatedStore::with_defaults(Racing::default());
        store.declare(bind("/zz/p1/temp/jj/0:http", "lolcats", "8000")).unwrap();
        store.coordinator().interfere("/srv/zz/p1/temp/jj/0/.http", "racer:1");

        let err = store.remove(&res("/zz/p1/temp/jj/0:http")).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.matching(&res("/zz/p1/temp/jj/0:http")).unwrap().len(), 1);
    }

    #[test]
    fn empty_value_is_absent() {
        let tree = MemoryTree::new();
        tree.set("/srv/zz/pp/ee/jj/0/.http", Revision::NONE, b"").unwrap();
        let store = CoordinatedStore::with_defaults(tree);

        assert!(store.matching(&res("/*/*/*/*/*:*")).unwrap().is_empty());
        assert!(store.remove(&res("/zz/pp/ee/jj/0:http")).unwrap().is_none());
        assert!(store.declare(bind("/zz/pp/ee/jj/0:http", "h", "1")).unwrap().is_none());
    }

    #[test]
    fn matching_reports_foreign_entries() {
        let tree = MemoryTree::new();
        tree.set("/srv/Bad/pp/ee/jj/0/.http", Revision::NONE, b"h:1").unwrap();
        let store = CoordinatedStore::with_defaults(tree);

        let err = store.matching(&res("/*/*/*/*/*:*")).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn matching_reports_unreadable_address() {
        let tree = MemoryTree::new();
        tree.set("/srv/zz/pp/ee/jj/0/.http", Revision::NONE, b"garbage").unwrap();
        let store = CoordinatedStore::with_defaults(tree);

        assert!(matches!(
            store.matching(&res("/*/*/*/*/*:*")),
            Err(StoreError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn matching_empty_tree() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        assert!(store.matching(&res("/*/*/*/*/*:*")).unwrap().is_empty());
    }

    #[test]
    fn browse_reports_foreign_children() {
        let tree = MemoryTree::new();
        tree.set("/srv/Bad", Revision::NONE, b"h:1").unwrap();
        let store = CoordinatedStore::with_defaults(tree);

        let err = store.browse(&Resource::root()).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn browse_and_matching_agree_on_misplaced_service() {
        let tree = MemoryTree::new();
        tree.set("/srv/zz/.http", Revision::NONE, b"h:1").unwrap();
        let store = CoordinatedStore::with_defaults(tree);

        let err = store.browse(&Resource::parse_partial("/zz").unwrap()).unwrap_err();
        assert!(err.is_corrupt());
        assert!(store.matching(&res("/*/*/*/*/*:*")).unwrap_err().is_corrupt());
    }

    #[test]
    fn browse_empty_root_exists() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        let browse = store.browse(&Resource::root()).unwrap();
        assert!(browse.exists);
        assert!(browse.children.is_empty());
    }

    #[test]
    fn browse_missing_prefix() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        store.declare(bind("/zz/pp/ee/jj/0:http", "h", "1")).unwrap();
        let browse = store.browse(&Resource::parse_partial("/yy").unwrap()).unwrap();
        assert_eq!(browse, Browse::missing());
    }

    #[test]
    fn browse_service_level() {
        let store = CoordinatedStore::with_defaults(MemoryTree::new());
        store.declare(bind("/zz/pp/ee/jj/0:http", "h", "1")).unwrap();
        store.declare(bind("/zz/pp/ee/jj/0:mgmt", "h", "2")).unwrap();

        let browse = store.browse(&res("/zz/pp/ee/jj/0")).unwrap();
        assert_eq!(browse.children, vec![res("/zz/pp/ee/jj/0:http"), res("/zz/pp/ee/jj/0:mgmt")]);
    }

    #[test]
    fn custom_root() {
        let tree = MemoryTree::new();
        let store = CoordinatedStore::new(tree.clone(), StoreConfig::new().with_root("/services/"));
        store.declare(bind("/zz/pp/ee/jj/0:http", "h", "1")).unwrap();

        assert!(tree.get("/services/zz/pp/ee/jj/0/.http", None).is_ok());
        let browse = store.browse(&Resource::root()).unwrap();
        assert_eq!(browse.children, vec![Resource::parse_partial("/zz").unwrap()]);
    }

    #[test]
    fn empty_root_uses_tree_root() {
        let store = CoordinatedStore::new(MemoryTree::new(), StoreConfig::new().with_root("/"));
        store.declare(bind("/zz/pp/ee/jj/0:http", "h", "1")).unwrap();

        assert!(store.coordinator().get("/zz/pp/ee/jj/0/.http", None).is_ok());
        assert_eq!(store.matching(&res("/*/*/*/*/*:*")).unwrap().len(), 1);
        let browse = store.browse(&Resource::root()).unwrap();
        assert_eq!(browse.children, vec![Resource::parse_partial("/zz").unwrap()]);
    }
}
