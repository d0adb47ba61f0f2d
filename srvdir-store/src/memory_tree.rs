//! In-process revisioned tree implementing [`Coordinator`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::coordinator::{CoordError, Coordinator, Revision, WalkEntry};

/// One committed write to a file.
#[derive(Debug, Clone)]
struct Version {
    revision: Revision,
    /// None marks a deletion
    value: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct TreeState {
    revision: Revision,
    /// File path to its write history, oldest first
    files: BTreeMap<String, Vec<Version>>,
}

impl TreeState {
    fn check_revision(&self, at: Revision) -> Result<(), CoordError> {
        if at > self.revision {
            return Err(CoordError::unavailable(format!(
                "revision {at} is ahead of the latest committed revision {}",
                self.revision
            )));
        }
        Ok(())
    }

    /// The version of `path` visible at `at`, if the file existed then.
    fn version_at(&self, path: &str, at: Revision) -> Option<(&[u8], Revision)> {
        let version = self
            .files
            .get(path)?
            .iter()
            .rev()
            .find(|v| v.revision <= at)?;
        version.value.as_deref().map(|value| (value, version.revision))
    }

    /// The revision of the latest write to `path`; NONE if it is missing.
    fn last_write(&self, path: &str) -> Revision {
        self.files
            .get(path)
            .and_then(|versions| versions.last())
            .filter(|v| v.value.is_some())
            .map_or(Revision::NONE, |v| v.revision)
    }

    /// Files live at `at`, with their value and revision.
    fn live_at(&self, at: Revision) -> impl Iterator<Item = (&str, &[u8], Revision)> {
        self.files.keys().filter_map(move |path| {
            self.version_at(path, at)
                .map(|(value, revision)| (path.as_str(), value, revision))
        })
    }

    fn commit(&mut self, path: &str, value: Option<Vec<u8>>) -> Revision {
        self.revision = self.revision.next();
        let revision = self.revision;
        self.files
            .entry(path.to_string())
            .or_default()
            .push(Version { revision, value });
        revision
    }
}

/// Path of `file` relative to directory `dir`, if it lies beneath it.
fn relative<'a>(dir: &str, file: &'a str) -> Option<&'a str> {
    let dir = dir.trim_end_matches('/');
    file.strip_prefix(dir)?.strip_prefix('/')
}

/// An in-memory [`Coordinator`] keeping the full write history.
///
/// Every write bumps a global revision and is recorded against its path,
/// so reads, listings and walks can be served at any past revision.
/// Directories exist implicitly while a live file sits beneath them.
/// Clones share the same tree, which lets several stores contend on it.
///
/// # Examples
///
/// ```
/// use srvdir_store::{Coordinator, MemoryTree, Revision};
///
/// let tree = MemoryTree::new();
/// let rev = tree.set("/srv/a", Revision::NONE, b"x").unwrap();
/// assert_eq!(tree.get("/srv/a", None).unwrap(), (b"x".to_vec(), rev));
/// assert_eq!(tree.list("/srv", rev).unwrap(), vec!["a".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    state: Arc<Mutex<TreeState>>,
}

impl MemoryTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, TreeState>, CoordError> {
        self.state
            .lock()
            .map_err(|_| CoordError::unavailable("tree lock poisoned"))
    }
}

impl Coordinator for MemoryTree {
    fn get(&self, path: &str, revision: Option<Revision>) -> Result<(Vec<u8>, Revision), CoordError> {
        let state = self.lock()?;
        let at = match revision {
            Some(at) => {
                state.check_revision(at)?;
                at
            }
            None => state.revision,
        };
        state
            .version_at(path, at)
            .map(|(value, rev)| (value.to_vec(), rev))
            .ok_or(CoordError::NoEntry)
    }

    fn set(&self, path: &str, expected: Revision, value: &[u8]) -> Result<Revision, CoordError> {
        let mut state = self.lock()?;
        if state.last_write(path) > expected {
            trace!(path, %expected, "set rejected");
            return Err(CoordError::Conflict);
        }
        let revision = state.commit(path, Some(value.to_vec()));
        trace!(path, %revision, "set");
        Ok(revision)
    }

    fn delete(&self, path: &str, expected: Revision) -> Result<(), CoordError> {
        let mut state = self.lock()?;
        let latest = state.revision;
        if state.version_at(path, latest).is_none() {
            return Ok(());
        }
        if state.last_write(path) > expected {
            trace!(path, %expected, "delete rejected");
            return Err(CoordError::Conflict);
        }
        let revision = state.commit(path, None);
        trace!(path, %revision, "delete");
        Ok(())
    }

    fn revision(&self) -> Result<Revision, CoordError> {
        Ok(self.lock()?.revision)
    }

    fn list(&self, path: &str, revision: Revision) -> Result<Vec<String>, CoordError> {
        let state = self.lock()?;
        state.check_revision(revision)?;

        let mut names: Vec<String> = Vec::new();
        for (file, _, _) in state.live_at(revision) {
            if file == path {
                return Err(CoordError::NotDirectory);
            }
            if let Some(rest) = relative(path, file) {
                let name = rest.split('/').next().unwrap_or(rest);
                names.push(name.to_string());
            }
        }
        if names.is_empty() {
            return Err(CoordError::NoEntry);
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn walk(&self, root: &str, revision: Revision) -> Result<Vec<WalkEntry>, CoordError> {
        let state = self.lock()?;
        state.check_revision(revision)?;

        let mut entries: BTreeMap<String, WalkEntry> = BTreeMap::new();
        for (file, _, file_rev) in state.live_at(revision) {
            if file == root {
                entries.insert(
                    file.to_string(),
                    WalkEntry {
                        path: file.to_string(),
                        is_dir: false,
                        is_set: true,
                        revision: file_rev,
                    },
                );
                continue;
            }
            let Some(rest) = relative(root, file) else {
                continue;
            };

            let mut dir = root.trim_end_matches('/').to_string();
            let mut dirs = vec![if dir.is_empty() { "/".to_string() } else { dir.clone() }];
            let segments: Vec<&str> = rest.split('/').collect();
            if let Some((_, ancestors)) = segments.split_last() {
                for segment in ancestors {
                    dir.push('/');
                    dir.push_str(segment);
                    dirs.push(dir.clone());
                }
            }
            for dir in dirs {
                let entry = entries.entry(dir.clone()).or_insert(WalkEntry {
                    path: dir,
                    is_dir: true,
                    is_set: false,
                    revision: Revision::NONE,
                });
                entry.revision = entry.revision.max(file_rev);
            }
            entries.insert(
                file.to_string(),
                WalkEntry {
                    path: file.to_string(),
                    is_dir: false,
                    is_set: true,
                    revision: file_rev,
                },
            );
        }

        if entries.is_empty() {
            return Err(CoordError::NoEntry);
        }
        Ok(entries.into_values().collect())
    }
}
