//! Configuration for the binding stores.

use std::time::Duration;

/// Configuration shared by [`MemStore`](crate::MemStore) and
/// [`CoordinatedStore`](crate::CoordinatedStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend path every binding key lives under.
    ///
    /// Only used by the coordinated store.
    /// Default: `/srv`
    pub root: String,

    /// How long a renewal lease lasts.
    ///
    /// Leases never run longer than [`StoreConfig::MAX_LEASE_TTL`].
    /// Default: 1 hour
    pub lease_ttl: Duration,

    /// How many times `declare` and `renew` retry after a revision
    /// conflict before surfacing it.
    ///
    /// None retries without bound; under sustained contention that can
    /// livelock, so callers needing bounded latency should set a limit or
    /// enforce a deadline themselves.
    /// Default: None
    pub max_conflict_retries: Option<u32>,
}

impl StoreConfig {
    /// Default backend root.
    pub const DEFAULT_ROOT: &'static str = "/srv";

    /// Default lease TTL (1 hour).
    pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(3600);

    /// Longest lease TTL honoured (100 years of 365 days).
    pub const MAX_LEASE_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend root. A trailing `/` is dropped.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        let root = root.into();
        self.root = root.trim_end_matches('/').to_string();
        self
    }

    /// Sets the lease TTL, capped at [`StoreConfig::MAX_LEASE_TTL`].
    #[must_use]
    pub fn with_lease_ttl(mut self, ttl: Duration) -> Self {
        self.lease_ttl = ttl.min(Self::MAX_LEASE_TTL);
        self
    }

    /// Caps conflict retries.
    #[must_use]
    pub const fn with_max_conflict_retries(mut self, max: u32) -> Self {
        self.max_conflict_retries = Some(max);
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: Self::DEFAULT_ROOT.to_string(),
            lease_ttl: Self::DEFAULT_LEASE_TTL,
            max_conflict_retries: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.root, "/srv");
        assert_eq!(config.lease_ttl, Duration::from_secs(3600));
        assert!(config.max_conflict_retries.is_none());
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new()
            .with_root("/services/")
            .with_lease_ttl(Duration::from_secs(30))
            .with_max_conflict_retries(5);

        assert_eq!(config.root, "/services");
        assert_eq!(config.lease_ttl, Duration::from_secs(30));
        assert_eq!(config.max_conflict_retries, Some(5));
    }

    #[test]
    fn lease_ttl_is_capped() {
        let config = StoreConfig::new().with_lease_ttl(Duration::MAX);
        assert_eq!(config.lease_ttl, StoreConfig::MAX_LEASE_TTL);
    }
}
