//! Lease records kept by renewals.

use std::time::{Duration, SystemTime};

use srvdir::Resource;

use crate::StoreConfig;

/// An instance claimed or refreshed by a renewal, and until when.
///
/// Expiry is advisory: nothing reaps an expired lease or its binding, and
/// the next renewal with the same address refreshes it.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use srvdir::Resource;
/// use srvdir_store::Lease;
///
/// let instance = Resource::parse("/zz/pp/prod/jj/0:http").unwrap();
/// let lease = Lease::new(instance, Duration::from_secs(3600));
/// assert!(!lease.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    /// The concrete instance resource allocated to the renewal key.
    instance: Resource,
    /// When this lease expires.
    expires_at: SystemTime,
}

impl Lease {
    /// Creates a lease on `instance` expiring `ttl` from now.
    #[must_use]
    pub fn new(instance: Resource, ttl: Duration) -> Self {
        Self {
            instance,
            expires_at: expiry_after(ttl),
        }
    }

    /// Sets the expiration time directly.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Returns the leased instance.
    #[must_use]
    pub const fn instance(&self) -> &Resource {
        &self.instance
    }

    /// Returns the expiration time.
    #[must_use]
    pub const fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// Returns true if this lease has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }

    /// Returns the remaining TTL, or None if expired.
    #[must_use]
    pub fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at.duration_since(SystemTime::now()).ok()
    }

    /// Extends the lease to `ttl` from now and returns the new expiry.
    pub fn refresh(&mut self, ttl: Duration) -> SystemTime {
        self.expires_at = expiry_after(ttl);
        self.expires_at
    }
}

/// The instant `ttl` from now.
///
/// `ttl` is capped at [`StoreConfig::MAX_LEASE_TTL`], so an oversized
/// duration cannot overflow the clock.
pub(crate) fn expiry_after(ttl: Duration) -> SystemTime {
    let now = SystemTime::now();
    now.checked_add(ttl.min(StoreConfig::MAX_LEASE_TTL)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Resource {
        Resource::parse("/zz/pp/prod/jj/0:http").unwrap()
    }

    #[test]
    fn new_lease_is_active() {
        let lease = Lease::new(instance(), Duration::from_secs(60));
        assert!(!lease.is_expired());
        let remaining = lease.remaining_ttl().unwrap();
        assert!(remaining.as_secs() <= 60);
        assert!(remaining.as_secs() >= 59);
    }

    #[test]
    fn expired_lease() {
        let past = SystemTime::now() - Duration::from_secs(10);
        let lease = Lease::new(instance(), Duration::from_secs(60)).with_expires_at(past);
        assert!(lease.is_expired());
        assert!(lease.remaining_ttl().is_none());
    }

    #[test]
    fn refresh_moves_expiry_forward() {
        let past = SystemTime::now() - Duration::from_secs(3600);
        let mut lease = Lease::new(instance(), Duration::from_secs(60)).with_expires_at(past);

        let expires_at = lease.refresh(Duration::from_secs(60));

        assert!(!lease.is_expired());
        assert_eq!(lease.expires_at(), expires_at);
        assert!(expires_at > past);
    }

    #[test]
    fn oversized_ttl_is_capped() {
        let lease = Lease::new(instance(), Duration::MAX);
        assert!(!lease.is_expired());
        assert!(lease.remaining_ttl().unwrap() <= StoreConfig::MAX_LEASE_TTL);
    }
}
