//! Resource-to-address bindings.

use std::fmt;

use srvdir::Resource;

use crate::Address;

/// A resource bound to the address it can be reached at.
///
/// Stores only hold bindings for fully qualified resources; they validate
/// on the way in, so constructing a binding never fails.
///
/// # Examples
///
/// ```
/// use srvdir::Resource;
/// use srvdir_store::{Address, Binding};
///
/// let res = Resource::parse("/zone/product/env/job/1:http-api").unwrap();
/// let binding = Binding::new(res, Address::new("host1", "port"));
/// assert_eq!(binding.to_string(), "/zone/product/env/job/1:http-api host1:port");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Binding {
    resource: Resource,
    address: Address,
}

impl Binding {
    /// Creates a binding.
    #[must_use]
    pub fn new(resource: Resource, address: Address) -> Self {
        Self { resource, address }
    }

    /// Returns the resource.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Returns the address.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Splits the binding into its resource and address.
    #[must_use]
    pub fn into_parts(self) -> (Resource, Address) {
        (self.resource, self.address)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource, self.address)
    }
}
