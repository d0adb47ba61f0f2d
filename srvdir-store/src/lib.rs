//! Binding stores for the `srvdir` service directory.
//!
//! This crate keeps track of which address each service instance can be
//! reached at. It includes:
//!
//! - **Bindings**: [`Binding`] pairs a fully qualified [`Resource`](srvdir::Resource)
//!   with an [`Address`]
//! - **Trait interface**: [`Store`] with `declare`, `renew`, `remove`,
//!   `matching` and `browse`
//! - **Reference store**: [`MemStore`], a single-process in-memory store
//! - **Coordinated store**: [`CoordinatedStore`] over any revisioned
//!   [`Coordinator`] backend, using optimistic compare-and-swap
//! - **In-memory backend**: [`MemoryTree`], a versioned tree for tests and
//!   single-process deployments
//! - **Front end**: [`Directory`] maps `PUT`/`GET`/`DELETE` requests onto a
//!   store and renders plain-text replies
//!
//! # Quick Start
//!
//! ```rust
//! use srvdir::Resource;
//! use srvdir_store::{Address, Binding, MemStore, Store};
//!
//! let store = MemStore::with_defaults();
//!
//! // Pin an address to an explicit instance
//! let res = Resource::parse("/aa/iaaa/prod/jj/0:http").unwrap();
//! store.declare(Binding::new(res, Address::new("lolcats", "8000"))).unwrap();
//!
//! // Or let the store pick the instance number
//! let key = Resource::parse("/aa/iaaa/test/jj:http").unwrap();
//! let renewal = store.renew(Binding::new(key, Address::new("lolcats", "8001"))).unwrap();
//! assert_eq!(renewal.binding.resource().to_string(), "/aa/iaaa/test/jj/0:http");
//!
//! // Find every http instance of the product, in any environment
//! let found = store.matching(&Resource::parse("/aa/iaaa/*/jj/*:http").unwrap()).unwrap();
//! assert_eq!(found.len(), 2);
//! ```
//!
//! # Renewals
//!
//! A renewal key is a resource without its instance. Renewing the same
//! key with the same address keeps returning the same instance; a new
//! address claims the lowest free instance number, filling gaps left by
//! removed instances first.
//!
//! ```rust
//! use srvdir::Resource;
//! use srvdir_store::{Address, Binding, CoordinatedStore, MemoryTree, Store};
//!
//! let store = CoordinatedStore::with_defaults(MemoryTree::new());
//! let key = Resource::parse("/zz/pp/prod/jj:http").unwrap();
//!
//! let a = store.renew(Binding::new(key.clone(), Address::new("host", "1"))).unwrap();
//! let b = store.renew(Binding::new(key.clone(), Address::new("host", "2"))).unwrap();
//! assert_eq!(b.binding.resource().to_string(), "/zz/pp/prod/jj/1:http");
//!
//! store.remove(a.binding.resource()).unwrap();
//! let c = store.renew(Binding::new(key, Address::new("host", "3"))).unwrap();
//! assert_eq!(c.binding.resource().to_string(), "/zz/pp/prod/jj/0:http");
//! ```
//!
//! # Browsing
//!
//! ```rust
//! use srvdir::Resource;
//! use srvdir_store::{Address, Binding, MemStore, Store};
//!
//! let store = MemStore::with_defaults();
//! for path in ["/zz/p1/prod/jj/0:http", "/zz/p2/prod/jj/0:http"] {
//!     let res = Resource::parse(path).unwrap();
//!     store.declare(Binding::new(res, Address::new("host", "80"))).unwrap();
//! }
//!
//! let root = store.browse(&Resource::root()).unwrap();
//! assert_eq!(root.children, vec![Resource::parse_partial("/zz").unwrap()]);
//!
//! let zone = store.browse(&Resource::parse_partial("/zz").unwrap()).unwrap();
//! assert_eq!(zone.children.len(), 2);
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod address;
mod binding;
pub mod codec;
mod config;
mod coordinated;
mod coordinator;
mod directory;
mod error;
mod lease;
mod mem_store;
mod memory_tree;
mod retry;
mod store;

pub use address::{Address, AddressError};
pub use binding::Binding;
pub use codec::CodecError;
pub use config::StoreConfig;
pub use coordinated::CoordinatedStore;
pub use coordinator::{CoordError, Coordinator, Revision, WalkEntry};
pub use directory::{Directory, Reply};
pub use error::StoreError;
pub use lease::Lease;
pub use mem_store::MemStore;
pub use memory_tree::MemoryTree;
pub use retry::retry_on_conflict;
pub use store::{first_free_slot, Browse, Renewal, Store};
