//! Request handling for the directory service.
//!
//! [`Directory`] maps a method, a resource path and a body onto [`Store`]
//! calls and renders plain-text replies. It owns no listener; a server
//! feeds it requests and writes the [`Reply`] back out.
//!
//! | Request                          | Store call  | Success            |
//! |----------------------------------|-------------|--------------------|
//! | `PUT /z/p/e/j/N:svc` + `host:port` | `declare` | 201 new, 200 replaced |
//! | `PUT /z/p/e/j:svc` + `host:port`   | `renew`   | 201 claimed, 200 refreshed |
//! | `DELETE /z/p/e/j/N:svc`          | `remove`    | 200                |
//! | `GET` wildcard or fully qualified | `matching` | 200                |
//! | `GET` any other prefix           | `browse`    | 200, 404 if missing |

use std::time::SystemTime;

use http::{Method, StatusCode};
use srvdir::{ParseErrorKind, Resource};
use tracing::debug;

use crate::{Address, Binding, Store, StoreError};

const BAD_RESOURCE: &str = "URL must match /zone/product/env/job(/instance)?:service";
const BAD_ADDRESS: &str = "Body must contain host:port";
const BAD_PUT_SHAPE: &str = "the PUT resource must include a service and optionally an instance";
const PATH_TOO_LONG: &str = "Path too long";

/// A rendered reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Response status
    pub status: StatusCode,
    /// Lease expiry, set for renewals
    pub expires: Option<SystemTime>,
    /// Plain-text body, one record per line
    pub body: String,
}

impl Reply {
    fn new(status: StatusCode) -> Self {
        Self {
            status,
            expires: None,
            body: String::new(),
        }
    }

    fn error(status: StatusCode, message: &str) -> Self {
        let mut reply = Self::new(status);
        reply.body.push_str(message);
        reply.body.push('\n');
        reply
    }

    fn status_only(status: StatusCode) -> Self {
        Self::error(status, status.canonical_reason().unwrap_or_default())
    }

    fn from_store_error(err: &StoreError) -> Self {
        let status = match err {
            StoreError::InvalidResource { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::error(status, &err.to_string())
    }

    fn line(&mut self, record: &str) {
        self.body.push_str(record);
        self.body.push('\n');
    }

    fn add(&mut self, binding: &Binding) {
        self.line(&format!("add: {binding}"));
    }

    fn del(&mut self, binding: &Binding) {
        self.line(&format!("del: {binding}"));
    }
}

/// Directory service front end over a [`Store`].
///
/// # Examples
///
/// ```
/// use http::{Method, StatusCode};
/// use srvdir_store::{Directory, MemStore};
///
/// let directory = Directory::new(MemStore::with_defaults());
///
/// let reply = directory.handle(&Method::PUT, "/zone/product/env/job:http-api", b"host:port");
/// assert_eq!(reply.status, StatusCode::CREATED);
/// assert_eq!(reply.body, "add: /zone/product/env/job/0:http-api host:port\n");
///
/// let reply = directory.handle(&Method::GET, "/zone/product/env/job/*:http-api", b"");
/// assert_eq!(reply.body, "/zone/product/env/job/0:http-api host:port\n");
/// ```
#[derive(Debug, Clone)]
pub struct Directory<S> {
    store: S,
}

impl<S: Store> Directory<S> {
    /// Creates a directory over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Handles one request.
    #[must_use]
    pub fn handle(&self, method: &Method, path: &str, body: &[u8]) -> Reply {
        let reply = if *method == Method::PUT {
            self.put(path, body)
        } else if *method == Method::DELETE {
            self.delete(path)
        } else if *method == Method::GET {
            self.get(path)
        } else {
            Reply::status_only(StatusCode::METHOD_NOT_ALLOWED)
        };
        debug!(%method, path, status = %reply.status, "handled");
        reply
    }

    fn put(&self, path: &str, body: &[u8]) -> Reply {
        let Ok(resource) = Resource::parse(path) else {
            return Reply::error(StatusCode::BAD_REQUEST, BAD_RESOURCE);
        };
        let Some(address) = std::str::from_utf8(body)
            .ok()
            .and_then(|text| Address::parse(text).ok())
        else {
            return Reply::error(StatusCode::BAD_REQUEST, BAD_ADDRESS);
        };

        let binding = Binding::new(resource, address);
        let (has_instance, has_service) = (
            binding.resource().instance().is_set(),
            binding.resource().service().is_set(),
        );
        match (has_instance, has_service) {
            (true, true) => self.declare(&binding),
            (false, true) => self.renew(binding),
            _ => Reply::error(StatusCode::BAD_REQUEST, BAD_PUT_SHAPE),
        }
    }

    fn declare(&self, binding: &Binding) -> Reply {
        match self.store.declare(binding.clone()) {
            Ok(Some(previous)) => {
                let mut reply = Reply::new(StatusCode::OK);
                reply.del(&previous);
                reply.add(binding);
                reply
            }
            Ok(None) => {
                let mut reply = Reply::new(StatusCode::CREATED);
                reply.add(binding);
                reply
            }
            Err(err) => Reply::from_store_error(&err),
        }
    }

    fn renew(&self, binding: Binding) -> Reply {
        match self.store.renew(binding) {
            Ok(renewal) => {
                let status = if renewal.created {
                    StatusCode::CREATED
                } else {
                    StatusCode::OK
                };
                let mut reply = Reply::new(status);
                reply.expires = Some(renewal.expires_at);
                reply.add(&renewal.binding);
                reply
            }
            Err(err) => Reply::from_store_error(&err),
        }
    }

    fn delete(&self, path: &str) -> Reply {
        let Ok(resource) = Resource::parse(path) else {
            return Reply::error(StatusCode::BAD_REQUEST, BAD_RESOURCE);
        };
        match self.store.remove(&resource) {
            Ok(removed) => {
                let mut reply = Reply::new(StatusCode::OK);
                if let Some(binding) = removed {
                    reply.del(&binding);
                }
                reply
            }
            Err(err) => Reply::from_store_error(&err),
        }
    }

    fn get(&self, path: &str) -> Reply {
        match Resource::parse(path) {
            Ok(pattern) if pattern.is_any() || pattern.is_fully_qualified() => self.matching(&pattern),
            _ => self.browse(path),
        }
    }

    fn matching(&self, pattern: &Resource) -> Reply {
        match self.store.matching(pattern) {
            Ok(bindings) => {
                let mut reply = Reply::new(StatusCode::OK);
                for binding in &bindings {
                    reply.line(&binding.to_string());
                }
                reply
            }
            Err(err) => Reply::from_store_error(&err),
        }
    }

    fn browse(&self, path: &str) -> Reply {
        let prefix = match Resource::parse_partial(path) {
            Ok(prefix) => prefix,
            Err(err) => {
                let message = match err.kind {
                    ParseErrorKind::SegmentCount { .. } => PATH_TOO_LONG.to_string(),
                    _ => err.to_string(),
                };
                return Reply::error(StatusCode::BAD_REQUEST, &message);
            }
        };

        match self.store.browse(&prefix) {
            Ok(browse) if !browse.exists => Reply::status_only(StatusCode::NOT_FOUND),
            Ok(browse) => {
                let mut reply = Reply::new(StatusCode::OK);
                for child in &browse.children {
                    reply.line(&child.to_string());
                }
                reply
            }
            Err(err) => Reply::from_store_error(&err),
        }
    }
}
