//! Mapping between resources and coordination backend paths.
//!
//! A binding for resource `r` lives at `root + escape(r)`, where the
//! service separator `:` becomes the path segment prefix `/.`:
//!
//! ```text
//! /zz/pp/prod/jj/0:http  ->  /srv/zz/pp/prod/jj/0/.http
//! ```
//!
//! Names never start with `.`, so the escaped service segment cannot
//! collide with a structural one.

use srvdir::{ComponentError, ParseError, Part, Position, Resource, SERVICE_SEPARATOR};
use thiserror::Error;

/// Escaped form of the service separator inside a backend path.
pub const ESCAPED_SERVICE_SEPARATOR: &str = "/.";

/// Errors decoding backend paths back into resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The path does not lie under the store root
    #[error("path '{path}' is outside root '{root}'")]
    OutsideRoot {
        /// The backend path
        path: String,
        /// The store root
        root: String,
    },
    /// The unescaped path is not a valid resource
    #[error("path '{path}' is not a resource: {source}")]
    Malformed {
        /// The backend path
        path: String,
        /// The parse failure
        #[source]
        source: ParseError,
    },
    /// A leaf key decoded to a resource that is not fully qualified
    #[error("path '{path}' is not a fully qualified resource")]
    NotFullyQualified {
        /// The backend path
        path: String,
    },
    /// A directory child name does not fit the level being browsed
    #[error("child '{name}' is not a valid {position}: {reason}")]
    InvalidChild {
        /// The child name as listed
        name: String,
        /// The level it was decoded at
        position: Position,
        /// Why it was rejected
        reason: String,
    },
    /// The prefix has no level left to fill
    #[error("prefix '{prefix}' has no children")]
    Exhausted {
        /// The browsed prefix
        prefix: String,
    },
}

/// Replaces the service separator with its path form.
#[must_use]
pub fn escape(path: &str) -> String {
    path.replace(SERVICE_SEPARATOR, ESCAPED_SERVICE_SEPARATOR)
}

/// Inverse of [`escape`].
#[must_use]
pub fn unescape(path: &str) -> String {
    path.replace(ESCAPED_SERVICE_SEPARATOR, &SERVICE_SEPARATOR.to_string())
}

/// Returns the backend path storing `resource` under `root`.
///
/// Partial resources map to the directory holding their descendants; the
/// root resource maps to `root` itself.
///
/// # Examples
///
/// ```
/// use srvdir::Resource;
/// use srvdir_store::codec::encode_key;
///
/// let res = Resource::parse("/zz/pp/prod/jj/0:http").unwrap();
/// assert_eq!(encode_key("/srv", &res), "/srv/zz/pp/prod/jj/0/.http");
/// assert_eq!(encode_key("/srv", &Resource::root()), "/srv");
/// ```
#[must_use]
pub fn encode_key(root: &str, resource: &Resource) -> String {
    let mut key = String::from(root);
    key.push_str(&escape(&resource.to_string()));
    key
}

/// Decodes a leaf backend path into the fully qualified resource it stores.
///
/// # Errors
///
/// Returns `CodecError` if the path is outside `root`, does not unescape to
/// a valid resource, or names a resource that is not fully qualified.
pub fn decode_key(root: &str, path: &str) -> Result<Resource, CodecError> {
    let relative = path.strip_prefix(root).ok_or_else(|| CodecError::OutsideRoot {
        path: path.to_string(),
        root: root.to_string(),
    })?;

    let resource = Resource::parse(&unescape(relative)).map_err(|source| CodecError::Malformed {
        path: path.to_string(),
        source,
    })?;

    if !resource.is_fully_qualified() {
        return Err(CodecError::NotFullyQualified {
            path: path.to_string(),
        });
    }
    Ok(resource)
}

/// Decodes the directory child `name` listed under `prefix`.
///
/// The child fills the first absent part of `prefix`. Below an instance
/// that part is the service, which is stored escaped (`.http`); every
/// other level takes the name as is.
///
/// # Errors
///
/// Returns `CodecError` if the name violates the lexical rule of the part
/// it fills, if an escaped service appears above the instance level, or if
/// `prefix` has no absent part left.
pub fn decode_child(prefix: &Resource, name: &str) -> Result<Resource, CodecError> {
    let position = prefix.first_absent().ok_or_else(|| CodecError::Exhausted {
        prefix: prefix.to_string(),
    })?;
    let component = match (position, name.strip_prefix('.')) {
        (Position::Service, Some(service)) => service,
        (Position::Service, None) => {
            return Err(invalid_child(name, position, "service segments start with '.'"));
        }
        (_, Some(_)) => {
            return Err(invalid_child(name, position, "service segment above the instance level"));
        }
        (_, None) => name,
    };

    if component.is_empty() {
        return Err(invalid_child(name, position, ComponentError::Empty));
    }
    position
        .validate(component)
        .map_err(|reason| invalid_child(name, position, reason))?;

    Ok(prefix
        .clone()
        .with_part(position, Part::from_component(component)))
}

fn invalid_child(name: &str, position: Position, reason: impl ToString) -> CodecError {
    CodecError::InvalidChild {
        name: name.to_string(),
        position,
        reason: reason.to_string(),
    }
}
