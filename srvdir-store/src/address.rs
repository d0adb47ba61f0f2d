//! Network address type for bindings.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors for `host:port` parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// No `:` separating host and port
    #[error("missing port in address '{0}'")]
    MissingPort(String),
    /// Unbracketed host containing `:`
    #[error("too many colons in address '{0}'")]
    TooManyColons(String),
    /// Bracketed host without closing `]` or with junk after it
    #[error("malformed bracketed host in address '{0}'")]
    BadBrackets(String),
}

/// Network address a service can be reached at.
///
/// The port is kept as text, exactly as registered.
///
/// # Examples
///
/// ```
/// use srvdir_store::Address;
///
/// let addr = Address::parse("lolcathost:6060\n").unwrap();
/// assert_eq!(addr.host(), "lolcathost");
/// assert_eq!(addr.port(), "6060");
/// assert_eq!(addr.to_string(), "lolcathost:6060");
///
/// let v6 = Address::parse("[::1]:80").unwrap();
/// assert_eq!(v6.host(), "::1");
/// assert_eq!(v6.to_string(), "[::1]:80");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    host: String,
    port: String,
}

impl Address {
    /// Creates an address from its host and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    /// Parses `host:port`, ignoring surrounding whitespace.
    ///
    /// IPv6 hosts must be bracketed (`[::1]:80`).
    ///
    /// # Errors
    ///
    /// Returns `AddressError` if the port is missing, an unbracketed host
    /// contains `:`, or the brackets are malformed.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();

        if let Some(rest) = input.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| AddressError::BadBrackets(input.to_string()))?;
            let port = after
                .strip_prefix(':')
                .ok_or_else(|| AddressError::BadBrackets(input.to_string()))?;
            if port.contains([':', '[', ']']) {
                return Err(AddressError::BadBrackets(input.to_string()));
            }
            return Ok(Self::new(host, port));
        }

        let (host, port) = input
            .rsplit_once(':')
            .ok_or_else(|| AddressError::MissingPort(input.to_string()))?;
        if host.contains(':') {
            return Err(AddressError::TooManyColons(input.to_string()));
        }
        if host.contains(['[', ']']) || port.contains(['[', ']']) {
            return Err(AddressError::BadBrackets(input.to_string()));
        }
        Ok(Self::new(host, port))
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port, as registered.
    #[must_use]
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
