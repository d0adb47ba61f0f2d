//! Positional parts of a resource.

use std::fmt;

use crate::constants::{MAX_INSTANCE_LENGTH, MAX_NAME_LENGTH, WILDCARD};
use crate::error::ComponentError;

/// The six positions of a resource, in path order.
///
/// # Examples
///
/// ```
/// use srvdir::Position;
///
/// assert_eq!(Position::ALL.len(), 6);
/// assert_eq!(Position::Zone.next(), Some(Position::Product));
/// assert_eq!(Position::Service.next(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    /// Deployment zone
    Zone,
    /// Product the job belongs to
    Product,
    /// Environment (prod, staging, ...)
    Env,
    /// Job name
    Job,
    /// Numeric instance slot
    Instance,
    /// Named service exposed by the instance
    Service,
}

impl Position {
    /// All positions in path order.
    pub const ALL: [Self; 6] = [
        Self::Zone,
        Self::Product,
        Self::Env,
        Self::Job,
        Self::Instance,
        Self::Service,
    ];

    /// Returns the zero-based index of this position.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the position following this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Zone => Some(Self::Product),
            Self::Product => Some(Self::Env),
            Self::Env => Some(Self::Job),
            Self::Job => Some(Self::Instance),
            Self::Instance => Some(Self::Service),
            Self::Service => None,
        }
    }

    /// Returns the lowercase name of this position.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zone => "zone",
            Self::Product => "product",
            Self::Env => "env",
            Self::Job => "job",
            Self::Instance => "instance",
            Self::Service => "service",
        }
    }

    /// Checks a raw component against the lexical rule of this position.
    ///
    /// Names (every position but the instance) are 1-63 characters, the
    /// first a lowercase letter or `*`, the rest lowercase letters, digits
    /// or hyphens. Instances are 0-5 characters of digits or `*`.
    ///
    /// # Errors
    ///
    /// Returns `ComponentError` describing the first violation.
    pub fn validate(self, value: &str) -> Result<(), ComponentError> {
        match self {
            Self::Instance => validate_instance(value),
            _ => validate_name(value),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn validate_name(value: &str) -> Result<(), ComponentError> {
    if value.is_empty() {
        return Err(ComponentError::Empty);
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ComponentError::TooLong {
            max: MAX_NAME_LENGTH,
            actual: value.len(),
        });
    }
    for (i, c) in value.chars().enumerate() {
        let ok = if i == 0 {
            c.is_ascii_lowercase() || c == '*'
        } else {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
        };
        if !ok {
            return Err(ComponentError::InvalidChar { char: c, position: i });
        }
    }
    Ok(())
}

fn validate_instance(value: &str) -> Result<(), ComponentError> {
    if value.len() > MAX_INSTANCE_LENGTH {
        return Err(ComponentError::TooLong {
            max: MAX_INSTANCE_LENGTH,
            actual: value.len(),
        });
    }
    for (i, c) in value.chars().enumerate() {
        if !(c.is_ascii_digit() || c == '*') {
            return Err(ComponentError::InvalidChar { char: c, position: i });
        }
    }
    Ok(())
}

/// One positional component of a resource.
///
/// A part is either absent, a wildcard (`*`, matches anything) or a
/// concrete name. Being set and being a wildcard are mutually exclusive.
///
/// # Examples
///
/// ```
/// use srvdir::Part;
///
/// assert!(Part::from_component("").is_absent());
/// assert!(Part::from_component("*").is_wildcard());
/// assert!(Part::from_component("http").is_set());
/// assert_eq!(Part::named("http").name(), "http");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    /// Not specified
    #[default]
    Absent,
    /// Matches any name
    Wildcard,
    /// A concrete name
    Named(String),
}

impl Part {
    /// Creates a named part.
    ///
    /// The name is taken as-is; use [`Position::validate`] when it comes
    /// from untrusted input.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Interprets a raw path component: empty is absent, `*` is a wildcard,
    /// anything else is a name.
    #[must_use]
    pub fn from_component(component: &str) -> Self {
        match component {
            "" => Self::Absent,
            WILDCARD => Self::Wildcard,
            name => Self::Named(name.to_string()),
        }
    }

    /// Returns true if this part carries a concrete name.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Named(_))
    }

    /// Returns true if this part is a wildcard.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Returns true if this part is neither set nor a wildcard.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns true if this part is set or a wildcard, i.e. it is written
    /// out when the resource is displayed.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// Returns the textual form: the name, `*` or the empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Absent => "",
            Self::Wildcard => WILDCARD,
            Self::Named(name) => name,
        }
    }

    /// Returns true if this part, used as a query, accepts `candidate`.
    ///
    /// Wildcards and absent parts accept anything; a name accepts only the
    /// same name.
    #[must_use]
    pub fn matches(&self, candidate: &Self) -> bool {
        match self {
            Self::Absent | Self::Wildcard => true,
            Self::Named(name) => candidate.name() == name,
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
