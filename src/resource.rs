//! The hierarchical resource address.

use std::fmt;
use std::str::FromStr;

use crate::constants::{PART_COUNT, PATH_SEPARATOR, SERVICE_SEPARATOR, STRUCTURAL_SEGMENTS};
use crate::error::{ParseError, ParseErrorKind};
use crate::part::{Part, Position};

/// A service resource address.
///
/// A resource is an ordered tuple of six parts,
/// `zone/product/env/job/instance:service`, written as:
///
/// ```text
/// /zone/product/env/job[/instance][:service]
/// ```
///
/// Zone, product, env, job and service match `[a-z*][a-z0-9-]{0,62}`,
/// the instance matches `[0-9*]{0,5}`, and a component equal to `*` is a
/// wildcard.
///
/// # Examples
///
/// ```
/// use srvdir::{Position, Resource};
///
/// let res = Resource::parse("/aa/iaaa/prod/api/1:http").unwrap();
/// assert!(res.is_fully_qualified());
/// assert_eq!(res.part(Position::Instance).name(), "1");
/// assert_eq!(res.to_string(), "/aa/iaaa/prod/api/1:http");
///
/// let query = Resource::parse("/aa/iaaa/*/api/*:http").unwrap();
/// assert!(query.is_any());
/// assert!(query.matches(&res));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resource {
    zone: Part,
    product: Part,
    env: Part,
    job: Part,
    instance: Part,
    service: Part,
}

impl Resource {
    /// Returns the empty resource, with every part absent.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a resource from its parts in path order.
    #[must_use]
    pub fn from_parts(parts: [Part; PART_COUNT]) -> Self {
        let [zone, product, env, job, instance, service] = parts;
        Self {
            zone,
            product,
            env,
            job,
            instance,
            service,
        }
    }

    /// Parses a resource using the full path grammar.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if:
    /// - The input is empty or does not start with `/`
    /// - There are fewer than four or more than five path segments
    /// - The service suffix appears more than once
    /// - Any component violates the lexical rule of its position
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Self::parse_inner(input).map_err(|kind| ParseError::new(input, kind))
    }

    fn parse_inner(input: &str) -> Result<Self, ParseErrorKind> {
        if input.is_empty() {
            return Err(ParseErrorKind::Empty);
        }

        let (path, service) = match input.split_once(SERVICE_SEPARATOR) {
            Some((_, service)) if service.contains(SERVICE_SEPARATOR) => {
                return Err(ParseErrorKind::DuplicateServiceSeparator);
            }
            Some((path, service)) => (path, Some(service)),
            None => (input, None),
        };

        let rest = path
            .strip_prefix(PATH_SEPARATOR)
            .ok_or(ParseErrorKind::MissingLeadingSlash)?;

        let segments: Vec<&str> = rest.split(PATH_SEPARATOR).collect();
        if !(STRUCTURAL_SEGMENTS..=STRUCTURAL_SEGMENTS + 1).contains(&segments.len()) {
            return Err(ParseErrorKind::SegmentCount {
                min: STRUCTURAL_SEGMENTS,
                max: STRUCTURAL_SEGMENTS + 1,
                actual: segments.len(),
            });
        }

        let mut resource = Self::root();
        for (position, segment) in Position::ALL.into_iter().zip(segments) {
            resource.assign(position, segment)?;
        }
        if let Some(service) = service {
            resource.assign(Position::Service, service)?;
        }

        Ok(resource)
    }

    /// Parses a browse prefix.
    ///
    /// Surrounding slashes are ignored and up to six `/`-separated segments
    /// are assigned to the parts in path order; the sixth segment is the
    /// service. Trailing parts are left absent, so `/` yields the root.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if there are more than six segments, an
    /// interior segment is empty, or a segment violates the lexical rule
    /// of its position.
    ///
    /// # Examples
    ///
    /// ```
    /// use srvdir::Resource;
    ///
    /// let prefix = Resource::parse_partial("/zz/p1").unwrap();
    /// assert_eq!(prefix.to_string(), "/zz/p1");
    /// assert!(!prefix.is_fully_qualified());
    ///
    /// assert!(Resource::parse_partial("/").unwrap().is_root());
    /// assert!(Resource::parse_partial("/a/b/c/d/0/http/extra").is_err());
    /// ```
    pub fn parse_partial(input: &str) -> Result<Self, ParseError> {
        Self::parse_partial_inner(input).map_err(|kind| ParseError::new(input, kind))
    }

    fn parse_partial_inner(input: &str) -> Result<Self, ParseErrorKind> {
        let trimmed = input.trim_matches(PATH_SEPARATOR);
        let mut resource = Self::root();
        if trimmed.is_empty() {
            return Ok(resource);
        }

        let segments: Vec<&str> = trimmed.split(PATH_SEPARATOR).collect();
        if segments.len() > PART_COUNT {
            return Err(ParseErrorKind::SegmentCount {
                min: 0,
                max: PART_COUNT,
                actual: segments.len(),
            });
        }

        for (index, (position, segment)) in Position::ALL.into_iter().zip(segments).enumerate() {
            if segment.is_empty() {
                return Err(ParseErrorKind::EmptySegment { index });
            }
            resource.assign(position, segment)?;
        }

        Ok(resource)
    }

    fn assign(&mut self, position: Position, component: &str) -> Result<(), ParseErrorKind> {
        position
            .validate(component)
            .map_err(|reason| ParseErrorKind::InvalidComponent {
                position,
                value: component.to_string(),
                reason,
            })?;
        self.set_part(position, Part::from_component(component));
        Ok(())
    }

    /// Returns the part at the given position.
    #[must_use]
    pub const fn part(&self, position: Position) -> &Part {
        match position {
            Position::Zone => &self.zone,
            Position::Product => &self.product,
            Position::Env => &self.env,
            Position::Job => &self.job,
            Position::Instance => &self.instance,
            Position::Service => &self.service,
        }
    }

    fn part_mut(&mut self, position: Position) -> &mut Part {
        match position {
            Position::Zone => &mut self.zone,
            Position::Product => &mut self.product,
            Position::Env => &mut self.env,
            Position::Job => &mut self.job,
            Position::Instance => &mut self.instance,
            Position::Service => &mut self.service,
        }
    }

    /// Replaces the part at the given position.
    pub fn set_part(&mut self, position: Position, part: Part) {
        *self.part_mut(position) = part;
    }

    /// Returns a copy with the part at `position` replaced.
    #[must_use]
    pub fn with_part(mut self, position: Position, part: Part) -> Self {
        self.set_part(position, part);
        self
    }

    /// Returns all six parts in path order.
    #[must_use]
    pub const fn parts(&self) -> [&Part; PART_COUNT] {
        [
            &self.zone,
            &self.product,
            &self.env,
            &self.job,
            &self.instance,
            &self.service,
        ]
    }

    /// Returns the zone part.
    #[must_use]
    pub const fn zone(&self) -> &Part {
        &self.zone
    }

    /// Returns the product part.
    #[must_use]
    pub const fn product(&self) -> &Part {
        &self.product
    }

    /// Returns the env part.
    #[must_use]
    pub const fn env(&self) -> &Part {
        &self.env
    }

    /// Returns the job part.
    #[must_use]
    pub const fn job(&self) -> &Part {
        &self.job
    }

    /// Returns the instance part.
    #[must_use]
    pub const fn instance(&self) -> &Part {
        &self.instance
    }

    /// Returns the service part.
    #[must_use]
    pub const fn service(&self) -> &Part {
        &self.service
    }

    /// Returns true if every part carries a concrete name.
    #[must_use]
    pub fn is_fully_qualified(&self) -> bool {
        self.parts().iter().all(|p| p.is_set())
    }

    /// Returns true if at least one part is a wildcard.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.parts().iter().any(|p| p.is_wildcard())
    }

    /// Returns true if every part is absent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parts().iter().all(|p| p.is_absent())
    }

    /// Returns the first absent position, if any.
    #[must_use]
    pub fn first_absent(&self) -> Option<Position> {
        Position::ALL
            .into_iter()
            .find(|&position| self.part(position).is_absent())
    }

    /// Returns true if this resource, used as a query, accepts `candidate`.
    ///
    /// Parts are compared positionally: a wildcard or absent query part
    /// accepts anything, a named part accepts only the same name. Only the
    /// query side is permissive, so matching is not symmetric.
    #[must_use]
    pub fn matches(&self, candidate: &Self) -> bool {
        self.parts()
            .iter()
            .zip(candidate.parts())
            .all(|(mine, theirs)| mine.matches(theirs))
    }

    /// Returns a copy with every part after `position` cleared.
    #[must_use]
    pub fn truncated_after(&self, position: Position) -> Self {
        let mut truncated = self.clone();
        let mut next = position.next();
        while let Some(p) = next {
            truncated.set_part(p, Part::Absent);
            next = p.next();
        }
        truncated
    }

    /// Returns the renewal key: this resource with the instance cleared.
    #[must_use]
    pub fn without_instance(&self) -> Self {
        self.clone().with_part(Position::Instance, Part::Absent)
    }

    /// Returns a copy pinned to the given numeric instance slot.
    #[must_use]
    pub fn with_instance(&self, slot: u32) -> Self {
        self.clone()
            .with_part(Position::Instance, Part::named(slot.to_string()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut structural_complete = true;
        for part in [&self.zone, &self.product, &self.env, &self.job] {
            if part.is_absent() {
                structural_complete = false;
                break;
            }
            write!(f, "{PATH_SEPARATOR}{part}")?;
        }

        if structural_complete && self.instance.is_present() {
            write!(f, "{PATH_SEPARATOR}{}", self.instance)?;
        }

        // The service suffix is written even when the path stopped early.
        if self.service.is_present() {
            write!(f, "{SERVICE_SEPARATOR}{}", self.service)?;
        }

        Ok(())
    }
}

impl FromStr for Resource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
