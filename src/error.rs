//! Error types for resource parsing.

use thiserror::Error;

use crate::part::Position;

/// Errors that can occur when parsing a resource path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse resource '{input}': {kind}")]
pub struct ParseError {
    /// The input that failed to parse
    pub input: String,
    /// The specific error that occurred
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(input: &str, kind: ParseErrorKind) -> Self {
        Self {
            input: input.to_string(),
            kind,
        }
    }

    /// Returns true if the failure was caused by a single malformed component.
    #[must_use]
    pub const fn is_invalid_component(&self) -> bool {
        matches!(self.kind, ParseErrorKind::InvalidComponent { .. })
    }
}

/// Specific resource parsing error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Path is empty
    #[error("input is empty")]
    Empty,
    /// Path does not start with '/'
    #[error("path must start with '/'")]
    MissingLeadingSlash,
    /// Wrong number of path segments
    #[error("expected {min} to {max} path segments, found {actual}")]
    SegmentCount {
        /// Minimum segment count
        min: usize,
        /// Maximum segment count
        max: usize,
        /// Actual segment count
        actual: usize,
    },
    /// An interior segment is empty (`/a//b`)
    #[error("segment {index} is empty")]
    EmptySegment {
        /// Index of the empty segment
        index: usize,
    },
    /// More than one service separator
    #[error("more than one ':' service separator")]
    DuplicateServiceSeparator,
    /// A component violates the lexical rule of its position
    #[error("invalid {position} '{value}': {reason}")]
    InvalidComponent {
        /// Position of the component
        position: Position,
        /// The offending value
        value: String,
        /// Reason for invalidity
        reason: ComponentError,
    },
}

/// Errors for a single resource component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// Component is empty where a name is required
    #[error("component cannot be empty")]
    Empty,
    /// Component exceeds its maximum length
    #[error("length {actual} exceeds maximum {max}")]
    TooLong {
        /// Maximum allowed length
        max: usize,
        /// Actual length
        actual: usize,
    },
    /// Component contains a character outside its alphabet
    #[error("invalid character '{char}' at position {position}")]
    InvalidChar {
        /// The invalid character
        char: char,
        /// Position in the component
        position: usize,
    },
}
