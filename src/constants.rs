//! Constants for resource path validation.

/// Number of positional parts in a resource.
pub const PART_COUNT: usize = 6;

/// Number of structural path segments every full resource carries
/// (zone, product, env, job).
pub const STRUCTURAL_SEGMENTS: usize = 4;

/// Maximum length of a zone, product, env, job or service name.
pub const MAX_NAME_LENGTH: usize = 63;

/// Maximum length of an instance component.
pub const MAX_INSTANCE_LENGTH: usize = 5;

/// The component value that matches anything.
pub const WILDCARD: &str = "*";

/// Separator between the path and the service suffix.
pub const SERVICE_SEPARATOR: char = ':';

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';
