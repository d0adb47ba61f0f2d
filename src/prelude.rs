//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use srvdir::prelude::*;
//!
//! let res = Resource::parse("/aa/bb/cc/dd/0:http").unwrap();
//! assert!(res.part(Position::Service).is_set());
//! ```

pub use crate::{
    // Core types
    Part, Position, Resource,
    // Errors
    ComponentError, ParseError, ParseErrorKind,
    // Constants
    MAX_INSTANCE_LENGTH, MAX_NAME_LENGTH, PART_COUNT, WILDCARD,
};
