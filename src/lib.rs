//! Hierarchical service resource paths for the srvdir service directory.
//!
//! This crate implements parsing, matching and serialization of the
//! resource addresses clients use to register and look up services.
//!
//! # Overview
//!
//! A resource names a service endpoint by six positional parts:
//!
//! ```text
//! /zone/product/env/job[/instance][:service]
//! ```
//!
//! Any part may be `*` to match anything. A resource whose parts are all
//! named is *fully qualified* and can be bound to a network address; one
//! with wildcards is a query; one with trailing parts missing is a browse
//! prefix.
//!
//! # Quick Start
//!
//! ```rust
//! use srvdir::{Position, Resource};
//!
//! let res = Resource::parse("/aa/iaaa/prod/api/1:http").unwrap();
//! assert!(res.is_fully_qualified());
//! assert_eq!(res.part(Position::Job).name(), "api");
//!
//! // Wildcard queries
//! let query = Resource::parse("/aa/iaaa/*/api/*:http").unwrap();
//! assert!(query.matches(&res));
//!
//! // Browse prefixes
//! let prefix = Resource::parse_partial("/aa/iaaa").unwrap();
//! assert_eq!(prefix.first_absent(), Some(Position::Env));
//! ```
//!
//! # Grammar
//!
//! | Component | Rule |
//! |-----------|------|
//! | zone, product, env, job | `[a-z*][a-z0-9-]{0,62}`, required |
//! | instance | `[0-9*]{0,5}`, optional |
//! | service | `[a-z*][a-z0-9-]{0,62}`, optional, after `:` |
//!
//! Displaying a resource is the inverse of parsing: path segments are
//! written up to the first absent part, then `:service` is appended if the
//! service is present.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod constants;
mod error;
#[cfg(kani)]
mod kani_impls;
mod part;
pub mod prelude;
mod resource;

pub use constants::{
    MAX_INSTANCE_LENGTH, MAX_NAME_LENGTH, PART_COUNT, PATH_SEPARATOR, SERVICE_SEPARATOR,
    STRUCTURAL_SEGMENTS, WILDCARD,
};
pub use error::{ComponentError, ParseError, ParseErrorKind};
pub use part::{Part, Position};
pub use resource::Resource;
