//! Core types for the coda artifact resolver.
//!
//! - [`coordinate`]: artifact coordinates and the `[repo!]g/a[/v[/c/t]]` grammar
//! - [`version`]: exact, `LATEST`, snapshot and range version specifications
//! - [`scope`]: dependency scopes and their configurable precedence
//! - [`error`]: the core error type

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod coordinate;
pub mod error;
pub mod scope;
pub mod version;

pub use coordinate::{
    ArtifactReference, ConflictKey, Coordinate, DEFAULT_TYPE, REPOSITORY_SEPARATOR,
    parse_coordinate,
};
pub use error::{Error, Result};
pub use scope::{Scope, ScopePrecedence};
pub use version::{
    LATEST, SNAPSHOT_SUFFIX, VersionRange, VersionSpec, compare_versions, is_snapshot,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
