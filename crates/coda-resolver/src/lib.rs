//! Artifact resolution for coda.
//!
//! Two independent halves live here.
//!
//! Downloading a single artifact:
//!
//! - [`version_resolver`]: turns exact, `LATEST`, range and snapshot
//!   requests into download candidates per repository
//! - [`candidate`]: the order candidates are attempted in
//! - [`orchestrator`]: walks the default then the configured repositories
//!   until a candidate downloads
//!
//! Post-processing a resolved dependency graph:
//!
//! - [`graph`]: arena-backed graph with stable child order
//! - [`conflict`]: nearest-wins conflict marking
//! - [`scope`]: effective scope propagation to a fixed point
//!
//! # Example
//!
//! ```rust,ignore
//! use coda_resolver::{ArtifactResolver, transform_graph, DependencyGraph};
//!
//! let resolver = ArtifactResolver::new(&config, fetcher);
//! let artifact = resolver.resolve("org.example/lib/[1.0,2.0)")?;
//!
//! let mut graph = DependencyGraph::load(path)?;
//! transform_graph(&mut graph, config.scope_precedence.clone())?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod candidate;
pub mod conflict;
pub mod context;
pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod scope;
pub mod version_resolver;

pub use candidate::{DownloadCandidate, download_order, sort_candidates};
pub use conflict::mark_conflicts;
pub use context::TransformationContext;
pub use error::{Attempt, CandidateError, GraphError, ResolveError, Result};
pub use graph::{ConflictTag, DependencyGraph, DependencyNode, GraphDocument, NodeDocument};
pub use orchestrator::{
    Artifact, ArtifactResolver, DownloadOrchestrator, INLINE_REPOSITORY_ID, ResolveStats,
};
pub use scope::propagate_scopes;
pub use version_resolver::{SnapshotBuild, VersionResolver, snapshot_build};

use coda_core::ScopePrecedence;

/// Mark conflicts, then propagate scopes, with a fresh context.
///
/// Returns the context for inspection.
///
/// # Errors
/// Returns the [`GraphError`] scope propagation raises.
pub fn transform_graph(
    graph: &mut DependencyGraph,
    precedence: ScopePrecedence,
) -> std::result::Result<TransformationContext, GraphError> {
    let mut ctx = TransformationContext::new(precedence);
    mark_conflicts(graph, &mut ctx);
    propagate_scopes(graph, &mut ctx)?;
    Ok(ctx)
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Artifact, ArtifactResolver, DependencyGraph, DependencyNode, GraphError, ResolveError,
        transform_graph,
    };
}
