//! Effective scope propagation.
//!
//! A node reached through parent `p` is offered the weaker of its own
//! declared scope and `p`'s effective scope; a direct dependency of the root
//! is offered its declared scope. A conflict winner takes the strongest
//! offer over all of its parents. A loser takes its winner's scope, so every
//! declaration of one artifact ends up with the same effective scope.
//!
//! Scopes only ever strengthen while iterating and the precedence table is
//! finite, so the fixed point is reached in a bounded number of passes even
//! on cyclic graphs.

use crate::context::TransformationContext;
use crate::error::GraphError;
use crate::graph::{ConflictTag, DependencyGraph};
use petgraph::graph::NodeIndex;
use tracing::debug;

/// Assign every node reachable from the root its effective scope.
///
/// Unreachable nodes keep their declared scope. Returns the number of passes
/// needed to settle.
///
/// # Errors
/// Returns [`GraphError::UnknownScope`] if a reachable node declares a scope
/// missing from the precedence table.
pub fn propagate_scopes(
    graph: &mut DependencyGraph,
    ctx: &mut TransformationContext,
) -> Result<usize, GraphError> {
    let order = ctx.breadth_first(graph);
    let labels: Vec<_> = ctx.precedence().labels().cloned().collect();

    let mut declared = vec![0; graph.len()];
    let mut reached = vec![false; graph.len()];
    for &index in &order {
        let node = graph.node(index);
        let rank = ctx
            .precedence()
            .rank(&node.declared_scope)
            .ok_or_else(|| GraphError::UnknownScope {
                node: node.id.clone(),
                scope: node.declared_scope.to_string(),
            })?;
        declared[index.index()] = rank;
        reached[index.index()] = true;
    }

    let root = graph.root();
    let parents: Vec<Vec<NodeIndex>> = graph
        .node_indices()
        .map(|i| graph.parents(i).filter(|p| reached[p.index()]).collect())
        .collect();

    let mut effective: Vec<Option<usize>> = vec![None; graph.len()];
    effective[root.index()] = Some(declared[root.index()]);

    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for &index in order.iter().filter(|&&i| i != root) {
            let i = index.index();
            let offer = match graph.node(index).conflict {
                ConflictTag::Loser { winner } => effective[winner.index()],
                ConflictTag::Winner | ConflictTag::Unmarked => parents[i]
                    .iter()
                    .filter_map(|&p| {
                        let inherited = effective[p.index()]?;
                        Some(if p == root {
                            declared[i]
                        } else {
                            declared[i].min(inherited)
                        })
                    })
                    .max(),
            };
            if let Some(rank) = offer
                && effective[i].is_none_or(|current| rank > current)
            {
                effective[i] = Some(rank);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    for &index in &order {
        let rank = effective[index.index()].unwrap_or(declared[index.index()]);
        if let Some(scope) = labels.get(rank) {
            graph.node_mut(index).scope = scope.clone();
        }
    }
    ctx.set_passes(passes);
    debug!(nodes = order.len(), passes, "scopes propagated");
    Ok(passes)
}
