//! Conflict marking: nearest declaration wins.

use crate::context::TransformationContext;
use crate::graph::{ConflictTag, DependencyGraph};
use std::collections::hash_map::Entry;
use tracing::trace;

/// Tag every node reachable from the root as the winner or a loser of its
/// conflict group.
///
/// Nodes are visited breadth first in child order, each once, so a direct
/// dependency of the root beats any transitive declaration and the same
/// graph always yields the same winners. Unreachable nodes are left
/// [`ConflictTag::Unmarked`]. Every [`Coordinate`](coda_core::Coordinate)
/// carries a non-blank group id, artifact id and type, so every key is valid.
pub fn mark_conflicts(graph: &mut DependencyGraph, ctx: &mut TransformationContext) {
    for index in graph.node_indices().collect::<Vec<_>>() {
        graph.node_mut(index).conflict = ConflictTag::Unmarked;
    }
    ctx.winners_mut().clear();

    for index in ctx.breadth_first(graph) {
        let node = graph.node(index);
        let tag = match ctx.winners_mut().entry(node.conflict_key()) {
            Entry::Vacant(slot) => {
                slot.insert(index);
                ConflictTag::Winner
            }
            Entry::Occupied(slot) => {
                trace!(node = %node.id, winner = %graph.node(*slot.get()).id, "conflict loser");
                ConflictTag::Loser {
                    winner: *slot.get(),
                }
            }
        };
        graph.node_mut(index).conflict = tag;
    }
}
