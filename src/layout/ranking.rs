use std::collections::VecDeque;

use crate::config::RankMode;
use crate::ir::Point;

use super::types::{LayoutGraph, NodeId, set_main};

/// Linear node order seeding rank assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct NodeOrder {
    pub(super) order: Vec<NodeId>,
    /// A back-edge was found and the order came from the longest-path sweep.
    pub(super) cyclic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

pub(super) fn order_nodes(graph: &LayoutGraph<'_>) -> NodeOrder {
    match topological_order(graph) {
        Some(order) => NodeOrder {
            order,
            cyclic: false,
        },
        None => NodeOrder {
            order: longest_path_order(graph),
            cyclic: true,
        },
    }
}

/// Depth-first topological sort. `None` when a back-edge reaches a node
/// still on the DFS stack.
///
/// Roots and successors are walked in reverse so the reversed post-order
/// keeps insertion order among unconstrained nodes.
pub(super) fn topological_order(graph: &LayoutGraph<'_>) -> Option<Vec<NodeId>> {
    let count = graph.node_count();
    let mut marks = vec![Mark::Unvisited; count];
    let mut finished = Vec::with_capacity(count);
    // (node, successors already examined)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for root in (0..count).rev() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(&(node, cursor)) = stack.last() {
            let succ = graph.successors(node);
            if cursor == succ.len() {
                marks[node] = Mark::Done;
                finished.push(node);
                stack.pop();
                continue;
            }
            if let Some(frame) = stack.last_mut() {
                frame.1 += 1;
            }
            let next = succ[succ.len() - 1 - cursor];
            match marks[next] {
                Mark::Unvisited => {
                    marks[next] = Mark::InProgress;
                    stack.push((next, 0));
                }
                Mark::InProgress => return None,
                Mark::Done => {}
            }
        }
    }

    finished.reverse();
    Some(finished)
}

/// Fallback for cyclic graphs: relaxed longest distance from the zero
/// in-degree nodes, then a stable sort by distance. Nodes trapped in a cycle
/// keep whatever distance their processed predecessors gave them.
pub(super) fn longest_path_order(graph: &LayoutGraph<'_>) -> Vec<NodeId> {
    let count = graph.node_count();
    let mut indegree = vec![0usize; count];
    for (_, _, to) in graph.resolved_edges() {
        indegree[to] += 1;
    }

    let mut distance = vec![0usize; count];
    let mut queue: VecDeque<NodeId> = (0..count).filter(|id| indegree[*id] == 0).collect();
    while let Some(node) = queue.pop_front() {
        for &next in graph.successors(node) {
            distance[next] = distance[next].max(distance[node] + 1);
            indegree[next] = indegree[next].saturating_sub(1);
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    let mut order: Vec<NodeId> = (0..count).collect();
    order.sort_by_key(|id| distance[*id]);
    order
}

/// Rank per node (indexed by [`NodeId`]).
pub(super) fn assign_ranks(graph: &LayoutGraph<'_>, order: &[NodeId], mode: RankMode) -> Vec<usize> {
    let mut ranks = vec![0usize; graph.node_count()];
    match mode {
        RankMode::Sequential => {
            for (idx, node) in order.iter().enumerate() {
                ranks[*node] = idx;
            }
        }
        RankMode::Layered => {
            let mut order_index = vec![0usize; graph.node_count()];
            for (idx, node) in order.iter().enumerate() {
                order_index[*node] = idx;
            }
            for &node in order {
                let rank = ranks[node];
                let from_idx = order_index[node];
                for &next in graph.successors(node) {
                    // Edges pointing backwards in the order are cycle edges.
                    if order_index[next] <= from_idx {
                        continue;
                    }
                    ranks[next] = ranks[next].max(rank + 1);
                }
            }
        }
    }
    ranks
}

/// Writes `rank * rank_separation` into the primary axis of each position.
pub(super) fn apply_ranks(
    positions: &mut [Point],
    ranks: &[usize],
    rank_separation: f64,
    horizontal: bool,
) {
    for (point, rank) in positions.iter_mut().zip(ranks) {
        set_main(point, horizontal, *rank as f64 * rank_separation);
    }
}
