use crate::ir::Point;

use super::types::{LayoutGraph, NodeId, point_cross, point_main, set_cross};

/// Barycenters closer than this are treated as equal and ordered by node id.
const TIE_TOLERANCE: f64 = 1e-3;

/// Groups nodes sharing a primary-axis coordinate, in ascending coordinate
/// order. Within a group nodes keep `order`.
pub(super) fn rank_groups(positions: &[Point], order: &[NodeId], horizontal: bool) -> Vec<Vec<NodeId>> {
    let mut sorted: Vec<NodeId> = order.to_vec();
    sorted.sort_by(|a, b| {
        point_main(positions[*a], horizontal).total_cmp(&point_main(positions[*b], horizontal))
    });

    let mut groups: Vec<Vec<NodeId>> = Vec::new();
    let mut current_main: Option<f64> = None;
    for node in sorted {
        let main = point_main(positions[node], horizontal);
        match (current_main, groups.last_mut()) {
            (Some(prev), Some(group)) if prev == main => group.push(node),
            _ => {
                groups.push(vec![node]);
                current_main = Some(main);
            }
        }
    }
    groups
}

/// Mean secondary coordinate of `node`'s neighbours, or its own coordinate
/// when it has none.
pub(super) fn barycenter(
    graph: &LayoutGraph<'_>,
    positions: &[Point],
    node: NodeId,
    horizontal: bool,
) -> f64 {
    let neighbors = graph.neighbors(node);
    if neighbors.is_empty() {
        return point_cross(positions[node], horizontal);
    }
    let total: f64 = neighbors
        .iter()
        .map(|other| point_cross(positions[*other], horizontal))
        .sum();
    total / neighbors.len() as f64
}

/// Sorts every rank group by barycenter and respaces it along the secondary
/// axis at `node_separation`. Groups are swept in rank order, so later groups
/// see the coordinates written for earlier ones.
pub(super) fn minimize_crossings(
    graph: &LayoutGraph<'_>,
    positions: &mut [Point],
    order: &[NodeId],
    node_separation: f64,
    passes: usize,
    horizontal: bool,
) {
    let mut groups = rank_groups(positions, order, horizontal);
    for _ in 0..passes.max(1) {
        for group in groups.iter_mut() {
            let keyed: Vec<(f64, &str, NodeId)> = group
                .iter()
                .map(|node| {
                    let center = barycenter(graph, positions, *node, horizontal);
                    (center, graph.node_key(*node), *node)
                })
                .collect();
            let sorted = sort_by_barycenter(keyed);

            for (idx, node) in sorted.iter().enumerate() {
                set_cross(&mut positions[*node], horizontal, idx as f64 * node_separation);
            }
            *group = sorted;
        }
    }
}

/// Ascending barycenter order. Runs of values whose neighbours sit within
/// [`TIE_TOLERANCE`] of each other form one tie and are ordered by node id.
fn sort_by_barycenter(mut keyed: Vec<(f64, &str, NodeId)>) -> Vec<NodeId> {
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let mut sorted = Vec::with_capacity(keyed.len());
    let mut start = 0;
    for end in 1..=keyed.len() {
        let split = end == keyed.len() || keyed[end].0 - keyed[end - 1].0 >= TIE_TOLERANCE;
        if split {
            let cluster = &mut keyed[start..end];
            cluster.sort_by(|a, b| a.1.cmp(b.1));
            sorted.extend(cluster.iter().map(|(_, _, node)| *node));
            start = end;
        }
    }
    sorted
}

/// Number of pairwise crossings between edges joining adjacent rank groups.
/// Used to check the heuristic, not by the pipeline.
#[cfg(test)]
pub(super) fn count_crossings(
    graph: &LayoutGraph<'_>,
    positions: &[Point],
    horizontal: bool,
) -> usize {
    let segments: Vec<(Point, Point)> = graph
        .resolved_edges()
        .map(|(_, from, to)| (positions[from], positions[to]))
        .collect();
    let mut crossings = 0;
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            let (a0, a1) = segments[i];
            let (b0, b1) = segments[j];
            let same_span = point_main(a0, horizontal) == point_main(b0, horizontal)
                && point_main(a1, horizontal) == point_main(b1, horizontal);
            if !same_span {
                continue;
            }
            let start = point_cross(a0, horizontal) - point_cross(b0, horizontal);
            let end = point_cross(a1, horizontal) - point_cross(b1, horizontal);
            if start * end < 0.0 {
                crossings += 1;
            }
        }
    }
    crossings
}
