use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::LayoutAlgorithm;
use crate::ir::{Edge, Graph, Point};

use super::error::{LayoutError, Result};
use super::routing::sample_cubic;

pub(crate) type NodeId = usize;

/// Output keys a node computes itself; stale copies in the input are dropped.
const NODE_OUTPUT_KEYS: &[&str] = &["junction"];
/// Output keys an edge computes itself; stale copies in the input are dropped.
const EDGE_OUTPUT_KEYS: &[&str] = &["sourcePoint", "targetPoint", "controlPoints"];

fn pass_through(extra: &Map<String, Value>, reserved: &[&str]) -> Map<String, Value> {
    extra
        .iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[derive(Debug, Clone)]
pub(crate) struct GraphNode {
    pub(crate) weight: f64,
    pub(crate) junction: bool,
    pub(crate) seed: Point,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GraphEdge {
    pub(crate) source: Option<NodeId>,
    pub(crate) target: Option<NodeId>,
}

/// Read-only snapshot of one input graph, built once per layout call.
///
/// Nodes live in an arena indexed by [`NodeId`]; string ids are resolved
/// exactly once here so the stages never scan by id.
#[derive(Debug)]
pub(crate) struct LayoutGraph<'a> {
    source: &'a Graph,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    successors: Vec<Vec<NodeId>>,
    neighbors: Vec<Vec<NodeId>>,
    lines: BTreeMap<&'a str, Vec<usize>>,
}

impl<'a> LayoutGraph<'a> {
    pub(crate) fn from_graph(graph: &'a Graph) -> Result<Self> {
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        let mut index: HashMap<&'a str, NodeId> = HashMap::with_capacity(graph.nodes.len());
        for (idx, node) in graph.nodes.iter().enumerate() {
            let seed = node.position.unwrap_or(Point::ORIGIN);
            if !seed.is_finite() {
                return Err(LayoutError::NonFinite {
                    node_id: node.id.clone(),
                    field: "position",
                });
            }
            let distinct_lines: BTreeSet<&str> = node.lines.iter().map(String::as_str).collect();
            let weight = node
                .weight
                .unwrap_or_else(|| distinct_lines.len().max(1) as f64);
            if !weight.is_finite() {
                return Err(LayoutError::NonFinite {
                    node_id: node.id.clone(),
                    field: "weight",
                });
            }
            if index.contains_key(node.id.as_str()) {
                tracing::warn!(node = %node.id, "duplicate node id; edges resolve to the first occurrence");
            } else {
                index.insert(node.id.as_str(), idx);
            }
            nodes.push(GraphNode {
                weight,
                junction: distinct_lines.len() > 1,
                seed,
            });
        }

        let mut edges = Vec::with_capacity(graph.edges.len());
        let mut successors = vec![Vec::new(); nodes.len()];
        let mut neighbors = vec![Vec::new(); nodes.len()];
        let mut lines: BTreeMap<&'a str, Vec<usize>> = BTreeMap::new();
        for (idx, edge) in graph.edges.iter().enumerate() {
            let source = index.get(edge.source.as_str()).copied();
            let target = index.get(edge.target.as_str()).copied();
            if let (Some(from), Some(to)) = (source, target) {
                successors[from].push(to);
                if from != to {
                    neighbors[from].push(to);
                    neighbors[to].push(from);
                }
            }
            if let Some(line) = edge.line.as_deref() {
                lines.entry(line).or_default().push(idx);
            }
            edges.push(GraphEdge { source, target });
        }

        Ok(Self {
            source: graph,
            nodes,
            edges,
            successors,
            neighbors,
            lines,
        })
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn node_key(&self, id: NodeId) -> &'a str {
        self.source.nodes[id].id.as_str()
    }

    #[cfg(test)]
    pub(crate) fn lookup(&self, key: &str) -> Option<NodeId> {
        self.source.nodes.iter().position(|node| node.id == key)
    }

    pub(crate) fn input_edge(&self, idx: usize) -> &'a Edge {
        &self.source.edges[idx]
    }

    /// Extra fields of edge `idx` minus the keys routing writes.
    pub(crate) fn edge_extra(&self, idx: usize) -> Map<String, Value> {
        pass_through(&self.input_edge(idx).extra, EDGE_OUTPUT_KEYS)
    }

    /// Endpoints of edge `idx` when both resolve to known nodes.
    pub(crate) fn endpoints(&self, idx: usize) -> Option<(NodeId, NodeId)> {
        let edge = self.edges[idx];
        Some((edge.source?, edge.target?))
    }

    /// Every edge whose endpoints both resolve, as `(edge index, source, target)`.
    pub(crate) fn resolved_edges(&self) -> impl Iterator<Item = (usize, NodeId, NodeId)> + '_ {
        (0..self.edges.len()).filter_map(|idx| {
            let (from, to) = self.endpoints(idx)?;
            Some((idx, from, to))
        })
    }

    pub(crate) fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.successors[id]
    }

    /// Nodes sharing an edge with `id` in either direction, self excluded.
    pub(crate) fn neighbors(&self, id: NodeId) -> &[NodeId] {
        &self.neighbors[id]
    }

    pub(crate) fn dangling_edges(&self) -> Vec<usize> {
        (0..self.edges.len())
            .filter(|idx| self.endpoints(*idx).is_none())
            .collect()
    }

    pub(crate) fn dangling_error(&self, idx: usize) -> LayoutError {
        let edge = self.input_edge(idx);
        let missing = if self.edges[idx].source.is_none() {
            edge.source.clone()
        } else {
            edge.target.clone()
        };
        LayoutError::DanglingEdge {
            index: idx,
            from: edge.source.clone(),
            to: edge.target.clone(),
            missing,
        }
    }

    pub(crate) fn junction_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.junction).count()
    }

    pub(crate) fn line_buckets(&self) -> BTreeMap<String, Vec<usize>> {
        self.lines
            .iter()
            .map(|(line, edges)| ((*line).to_string(), edges.clone()))
            .collect()
    }

    pub(crate) fn seed_positions(&self) -> Vec<Point> {
        self.nodes.iter().map(|node| node.seed).collect()
    }

    pub(crate) fn positioned_node(&self, id: NodeId, position: Point) -> PositionedNode {
        let input = &self.source.nodes[id];
        let node = &self.nodes[id];
        PositionedNode {
            id: input.id.clone(),
            name: input.name.clone(),
            lines: input.lines.clone(),
            weight: node.weight,
            junction: node.junction,
            position,
            extra: pass_through(&input.extra, NODE_OUTPUT_KEYS),
        }
    }
}

pub(crate) fn point_main(point: Point, horizontal: bool) -> f64 {
    if horizontal { point.x } else { point.y }
}

pub(crate) fn point_cross(point: Point, horizontal: bool) -> f64 {
    if horizontal { point.y } else { point.x }
}

pub(crate) fn set_main(point: &mut Point, horizontal: bool, value: f64) {
    if horizontal {
        point.x = value;
    } else {
        point.y = value;
    }
}

pub(crate) fn set_cross(point: &mut Point, horizontal: bool, value: f64) {
    if horizontal {
        point.y = value;
    } else {
        point.x = value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub lines: Vec<String>,
    pub weight: f64,
    #[serde(default)]
    pub junction: bool,
    pub position: Point,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedEdge {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    /// `None` when the edge references an unknown node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_point: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_point: Option<Point>,
    #[serde(default)]
    pub control_points: Vec<Point>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoutedEdge {
    pub fn is_routed(&self) -> bool {
        self.source_point.is_some() && self.target_point.is_some() && !self.control_points.is_empty()
    }

    /// Points along the cubic curve source → controls → target, `segments + 1`
    /// of them. Unrouted edges sample to nothing.
    pub fn sample(&self, segments: usize) -> Vec<Point> {
        let (Some(start), Some(end)) = (self.source_point, self.target_point) else {
            return Vec::new();
        };
        let (c1, c2) = match self.control_points.as_slice() {
            [c1, c2, ..] => (*c1, *c2),
            [c] => (*c, *c),
            [] => return Vec::new(),
        };
        sample_cubic(start, c1, c2, end, segments)
    }

    pub(crate) fn translate(&mut self, dx: f64, dy: f64) {
        if let Some(point) = self.source_point.as_mut() {
            *point = point.translate(dx, dy);
        }
        if let Some(point) = self.target_point.as_mut() {
            *point = point.translate(dx, dy);
        }
        for point in self.control_points.iter_mut() {
            *point = point.translate(dx, dy);
        }
    }
}

/// How a layout call went; kept beside the result, never serialized into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDiagnostics {
    /// Strategy that actually produced the geometry.
    pub algorithm: LayoutAlgorithm,
    /// Ordering found a cycle and fell back to longest-path ordering.
    pub cyclic: bool,
    /// Indices into the input edge list of edges left unrouted.
    pub dangling_edges: Vec<usize>,
    /// Best energy reached by refinement; `None` when it did not run.
    pub energy: Option<f64>,
    pub junctions: usize,
    /// Input edge indices bucketed by line id.
    pub line_edges: BTreeMap<String, Vec<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<RoutedEdge>,
    #[serde(skip)]
    pub diagnostics: LayoutDiagnostics,
}

impl LayoutResult {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.node(id).map(|node| node.position)
    }

    /// Top-left and bottom-right corners of the node positions.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = self.nodes.first()?.position;
        let mut min = first;
        let mut max = first;
        for node in &self.nodes[1..] {
            min.x = min.x.min(node.position.x);
            min.y = min.y.min(node.position.y);
            max.x = max.x.max(node.position.x);
            max.y = max.y.max(node.position.y);
        }
        Some((min, max))
    }

    /// Edges belonging to `line`, in input order.
    pub fn edges_on_line<'s>(&'s self, line: &str) -> impl Iterator<Item = &'s RoutedEdge> + 's {
        self.diagnostics
            .line_edges
            .get(line)
            .into_iter()
            .flatten()
            .filter_map(|idx| self.edges.get(*idx))
    }

    pub fn routed_edge_count(&self) -> usize {
        self.edges.iter().filter(|edge| edge.is_routed()).count()
    }
}
