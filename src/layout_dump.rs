use crate::config::{LayoutAlgorithm, LayoutConfig};
use crate::ir::Direction;
use crate::layout::{DEFAULT_CURVE_SEGMENTS, LayoutResult};
use serde::Serialize;
use std::io::Write;

/// A layout plus the run metadata a renderer or a debugging session wants
/// without recomputing it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub direction: Direction,
    pub algorithm: LayoutAlgorithm,
    pub width: f64,
    pub height: f64,
    pub cyclic: bool,
    pub junctions: usize,
    pub dangling_edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub junction: bool,
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub source: String,
    pub target: String,
    pub line: Option<String>,
    pub routed: bool,
    pub control_points: Vec<[f64; 2]>,
    /// The curve flattened to a polyline; empty when unrouted.
    pub points: Vec<[f64; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &LayoutResult, config: &LayoutConfig) -> Self {
        let (width, height) = match layout.bounds() {
            Some((_, max)) => (max.x + config.padding, max.y + config.padding),
            None => (0.0, 0.0),
        };

        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                x: node.position.x,
                y: node.position.y,
                junction: node.junction,
                lines: node.lines.clone(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                source: edge.source.clone(),
                target: edge.target.clone(),
                line: edge.line.clone(),
                routed: edge.is_routed(),
                control_points: edge.control_points.iter().map(|p| [p.x, p.y]).collect(),
                points: edge
                    .sample(DEFAULT_CURVE_SEGMENTS)
                    .iter()
                    .map(|p| [p.x, p.y])
                    .collect(),
            })
            .collect();

        let diagnostics = &layout.diagnostics;
        LayoutDump {
            direction: config.preferred_direction,
            algorithm: diagnostics.algorithm,
            width,
            height,
            cyclic: diagnostics.cyclic,
            junctions: diagnostics.junctions,
            dangling_edges: diagnostics.dangling_edges.len(),
            energy: diagnostics.energy,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump<W: Write>(
    writer: W,
    layout: &LayoutResult,
    config: &LayoutConfig,
    pretty: bool,
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout, config);
    if pretty {
        serde_json::to_writer_pretty(writer, &dump)?;
    } else {
        serde_json::to_writer(writer, &dump)?;
    }
    Ok(())
}
