mod crossing;
mod energy;
mod error;
mod ranking;
mod routing;
pub(crate) mod types;

pub use error::{LayoutError, Result};
pub use routing::{DEFAULT_CURVE_SEGMENTS, control_points};
pub use types::{LayoutDiagnostics, LayoutResult, PositionedNode, RoutedEdge};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::{LayoutAlgorithm, LayoutConfig};
use crate::ir::{Graph, Point};

use crossing::minimize_crossings;
use energy::{Annealing, refine_positions};
use ranking::{apply_ranks, assign_ranks, order_nodes};
use routing::route_edges;
use types::LayoutGraph;

/// Owns the configuration, the random source, and the last computed layout.
///
/// Each [`apply_layout`](Self::apply_layout) call replaces the stored result;
/// nothing else carries over between calls.
#[derive(Debug)]
pub struct LayoutEngine<R = StdRng> {
    config: LayoutConfig,
    rng: R,
    layout_result: Option<LayoutResult>,
}

impl LayoutEngine<StdRng> {
    /// Validates `config` and seeds the refinement RNG from
    /// `config.random_seed`, or from OS entropy when unset.
    pub fn new(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        let rng = seeded_rng(config.random_seed);
        Ok(Self {
            config,
            rng,
            layout_result: None,
        })
    }
}

impl Default for LayoutEngine<StdRng> {
    fn default() -> Self {
        Self {
            config: LayoutConfig::default(),
            rng: StdRng::from_entropy(),
            layout_result: None,
        }
    }
}

impl<R: RngCore> LayoutEngine<R> {
    /// Uses `rng` for refinement; `config.random_seed` is ignored.
    pub fn with_rng(config: LayoutConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            layout_result: None,
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// The result of the most recent successful [`apply_layout`](Self::apply_layout).
    pub fn layout_result(&self) -> Option<&LayoutResult> {
        self.layout_result.as_ref()
    }

    /// Lays out `graph` without touching it. On error the previous result is
    /// kept and nothing partial is returned.
    pub fn apply_layout(&mut self, graph: &Graph) -> Result<LayoutResult> {
        let result = run_pipeline(graph, &self.config, &mut self.rng)?;
        self.layout_result = Some(result.clone());
        Ok(result)
    }
}

impl<R: RngCore + SeedableRng> LayoutEngine<R> {
    /// Merges option changes into the current config. The update is rejected
    /// as a whole if the merged config is invalid; a changed seed reseeds.
    pub fn update_layout_options(&mut self, update: impl FnOnce(&mut LayoutConfig)) -> Result<()> {
        let mut next = self.config.clone();
        update(&mut next);
        next.validate()?;
        if next.random_seed != self.config.random_seed {
            self.rng = seeded_rng(next.random_seed);
        }
        self.config = next;
        Ok(())
    }
}

fn seeded_rng<R: SeedableRng>(seed: Option<u64>) -> R {
    match seed {
        Some(seed) => R::seed_from_u64(seed),
        None => R::from_entropy(),
    }
}

/// One-shot layout with a fresh engine.
pub fn compute_layout(graph: &Graph, config: &LayoutConfig) -> Result<LayoutResult> {
    LayoutEngine::new(config.clone())?.apply_layout(graph)
}

fn resolve_algorithm(config: &LayoutConfig) -> Result<LayoutAlgorithm> {
    let requested = config.layout_algorithm;
    if !requested.is_alias() {
        return Ok(requested);
    }
    if config.strict {
        return Err(LayoutError::UnsupportedAlgorithm(requested.as_str()));
    }
    tracing::warn!(
        requested = requested.as_str(),
        "layout algorithm has no strategy of its own; using metro"
    );
    Ok(LayoutAlgorithm::Metro)
}

fn run_pipeline<R: RngCore + ?Sized>(
    graph: &Graph,
    config: &LayoutConfig,
    rng: &mut R,
) -> Result<LayoutResult> {
    let _span = tracing::debug_span!(
        "layout",
        nodes = graph.nodes.len(),
        edges = graph.edges.len()
    )
    .entered();

    let algorithm = resolve_algorithm(config)?;
    let snapshot = LayoutGraph::from_graph(graph)?;

    let dangling = snapshot.dangling_edges();
    if let Some(&first) = dangling.first() {
        if config.strict {
            return Err(snapshot.dangling_error(first));
        }
        tracing::warn!(
            count = dangling.len(),
            first = first,
            "edges reference unknown nodes and will not be routed"
        );
    }

    let horizontal = config.is_horizontal();

    let order = order_nodes(&snapshot);
    tracing::debug!(cyclic = order.cyclic, "ordered nodes");

    let ranks = assign_ranks(&snapshot, &order.order, config.rank_mode);
    let mut positions = snapshot.seed_positions();
    apply_ranks(&mut positions, &ranks, config.rank_separation, horizontal);

    minimize_crossings(
        &snapshot,
        &mut positions,
        &order.order,
        config.node_separation,
        config.crossing_passes,
        horizontal,
    );

    let mut energy = None;
    if config.optimization_iterations > 0 && snapshot.node_count() > 0 {
        let refined = refine_positions(
            &snapshot,
            positions,
            Annealing {
                iterations: config.optimization_iterations,
                temperature: config.optimization_temperature,
                cooling: config.optimization_cooling,
                node_separation: config.node_separation,
            },
            rng,
        );
        tracing::debug!(accepted = refined.accepted, "annealing finished");
        positions = refined.positions;
        energy = Some(refined.energy);
    }

    let mut edges = route_edges(
        &snapshot,
        &positions,
        config.preferred_direction,
        config.direction_bias,
    );
    normalize_layout(&mut positions, &mut edges, config.padding);

    let nodes = positions
        .iter()
        .enumerate()
        .map(|(id, position)| snapshot.positioned_node(id, *position))
        .collect();

    Ok(LayoutResult {
        nodes,
        edges,
        diagnostics: LayoutDiagnostics {
            algorithm,
            cyclic: order.cyclic,
            dangling_edges: dangling,
            energy,
            junctions: snapshot.junction_count(),
            line_edges: snapshot.line_buckets(),
        },
    })
}

/// Translates nodes and routed edges so the smallest node coordinate on
/// each axis lands on `padding`.
fn normalize_layout(positions: &mut [Point], edges: &mut [RoutedEdge], padding: f64) {
    let Some(first) = positions.first() else {
        return;
    };
    let (mut min_x, mut min_y) = (first.x, first.y);
    for point in positions.iter() {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
    }

    let shift_x = padding - min_x;
    let shift_y = padding - min_y;
    if shift_x == 0.0 && shift_y == 0.0 {
        return;
    }

    for point in positions.iter_mut() {
        *point = point.translate(shift_x, shift_y);
    }
    for edge in edges.iter_mut() {
        edge.translate(shift_x, shift_y);
    }
}
