use rand::Rng;

use crate::ir::Point;

use super::types::LayoutGraph;

/// Energy added per unit of intrusion into another node's separation radius.
const CROWDING_WEIGHT: f64 = 10.0;
/// Perturbation scale per unit of temperature.
const PERTURBATION_SCALE: f64 = 10.0;

/// Layout quality score; lower is better.
///
/// Every node pair closer than `node_separation` adds
/// `(node_separation - distance) * 10`, and every routable edge adds its
/// Euclidean length. Edges with an unknown endpoint contribute nothing.
pub(super) fn layout_energy(
    graph: &LayoutGraph<'_>,
    positions: &[Point],
    node_separation: f64,
) -> f64 {
    let edge_length: f64 = graph
        .resolved_edges()
        .map(|(_, from, to)| positions[from].distance(positions[to]))
        .sum();
    crowding_energy(positions, node_separation) + edge_length
}

/// Pairwise overlap penalty, O(V²).
fn crowding_energy(positions: &[Point], node_separation: f64) -> f64 {
    let mut energy = 0.0;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let distance = positions[i].distance(positions[j]);
            if distance < node_separation {
                energy += (node_separation - distance) * CROWDING_WEIGHT;
            }
        }
    }
    energy
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Annealing {
    pub(super) iterations: usize,
    pub(super) temperature: f64,
    pub(super) cooling: f64,
    pub(super) node_separation: f64,
}

#[derive(Debug, Clone)]
pub(super) struct Refinement {
    pub(super) positions: Vec<Point>,
    pub(super) energy: f64,
    pub(super) accepted: usize,
}

/// Simulated-annealing refinement. Each step jitters every coordinate by up
/// to `temperature * 10`, scores the candidate, and moves to it under the
/// Metropolis rule measured against the best energy so far. Returns the
/// lowest-energy layout seen, which need not be the last accepted one.
pub(super) fn refine_positions<R: Rng + ?Sized>(
    graph: &LayoutGraph<'_>,
    initial: Vec<Point>,
    params: Annealing,
    rng: &mut R,
) -> Refinement {
    let initial_energy = layout_energy(graph, &initial, params.node_separation);
    let mut best = initial.clone();
    let mut best_energy = initial_energy;
    let mut current = initial;
    let mut temperature = params.temperature;
    let mut accepted = 0;

    for _ in 0..params.iterations {
        let candidate = perturb(&current, temperature, rng);
        let energy = layout_energy(graph, &candidate, params.node_separation);
        if accept(best_energy, energy, temperature, rng) {
            accepted += 1;
            if energy < best_energy {
                best_energy = energy;
                best.clone_from(&candidate);
            }
            current = candidate;
        }
        temperature *= params.cooling;
    }

    tracing::debug!(
        iterations = params.iterations,
        accepted,
        initial_energy,
        best_energy,
        "refined positions"
    );

    Refinement {
        positions: best,
        energy: best_energy,
        accepted,
    }
}

fn perturb<R: Rng + ?Sized>(positions: &[Point], temperature: f64, rng: &mut R) -> Vec<Point> {
    let magnitude = temperature * PERTURBATION_SCALE;
    positions
        .iter()
        .map(|point| {
            let dx = rng.gen_range(-1.0_f64..=1.0) * magnitude;
            let dy = rng.gen_range(-1.0_f64..=1.0) * magnitude;
            point.translate(dx, dy)
        })
        .collect()
}

/// Metropolis criterion.
fn accept<R: Rng + ?Sized>(best_energy: f64, energy: f64, temperature: f64, rng: &mut R) -> bool {
    if energy < best_energy {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    let probability = ((best_energy - energy) / temperature).exp();
    rng.gen_range(0.0_f64..1.0) < probability
}
