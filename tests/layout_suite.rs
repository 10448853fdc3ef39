use std::path::Path;

use metro_layout::layout::control_points;
use metro_layout::{
    Direction, Graph, LayoutAlgorithm, LayoutConfig, LayoutEngine, LayoutError, LayoutResult,
    RankMode, compute_layout, load_config,
};
use serde_json::json;

const EPS: f64 = 1e-9;

fn load_fixture(name: &str) -> Graph {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    Graph::from_json(&input).expect("fixture parse failed")
}

fn still() -> LayoutConfig {
    LayoutConfig {
        optimization_iterations: 0,
        ..LayoutConfig::default()
    }
}

fn assert_well_formed(result: &LayoutResult, graph: &Graph, padding: f64, fixture: &str) {
    assert_eq!(result.nodes.len(), graph.nodes.len(), "{fixture}: node count");
    assert_eq!(result.edges.len(), graph.edges.len(), "{fixture}: edge count");
    for node in &result.nodes {
        assert!(node.position.is_finite(), "{fixture}: {} not finite", node.id);
    }
    for (idx, edge) in result.edges.iter().enumerate() {
        let known = result.node(&edge.source).is_some() && result.node(&edge.target).is_some();
        assert_eq!(
            known,
            !edge.control_points.is_empty(),
            "{fixture}: edge #{idx} routing"
        );
    }
    if let Some((min, _)) = result.bounds() {
        assert!((min.x - padding).abs() < EPS, "{fixture}: min x {}", min.x);
        assert!((min.y - padding).abs() < EPS, "{fixture}: min y {}", min.y);
    }
}

#[test]
fn layout_all_fixtures() {
    let fixtures = [
        "chain.json",
        "roadmap.json",
        "cycle.json",
        "dangling.json",
        "empty.json",
    ];
    for fixture in fixtures {
        let graph = load_fixture(fixture);
        for config in [still(), LayoutConfig {
            random_seed: Some(17),
            ..LayoutConfig::default()
        }] {
            let result = compute_layout(&graph, &config).expect("layout failed");
            assert_well_formed(&result, &graph, config.padding, fixture);
        }
    }
}

#[test]
fn chain_scenario_with_default_config() {
    let graph = load_fixture("chain.json");
    let mut engine = LayoutEngine::new(LayoutConfig {
        random_seed: Some(2024),
        ..LayoutConfig::default()
    })
    .unwrap();
    let result = engine.apply_layout(&graph).unwrap();

    let x = |id: &str| result.position(id).unwrap().x;
    assert!(x("A") < x("B"));
    assert!(x("B") < x("C"));
    assert_eq!(result.routed_edge_count(), 2);
    assert!(result.edges.iter().all(|edge| edge.control_points.len() == 2));
    assert!(result.diagnostics.energy.is_some());
}

#[test]
fn empty_graph_yields_empty_layout() {
    let result = compute_layout(&load_fixture("empty.json"), &LayoutConfig::default()).unwrap();
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({ "nodes": [], "edges": [] })
    );
}

#[test]
fn singleton_sits_at_padding() {
    let mut graph = Graph::new();
    graph.ensure_node("only", &["L1"]);
    let config = LayoutConfig {
        padding: 35.0,
        ..LayoutConfig::default()
    };
    let result = compute_layout(&graph, &config).unwrap();
    let position = result.position("only").unwrap();
    assert!((position.x - 35.0).abs() < EPS);
    assert!((position.y - 35.0).abs() < EPS);
}

#[test]
fn direction_decides_the_spread_axis() {
    let mut graph = Graph::new();
    graph.ensure_node("A", &[]);
    graph.ensure_node("B", &[]);
    graph.add_edge("A", "B", None);

    let spread = |direction| {
        let config = LayoutConfig {
            preferred_direction: direction,
            ..still()
        };
        let result = compute_layout(&graph, &config).unwrap();
        let a = result.position("A").unwrap();
        let b = result.position("B").unwrap();
        ((b.x - a.x).abs(), (b.y - a.y).abs())
    };

    let (dx, dy) = spread(Direction::Horizontal);
    assert!(dx > dy);
    let (dx, dy) = spread(Direction::Vertical);
    assert!(dy > dx);
}

#[test]
fn four_cycle_terminates_with_all_positions() {
    let graph = load_fixture("cycle.json");
    let config = LayoutConfig {
        random_seed: Some(4),
        ..LayoutConfig::default()
    };
    let result = compute_layout(&graph, &config).unwrap();
    assert_eq!(result.nodes.len(), 4);
    assert!(result.diagnostics.cyclic);
    assert_eq!(result.routed_edge_count(), 4);
}

#[test]
fn zero_iterations_is_deterministic_without_a_seed() {
    let graph = load_fixture("roadmap.json");
    let first = compute_layout(&graph, &still()).unwrap();
    let second = compute_layout(&graph, &still()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn same_seed_same_layout() {
    let graph = load_fixture("roadmap.json");
    let config = LayoutConfig {
        random_seed: Some(99),
        optimization_iterations: 120,
        ..LayoutConfig::default()
    };
    assert_eq!(
        compute_layout(&graph, &config).unwrap(),
        compute_layout(&graph, &config).unwrap()
    );
}

#[test]
fn roadmap_edges_point_forward() {
    let graph = load_fixture("roadmap.json");
    for rank_mode in [RankMode::Sequential, RankMode::Layered] {
        let config = LayoutConfig {
            rank_mode,
            ..still()
        };
        let result = compute_layout(&graph, &config).unwrap();
        for edge in &result.edges {
            let from = result.position(&edge.source).unwrap();
            let to = result.position(&edge.target).unwrap();
            assert!(from.x < to.x, "{} -> {} ({rank_mode:?})", edge.source, edge.target);
        }
    }
}

#[test]
fn layered_ranks_share_columns() {
    let graph = load_fixture("roadmap.json");
    let config = LayoutConfig {
        rank_mode: RankMode::Layered,
        ..still()
    };
    let result = compute_layout(&graph, &config).unwrap();
    let discovery = result.position("discovery").unwrap();
    let api = result.position("api").unwrap();
    assert_eq!(discovery.x, api.x);
    assert!((discovery.y - api.y).abs() >= config.node_separation - EPS);
}

#[test]
fn junctions_and_extra_fields_survive() {
    let graph = load_fixture("roadmap.json");
    let result = compute_layout(&graph, &still()).unwrap();
    assert_eq!(result.diagnostics.junctions, 2);
    assert!(result.node("beta").unwrap().junction);
    assert_eq!(result.node("beta").unwrap().weight, 3.0);
    assert!(!result.node("api").unwrap().junction);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["nodes"][0]["owner"], "pm");
    assert_eq!(value["nodes"][0]["name"], "Discovery");
    assert_eq!(value["edges"][5]["milestone"], true);
    assert!(value["edges"][0]["sourcePoint"].is_object());
    assert_eq!(value["edges"][0]["controlPoints"].as_array().unwrap().len(), 2);

    let product: Vec<_> = result
        .edges_on_line("product")
        .map(|edge| (edge.source.as_str(), edge.target.as_str()))
        .collect();
    assert_eq!(
        product,
        vec![("discovery", "design"), ("design", "beta"), ("beta", "launch")]
    );
}

#[test]
fn input_graph_is_untouched() {
    let graph = load_fixture("roadmap.json");
    let before = graph.clone();
    compute_layout(
        &graph,
        &LayoutConfig {
            random_seed: Some(1),
            ..LayoutConfig::default()
        },
    )
    .unwrap();
    assert_eq!(graph, before);
}

#[test]
fn laying_out_a_result_again_keeps_keys_unique() {
    let graph = load_fixture("roadmap.json");
    let first = compute_layout(&graph, &still()).unwrap();
    let relaid_input = Graph::from_json(&serde_json::to_string(&first).unwrap()).unwrap();
    let config = LayoutConfig {
        padding: 500.0,
        ..still()
    };
    let second = compute_layout(&relaid_input, &config).unwrap();
    let text = serde_json::to_string(&second).unwrap();

    let count = |key: &str| text.matches(&format!("\"{key}\"")).count();
    assert_eq!(count("junction"), second.nodes.len());
    assert_eq!(count("controlPoints"), second.edges.len());
    assert_eq!(count("sourcePoint"), second.routed_edge_count());
    assert_eq!(count("targetPoint"), second.routed_edge_count());

    // The fresh geometry wins over the stale copy carried in the input.
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value["edges"][0]["controlPoints"][0]["x"],
        json!(second.edges[0].control_points[0].x)
    );
    assert_eq!(value["nodes"][0]["owner"], "pm");
    assert_eq!(value["edges"][5]["milestone"], true);
}

#[test]
fn sequential_ranks_without_separation_share_one_group() {
    let mut graph = Graph::new();
    for id in ["A", "B", "C"] {
        graph.ensure_node(id, &["L1"]);
    }
    graph.add_edge("A", "B", Some("L1"));
    graph.add_edge("B", "C", Some("L1"));
    let config = LayoutConfig {
        rank_mode: RankMode::Sequential,
        rank_separation: 0.0,
        ..still()
    };
    let result = compute_layout(&graph, &config).unwrap();

    // Every node lands on the same column, so crossing minimization spaces
    // them as one group; equal barycenters fall back to id order.
    for (id, y) in [("A", 20.0), ("B", 70.0), ("C", 120.0)] {
        let position = result.position(id).unwrap();
        assert!((position.x - config.padding).abs() < EPS, "{id} x {}", position.x);
        assert!((position.y - y).abs() < EPS, "{id} y {}", position.y);
    }
    assert_well_formed(&result, &graph, config.padding, "sequential-zero-separation");
}

#[test]
fn dangling_edges_are_lenient_by_default() {
    let graph = load_fixture("dangling.json");
    let result = compute_layout(&graph, &still()).unwrap();
    assert_eq!(result.diagnostics.dangling_edges, vec![1]);
    assert!(result.edges[0].is_routed());
    assert!(!result.edges[1].is_routed());
    assert!(result.edges[1].control_points.is_empty());
}

#[test]
fn strict_mode_reports_dangling_edges() {
    let graph = load_fixture("dangling.json");
    let config = LayoutConfig {
        strict: true,
        ..still()
    };
    let err = compute_layout(&graph, &config).unwrap_err();
    assert_eq!(
        err,
        LayoutError::DanglingEdge {
            index: 1,
            from: "B".into(),
            to: "archived".into(),
            missing: "archived".into(),
        }
    );
    assert!(err.to_string().contains("archived"));
}

#[test]
fn algorithm_aliases_are_reported() {
    let graph = load_fixture("chain.json");
    for algorithm in [
        LayoutAlgorithm::Dagre,
        LayoutAlgorithm::CoseBilkent,
        LayoutAlgorithm::Klay,
    ] {
        let config = LayoutConfig {
            layout_algorithm: algorithm,
            ..still()
        };
        let aliased = compute_layout(&graph, &config).unwrap();
        let metro = compute_layout(&graph, &still()).unwrap();
        assert_eq!(aliased.diagnostics.algorithm, LayoutAlgorithm::Metro);
        assert_eq!(aliased.nodes, metro.nodes);

        let strict = LayoutConfig {
            strict: true,
            ..config
        };
        assert!(matches!(
            compute_layout(&graph, &strict),
            Err(LayoutError::UnsupportedAlgorithm(_))
        ));
    }
}

#[test]
fn routed_controls_follow_direction_bias() {
    let graph = load_fixture("chain.json");
    for bias in [0.0, 0.3, 1.0] {
        let config = LayoutConfig {
            direction_bias: bias,
            ..still()
        };
        let result = compute_layout(&graph, &config).unwrap();
        for edge in &result.edges {
            let source = edge.source_point.unwrap();
            let target = edge.target_point.unwrap();
            let expected = control_points(source, target, Direction::Horizontal, bias);
            assert_eq!(edge.control_points, expected.to_vec());
            assert_eq!(edge.control_points[0].y, source.y);
            assert_eq!(edge.control_points[1].y, target.y);
        }
    }
}

#[test]
fn config_file_feeds_the_engine() {
    let path = std::env::temp_dir().join(format!("metro-layout-{}.json5", std::process::id()));
    std::fs::write(
        &path,
        "{ preferredDirection: 'vertical', optimizationIterations: 0, padding: 5 }",
    )
    .unwrap();
    let config = load_config(Some(&path)).unwrap();
    std::fs::remove_file(&path).ok();

    let result = compute_layout(&load_fixture("chain.json"), &config).unwrap();
    let ys: Vec<f64> = ["A", "B", "C"]
        .iter()
        .map(|id| result.position(id).unwrap().y)
        .collect();
    assert_eq!(ys, vec![5.0, 105.0, 205.0]);
}
