use crate::ir::{Direction, Point};

use super::types::{LayoutGraph, RoutedEdge};

/// Default polyline resolution for [`RoutedEdge::sample`] callers.
pub const DEFAULT_CURVE_SEGMENTS: usize = 16;

/// Two cubic Bézier control points between fixed endpoints.
///
/// Along the preferred axis the first control point moves from the source
/// toward the target by `delta * bias`, keeping the source's cross
/// coordinate; the second mirrors it from the target side. A bias of 0 puts
/// the controls on the endpoints (a straight segment), a bias of 1 gives the
/// full metro elbow.
pub fn control_points(source: Point, target: Point, direction: Direction, bias: f64) -> [Point; 2] {
    let dx = target.x - source.x;
    let dy = target.y - source.y;
    match direction {
        Direction::Horizontal => [
            Point::new(source.x + dx * bias, source.y),
            Point::new(target.x - dx * bias, target.y),
        ],
        Direction::Vertical => [
            Point::new(source.x, source.y + dy * bias),
            Point::new(target.x, target.y - dy * bias),
        ],
    }
}

/// Routes every input edge against fixed node positions. Edges with an
/// unknown endpoint come back unrouted: no endpoints, no control points.
pub(super) fn route_edges(
    graph: &LayoutGraph<'_>,
    positions: &[Point],
    direction: Direction,
    bias: f64,
) -> Vec<RoutedEdge> {
    (0..graph.edge_count())
        .map(|idx| {
            let input = graph.input_edge(idx);
            let mut routed = RoutedEdge {
                source: input.source.clone(),
                target: input.target.clone(),
                line: input.line.clone(),
                source_point: None,
                target_point: None,
                control_points: Vec::new(),
                extra: graph.edge_extra(idx),
            };
            if let Some((from, to)) = graph.endpoints(idx) {
                let start = positions[from];
                let end = positions[to];
                routed.source_point = Some(start);
                routed.target_point = Some(end);
                routed.control_points = control_points(start, end, direction, bias).to_vec();
            }
            routed
        })
        .collect()
}

pub(crate) fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

pub(crate) fn sample_cubic(p0: Point, p1: Point, p2: Point, p3: Point, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|step| {
            // Pin the ends exactly; the polynomial can drift by an ulp.
            if step == 0 {
                p0
            } else if step == segments {
                p3
            } else {
                cubic_point(p0, p1, p2, p3, step as f64 / segments as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Graph;

    #[test]
    fn horizontal_controls_pull_along_x() {
        let [c1, c2] = control_points(
            Point::new(0.0, 0.0),
            Point::new(100.0, 40.0),
            Direction::Horizontal,
            0.5,
        );
        assert_eq!(c1, Point::new(50.0, 0.0));
        assert_eq!(c2, Point::new(50.0, 40.0));
    }

    #[test]
    fn vertical_controls_pull_along_y() {
        let [c1, c2] = control_points(
            Point::new(10.0, 0.0),
            Point::new(30.0, 200.0),
            Direction::Vertical,
            0.25,
        );
        assert_eq!(c1, Point::new(10.0, 50.0));
        assert_eq!(c2, Point::new(30.0, 150.0));
    }

    #[test]
    fn zero_bias_is_a_straight_segment() {
        let source = Point::new(3.0, 4.0);
        let target = Point::new(90.0, -12.0);
        for direction in [Direction::Horizontal, Direction::Vertical] {
            assert_eq!(control_points(source, target, direction, 0.0), [source, target]);
        }
    }

    #[test]
    fn full_bias_makes_an_elbow() {
        let [c1, c2] = control_points(
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
            Direction::Horizontal,
            1.0,
        );
        assert_eq!(c1, Point::new(100.0, 0.0));
        assert_eq!(c2, Point::new(0.0, 50.0));
    }

    #[test]
    fn routing_is_idempotent_for_fixed_positions() {
        let mut graph = Graph::new();
        graph.ensure_node("A", &["L1"]);
        graph.ensure_node("B", &["L1"]);
        graph.add_edge("A", "B", Some("L1"));
        let snapshot = LayoutGraph::from_graph(&graph).unwrap();
        let positions = vec![Point::new(0.0, 0.0), Point::new(120.0, 30.0)];
        let first = route_edges(&snapshot, &positions, Direction::Horizontal, 0.7);
        let second = route_edges(&snapshot, &positions, Direction::Horizontal, 0.7);
        assert_eq!(first, second);
        assert_eq!(first[0].control_points.len(), 2);
        assert_eq!(first[0].line.as_deref(), Some("L1"));
    }

    #[test]
    fn dangling_edge_is_left_unrouted() {
        let mut graph = Graph::new();
        graph.ensure_node("A", &[]);
        graph.add_edge("A", "missing", None);
        let snapshot = LayoutGraph::from_graph(&graph).unwrap();
        let routed = route_edges(&snapshot, &[Point::ORIGIN], Direction::Horizontal, 0.5);
        assert_eq!(routed.len(), 1);
        assert!(!routed[0].is_routed());
        assert!(routed[0].control_points.is_empty());
        assert!(routed[0].source_point.is_none());
        assert!(routed[0].sample(8).is_empty());
    }

    #[test]
    fn sampling_hits_endpoints_and_midpoint() {
        let p0 = Point::new(0.0, 0.0);
        let p3 = Point::new(100.0, 40.0);
        let [p1, p2] = control_points(p0, p3, Direction::Horizontal, 0.5);
        let points = sample_cubic(p0, p1, p2, p3, 4);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], p0);
        assert_eq!(points[4], p3);
        // Symmetric controls put the curve midpoint at the segment midpoint.
        assert!((points[2].x - 50.0).abs() < 1e-9);
        assert!((points[2].y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn zero_segments_still_yields_endpoints() {
        let p0 = Point::new(1.0, 1.0);
        let p3 = Point::new(2.0, 2.0);
        assert_eq!(sample_cubic(p0, p0, p3, p3, 0), vec![p0, p3]);
    }
}
