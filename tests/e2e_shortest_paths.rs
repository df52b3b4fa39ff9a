//! End-to-end shortest-path tests on a small street network.
//!
//! Each test exercises: build graph -> derive connections -> select
//! endpoints -> run -> read the written columns back from the table.
//! The network is ten trimmed street segments around two city blocks;
//! source is shape 1 (upper right), target shape 9 (lower left spur).

use pretty_assertions::assert_eq;
use spacegraph_rs::{
    AngularShortestPath, AttributeKey, AttributeTable, Line, MetricShortestPath, Point2,
    SegmentGraph, TopologicalShortestPath,
};

const SEGMENTS: [((f64, f64), (f64, f64)); 10] = [
    ((1.166666667, 1.0), (3.5, 1.0)),
    ((3.5, 3.0), (4.154485790, 3.756074300)),
    ((2.5, 3.0), (3.5, 3.0)),
    ((1.166666667, 1.0), (1.333333333, 2.0)),
    ((3.5, 3.0), (3.5, 1.0)),
    ((1.333333333, 2.0), (2.024264706, 2.377941176)),
    ((2.024264706, 2.377941176), (2.5, 3.0)),
    ((1.333333333, 2.0), (1.710620908, 2.751960779)),
    ((1.710620908, 2.751960779), (2.5, 3.0)),
    ((1.166666667, 1.0), (0.459559890, 0.292893220)),
];

fn setup() -> (SegmentGraph, AttributeTable) {
    let mut graph = SegmentGraph::new();
    for (i, ((ax, ay), (bx, by))) in SEGMENTS.iter().enumerate() {
        graph.add_segment(
            AttributeKey(i as i64),
            Line::new(Point2::new(*ax, *ay), Point2::new(*bx, *by)),
        );
    }
    graph.make_connections(1e-6);

    let mut table = AttributeTable::new();
    for key in graph.keys() {
        table.add_row(key).unwrap();
    }
    table.set_selected(AttributeKey(1), true).unwrap();
    table.set_selected(AttributeKey(9), true).unwrap();
    (graph, table)
}

fn column_values(table: &AttributeTable, name: &str) -> Vec<f64> {
    let column = table.column_index(name).unwrap();
    table
        .iter()
        .map(|(_, row)| row.value(column).unwrap())
        .collect()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() < 0.001,
            "shape {i}: got {a}, expected {e} (full column {actual:?})"
        );
    }
}

// ============================================================================
// 1. Topological: fewest transfers
// ============================================================================

#[test]
fn test_topological_shortest_path() {
    let (graph, mut table) = setup();
    TopologicalShortestPath::from_selection(&table)
        .unwrap()
        .run(&graph, &mut table, None)
        .unwrap();

    let expected = [2.0, 0.0, -1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 3.0];
    assert_close(
        &column_values(&table, "Topological Shortest Path Depth"),
        &expected,
    );
    assert_close(
        &column_values(&table, "Topological Shortest Path Order"),
        &expected,
    );
}

// ============================================================================
// 2. Metric: least distance between segment centres
// ============================================================================

#[test]
fn test_metric_shortest_path() {
    let (graph, mut table) = setup();
    MetricShortestPath::from_selection(&table)
        .unwrap()
        .run(&graph, &mut table, None)
        .unwrap();

    assert_close(
        &column_values(&table, "Metric Shortest Path Distance"),
        &[
            -1.0, 0.0, 1.0, 3.57756, -1.0, 2.67689, 1.89156, -1.0, -1.0, 4.58446,
        ],
    );
    assert_close(
        &column_values(&table, "Metric Shortest Path Order"),
        &[-1.0, 0.0, 1.0, 4.0, -1.0, 3.0, 2.0, -1.0, -1.0, 5.0],
    );
}

// ============================================================================
// 3. Angular: least accumulated turning, in quarter-turn units
// ============================================================================

#[test]
fn test_angular_shortest_path() {
    let (graph, mut table) = setup();
    AngularShortestPath::from_selection(&table)
        .unwrap()
        .run(&graph, &mut table, None)
        .unwrap();

    assert_close(
        &column_values(&table, "Angular Shortest Path Angle"),
        &[
            -1.0, 0.0, 0.542969, 1.429688, -1.0, -1.0, -1.0, 1.242188, 0.734375, 1.824219,
        ],
    );
    assert_close(
        &column_values(&table, "Angular Shortest Path Order"),
        &[-1.0, 0.0, 1.0, 4.0, -1.0, -1.0, -1.0, 3.0, 2.0, 5.0],
    );
}

// ============================================================================
// 4. The three cost models pick three different routes
// ============================================================================

#[test]
fn test_cost_models_disagree_on_route() {
    let (graph, mut table) = setup();
    TopologicalShortestPath::from_selection(&table)
        .unwrap()
        .run(&graph, &mut table, None)
        .unwrap();
    MetricShortestPath::from_selection(&table)
        .unwrap()
        .run(&graph, &mut table, None)
        .unwrap();
    AngularShortestPath::from_selection(&table)
        .unwrap()
        .run(&graph, &mut table, None)
        .unwrap();

    let on_path = |name: &str| -> Vec<i64> {
        let column = table.column_index(name).unwrap();
        table
            .iter()
            .filter(|(_, row)| row.value(column) != Some(-1.0))
            .map(|(key, _)| key.0)
            .collect()
    };

    assert_eq!(on_path("Topological Shortest Path Order"), vec![0, 1, 4, 9]);
    assert_eq!(
        on_path("Metric Shortest Path Order"),
        vec![1, 2, 3, 5, 6, 9]
    );
    assert_eq!(
        on_path("Angular Shortest Path Order"),
        vec![1, 2, 3, 7, 8, 9]
    );
}

// ============================================================================
// 5. Reruns reset their columns instead of stacking new ones
// ============================================================================

#[test]
fn test_rerun_is_idempotent() {
    let (graph, mut table) = setup();
    let algorithm = MetricShortestPath::from_selection(&table).unwrap();

    algorithm.run(&graph, &mut table, None).unwrap();
    let first = column_values(&table, "Metric Shortest Path Distance");
    let columns = table.num_columns();

    algorithm.run(&graph, &mut table, None).unwrap();
    assert_eq!(table.num_columns(), columns);
    assert_eq!(column_values(&table, "Metric Shortest Path Distance"), first);
}

// ============================================================================
// 6. Unreachable target: clean run, placeholders everywhere
// ============================================================================

#[test]
fn test_unreachable_target() {
    let (mut graph, mut table) = setup();
    graph.add_segment(
        AttributeKey(10),
        Line::new(Point2::new(20.0, 20.0), Point2::new(21.0, 20.0)),
    );
    graph.make_connections(1e-6);
    table.add_row(AttributeKey(10)).unwrap();

    TopologicalShortestPath::new(AttributeKey(1), AttributeKey(10))
        .run(&graph, &mut table, None)
        .unwrap();

    let expected = vec![-1.0; 11];
    assert_eq!(
        column_values(&table, "Topological Shortest Path Depth"),
        expected
    );
    assert_eq!(
        column_values(&table, "Topological Shortest Path Order"),
        expected
    );
}
