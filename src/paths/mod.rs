//! Shortest-path algorithms over segment graphs.
//!
//! Three cost models share one protocol: take a source and target shape,
//! walk the graph, then write a measure column and an order column back
//! into the attribute table. Columns are reset up front so reruns are
//! idempotent; shapes off the found path keep the -1.0 placeholder.
//!
//! Traversal follows travel through a segment: a shape entered at one
//! endpoint is only left through the other. The source shape, having no
//! entry, is left through both ends.

pub mod angular;
pub mod metric;
pub mod topological;

pub use angular::AngularShortestPath;
pub use metric::MetricShortestPath;
pub use topological::TopologicalShortestPath;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::attributes::{AttributeKey, AttributeTable};
use crate::geom::Point2;
use crate::graph::SegmentGraph;
use crate::{Error, Result};

// ============================================================================
// Progress reporting
// ============================================================================

/// Callback polled once per processed shape during a run. Return `false`
/// to cancel; the run then stops with [`Error::Cancelled`] and leaves the
/// output columns in their reset state for unvisited shapes.
pub trait Progress {
    fn update(&mut self, completed: usize, total: usize) -> bool;
}

pub(crate) fn poll(
    progress: &mut Option<&mut dyn Progress>,
    completed: usize,
    total: usize,
) -> Result<()> {
    if let Some(p) = progress.as_deref_mut() {
        if !p.update(completed, total) {
            return Err(Error::Cancelled);
        }
    }
    Ok(())
}

// ============================================================================
// Shared walk plumbing
// ============================================================================

/// The endpoints of the current selection, lowest key as source. Exactly
/// two shapes must be selected.
pub(crate) fn selection_endpoints(table: &AttributeTable) -> Result<(AttributeKey, AttributeKey)> {
    let selected = table.selected_keys();
    if selected.len() != 2 {
        return Err(Error::InvalidSelection(selected.len()));
    }
    Ok((selected[0], selected[1]))
}

pub(crate) fn check_endpoints(
    graph: &SegmentGraph,
    from: AttributeKey,
    to: AttributeKey,
) -> Result<()> {
    if !graph.contains(from) {
        return Err(Error::KeyNotFound(from));
    }
    if !graph.contains(to) {
        return Err(Error::KeyNotFound(to));
    }
    Ok(())
}

/// Neighbours of `key` reachable given the junction it was entered
/// through, paired with the junction each transfer happens at. With no
/// entry (the source shape) both endpoints are open.
pub(crate) fn reachable_neighbours(
    graph: &SegmentGraph,
    key: AttributeKey,
    entry: Option<Point2>,
) -> SmallVec<[(AttributeKey, Point2); 8]> {
    let mut out = SmallVec::new();
    let (Some(connector), Some(line)) = (graph.connector(key), graph.segment(key)) else {
        return out;
    };
    let exit = entry.map(|junction| line.far_end(&junction));
    for &neighbour in &connector.connections {
        let Some(junction) = graph.junction_between(key, neighbour) else {
            continue;
        };
        if let Some(exit) = exit {
            if !junction.approx_eq(&exit, graph.tolerance()) {
                continue;
            }
        }
        out.push((neighbour, junction));
    }
    out
}

/// Walk predecessor links back from `to`; `None` when `to` was never
/// reached. The result runs source first.
pub(crate) fn trace_path(
    from: AttributeKey,
    to: AttributeKey,
    predecessors: &HashMap<AttributeKey, AttributeKey>,
) -> Option<Vec<AttributeKey>> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        current = *predecessors.get(&current)?;
        path.push(current);
    }
    path.reverse();
    Some(path)
}

/// Write one (measure, order) pair per shape on the path; order is the
/// rank from the source. Shapes absent from the table are skipped.
pub(crate) fn write_path(
    table: &mut AttributeTable,
    measure_column: usize,
    order_column: usize,
    path: &[(AttributeKey, f64)],
) -> Result<()> {
    for (order, (key, measure)) in path.iter().enumerate() {
        if let Some(row) = table.get_mut(*key) {
            row.set_value(measure_column, *measure)?;
            row.set_value(order_column, order as f64)?;
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Line;

    fn key(i: i64) -> AttributeKey {
        AttributeKey(i)
    }

    #[test]
    fn test_selection_endpoints() {
        let mut table = AttributeTable::new();
        for i in 0..4 {
            table.add_row(key(i)).unwrap();
        }
        table.set_selected(key(3), true).unwrap();
        table.set_selected(key(1), true).unwrap();

        // lowest key is the source regardless of selection order
        assert!(matches!(selection_endpoints(&table), Ok((a, b)) if a == key(1) && b == key(3)));

        table.set_selected(key(0), true).unwrap();
        assert!(matches!(
            selection_endpoints(&table),
            Err(Error::InvalidSelection(3))
        ));

        table.clear_selection();
        assert!(matches!(
            selection_endpoints(&table),
            Err(Error::InvalidSelection(0))
        ));
    }

    #[test]
    fn test_reachable_neighbours_respect_entry_end() {
        // b runs (1,0)-(2,0); a joins at its left end, c and d at its right
        let mut graph = SegmentGraph::new();
        graph.add_segment(key(0), Line::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)));
        graph.add_segment(key(1), Line::new(Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)));
        graph.add_segment(key(2), Line::new(Point2::new(2.0, 0.0), Point2::new(2.0, 1.0)));
        graph.add_segment(key(3), Line::new(Point2::new(2.0, 0.0), Point2::new(3.0, 0.0)));
        graph.make_connections(1e-9);

        let all: Vec<_> = reachable_neighbours(&graph, key(1), None)
            .iter()
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(all, vec![key(0), key(2), key(3)]);

        // entered from a at (1,0), only the far-end junctions remain open
        let onward: Vec<_> = reachable_neighbours(&graph, key(1), Some(Point2::new(1.0, 0.0)))
            .iter()
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(onward, vec![key(2), key(3)]);

        // c entered at (2,0) dead-ends: d shares that junction but not c's far end
        assert!(reachable_neighbours(&graph, key(2), Some(Point2::new(2.0, 0.0))).is_empty());
    }

    #[test]
    fn test_trace_path() {
        let mut predecessors = HashMap::new();
        predecessors.insert(key(2), key(1));
        predecessors.insert(key(1), key(0));

        assert_eq!(
            trace_path(key(0), key(2), &predecessors),
            Some(vec![key(0), key(1), key(2)])
        );
        assert_eq!(trace_path(key(0), key(0), &predecessors), Some(vec![key(0)]));
        assert_eq!(trace_path(key(0), key(9), &predecessors), None);
    }
}
