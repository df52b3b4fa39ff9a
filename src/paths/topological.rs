//! Topological shortest path: fewest segment-to-segment steps.

use std::collections::VecDeque;

use hashbrown::HashMap;
use tracing::debug;

use crate::attributes::{AttributeKey, AttributeTable};
use crate::geom::Point2;
use crate::graph::SegmentGraph;
use crate::paths::{
    Progress, check_endpoints, poll, reachable_neighbours, selection_endpoints, trace_path,
    write_path,
};
use crate::Result;

pub const DEPTH_COLUMN: &str = "Topological Shortest Path Depth";
pub const ORDER_COLUMN: &str = "Topological Shortest Path Order";

/// Breadth-first search from `from` to `to`; each transfer between
/// segments costs one step. The first discovery of a shape fixes its
/// predecessor, so equal-depth ties resolve in ascending key order.
#[derive(Debug, Clone, Copy)]
pub struct TopologicalShortestPath {
    from: AttributeKey,
    to: AttributeKey,
}

impl TopologicalShortestPath {
    pub fn new(from: AttributeKey, to: AttributeKey) -> Self {
        Self { from, to }
    }

    /// Source and target from the table's current selection (exactly two
    /// shapes, lowest key as source).
    pub fn from_selection(table: &AttributeTable) -> Result<Self> {
        let (from, to) = selection_endpoints(table)?;
        Ok(Self::new(from, to))
    }

    pub fn run(
        &self,
        graph: &SegmentGraph,
        table: &mut AttributeTable,
        mut progress: Option<&mut dyn Progress>,
    ) -> Result<()> {
        debug!(from = %self.from, to = %self.to, "topological shortest path");
        let depth_column = table.insert_or_reset_column(DEPTH_COLUMN);
        let order_column = table.insert_or_reset_column(ORDER_COLUMN);
        check_endpoints(graph, self.from, self.to)?;

        let total = graph.len();
        let mut predecessors: HashMap<AttributeKey, AttributeKey> = HashMap::new();
        let mut entries: HashMap<AttributeKey, Option<Point2>> = HashMap::new();
        entries.insert(self.from, None);

        let mut queue: VecDeque<AttributeKey> = VecDeque::new();
        queue.push_back(self.from);
        let mut processed = 0;

        'walk: while let Some(current) = queue.pop_front() {
            processed += 1;
            poll(&mut progress, processed, total)?;
            let entry = entries[&current];
            for (neighbour, junction) in reachable_neighbours(graph, current, entry) {
                if entries.contains_key(&neighbour) {
                    continue;
                }
                entries.insert(neighbour, Some(junction));
                predecessors.insert(neighbour, current);
                if neighbour == self.to {
                    break 'walk;
                }
                queue.push_back(neighbour);
            }
        }

        if let Some(path) = trace_path(self.from, self.to, &predecessors) {
            let steps: Vec<(AttributeKey, f64)> = path
                .iter()
                .enumerate()
                .map(|(depth, key)| (*key, depth as f64))
                .collect();
            write_path(table, depth_column, order_column, &steps)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
