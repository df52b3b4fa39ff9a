//! Metric shortest path: least travelled distance.
//!
//! Transferring from one segment to the next costs the distance between
//! their centres through the shared junction, half of each segment's
//! length. Summed along a path this is the walked distance from the
//! middle of the source to the middle of each reached shape.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

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

pub const DISTANCE_COLUMN: &str = "Metric Shortest Path Distance";
pub const ORDER_COLUMN: &str = "Metric Shortest Path Order";

struct HeapEntry {
    dist: f64,
    key: AttributeKey,
    entry: Option<Point2>,
}

// Min-heap on distance, equal distances popped in ascending key order.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

/// Dijkstra over segment centres. Relaxation is strictly-less, so the
/// first settled route at a given distance wins.
#[derive(Debug, Clone, Copy)]
pub struct MetricShortestPath {
    from: AttributeKey,
    to: AttributeKey,
}

impl MetricShortestPath {
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
        debug!(from = %self.from, to = %self.to, "metric shortest path");
        let distance_column = table.insert_or_reset_column(DISTANCE_COLUMN);
        let order_column = table.insert_or_reset_column(ORDER_COLUMN);
        check_endpoints(graph, self.from, self.to)?;

        let total = graph.len();
        let mut best: HashMap<AttributeKey, f64> = HashMap::new();
        let mut predecessors: HashMap<AttributeKey, AttributeKey> = HashMap::new();
        best.insert(self.from, 0.0);

        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            dist: 0.0,
            key: self.from,
            entry: None,
        });
        let mut processed = 0;

        while let Some(item) = heap.pop() {
            if item.dist > best[&item.key] {
                continue; // superseded by a shorter route
            }
            processed += 1;
            poll(&mut progress, processed, total)?;
            if item.key == self.to {
                break;
            }
            let half_here = graph.segment(item.key).map_or(0.0, |l| l.length() / 2.0);
            for (neighbour, junction) in reachable_neighbours(graph, item.key, item.entry) {
                let half_there = graph.segment(neighbour).map_or(0.0, |l| l.length() / 2.0);
                let dist = item.dist + half_here + half_there;
                if best.get(&neighbour).is_none_or(|&d| dist < d) {
                    best.insert(neighbour, dist);
                    predecessors.insert(neighbour, item.key);
                    heap.push(HeapEntry {
                        dist,
                        key: neighbour,
                        entry: Some(junction),
                    });
                }
            }
        }

        if let Some(path) = trace_path(self.from, self.to, &predecessors) {
            let steps: Vec<(AttributeKey, f64)> =
                path.iter().map(|key| (*key, best[key])).collect();
            write_path(table, distance_column, order_column, &steps)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
