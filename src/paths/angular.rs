//! Angular ("tulip") shortest path: least accumulated turning.
//!
//! Turn angles are quantised onto an integer scale of `bins` steps per
//! full turn, truncating fractional steps, and routes are settled with a
//! circular bucket queue in the manner of Dial's algorithm. The written
//! measure converts the integer cost back to quarter-turn units, so a
//! single right angle scores 1.0 whatever the bin count.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use hashbrown::HashMap;
use tracing::debug;

use crate::attributes::{AttributeKey, AttributeTable};
use crate::geom::{Line, Point2, turn_angle};
use crate::graph::SegmentGraph;
use crate::paths::{
    Progress, check_endpoints, poll, reachable_neighbours, selection_endpoints, trace_path,
    write_path,
};
use crate::Result;

pub const ANGLE_COLUMN: &str = "Angular Shortest Path Angle";
pub const ORDER_COLUMN: &str = "Angular Shortest Path Order";

const DEFAULT_BINS: usize = 1024;

// ============================================================================
// Bucket queue
// ============================================================================

/// Circular bucket queue keyed by cost modulo the bin count. Single-step
/// increments never exceed half a turn, so the ascending scan from the
/// current bucket always finds the minimum pending cost first. FIFO
/// within a bucket.
struct BucketQueue {
    bins: Vec<VecDeque<(u64, AttributeKey, Option<Point2>)>>,
    current: usize,
    open: usize,
}

impl BucketQueue {
    fn new(bins: usize) -> Self {
        Self {
            bins: (0..bins).map(|_| VecDeque::new()).collect(),
            current: 0,
            open: 0,
        }
    }

    fn push(&mut self, cost: u64, key: AttributeKey, entry: Option<Point2>) {
        let bucket = (cost % self.bins.len() as u64) as usize;
        self.bins[bucket].push_back((cost, key, entry));
        self.open += 1;
    }

    fn pop(&mut self) -> Option<(u64, AttributeKey, Option<Point2>)> {
        while self.open > 0 {
            if let Some(item) = self.bins[self.current].pop_front() {
                self.open -= 1;
                return Some(item);
            }
            self.current = (self.current + 1) % self.bins.len();
        }
        None
    }
}

// ============================================================================
// Algorithm
// ============================================================================

/// Least-turn search from `from` to `to`. `bins` controls the angular
/// resolution; the default of 1024 quantises to roughly a third of a
/// degree per step.
#[derive(Debug, Clone, Copy)]
pub struct AngularShortestPath {
    from: AttributeKey,
    to: AttributeKey,
    bins: usize,
}

impl AngularShortestPath {
    pub fn new(from: AttributeKey, to: AttributeKey) -> Self {
        Self {
            from,
            to,
            bins: DEFAULT_BINS,
        }
    }

    /// Source and target from the table's current selection (exactly two
    /// shapes, lowest key as source).
    pub fn from_selection(table: &AttributeTable) -> Result<Self> {
        let (from, to) = selection_endpoints(table)?;
        Ok(Self::new(from, to))
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins.max(1);
        self
    }

    fn turn_cost(&self, current: &Line, neighbour: &Line, junction: &Point2) -> u64 {
        let incoming = Line::direction(&current.far_end(junction), junction);
        let outgoing = Line::direction(junction, &neighbour.far_end(junction));
        (turn_angle(incoming, outgoing) / TAU * self.bins as f64) as u64
    }

    pub fn run(
        &self,
        graph: &SegmentGraph,
        table: &mut AttributeTable,
        mut progress: Option<&mut dyn Progress>,
    ) -> Result<()> {
        debug!(from = %self.from, to = %self.to, bins = self.bins, "angular shortest path");
        let angle_column = table.insert_or_reset_column(ANGLE_COLUMN);
        let order_column = table.insert_or_reset_column(ORDER_COLUMN);
        check_endpoints(graph, self.from, self.to)?;

        let total = graph.len();
        let mut best: HashMap<AttributeKey, u64> = HashMap::new();
        let mut predecessors: HashMap<AttributeKey, AttributeKey> = HashMap::new();
        best.insert(self.from, 0);

        let mut queue = BucketQueue::new(self.bins);
        queue.push(0, self.from, None);
        let mut processed = 0;

        while let Some((cost, current, entry)) = queue.pop() {
            if cost > best[&current] {
                continue; // superseded by a flatter route
            }
            processed += 1;
            poll(&mut progress, processed, total)?;
            if current == self.to {
                break;
            }
            let Some(line) = graph.segment(current).copied() else {
                continue;
            };
            for (neighbour, junction) in reachable_neighbours(graph, current, entry) {
                let Some(next_line) = graph.segment(neighbour) else {
                    continue;
                };
                let next_cost = cost + self.turn_cost(&line, next_line, &junction);
                if best.get(&neighbour).is_none_or(|&c| next_cost < c) {
                    best.insert(neighbour, next_cost);
                    predecessors.insert(neighbour, current);
                    queue.push(next_cost, neighbour, Some(junction));
                }
            }
        }

        if let Some(path) = trace_path(self.from, self.to, &predecessors) {
            let steps: Vec<(AttributeKey, f64)> = path
                .iter()
                .map(|key| (*key, best[key] as f64 * 4.0 / self.bins as f64))
                .collect();
            write_path(table, angle_column, order_column, &steps)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
