//! Segment adjacency: one `Connector` per shape.
//!
//! The graph is an input to the path algorithms, produced by an external
//! map builder. Connectors carry neighbour references only, no edge
//! weights; traversal costs are derived from segment geometry at walk
//! time. `make_connections` is the minimal adjacency derivation for maps
//! that arrive without connectors: it links segments sharing an endpoint.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attributes::AttributeKey;
use crate::geom::{Line, Point2};

/// Per-shape adjacency record: the references of connected shapes, kept
/// sorted so traversal order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub connections: SmallVec<[AttributeKey; 8]>,
}

impl Connector {
    pub fn new(mut connections: SmallVec<[AttributeKey; 8]>) -> Self {
        connections.sort_unstable();
        connections.dedup();
        Self { connections }
    }
}

/// A collection of line segments with per-segment connectivity, keyed by
/// the same `AttributeKey`s as the attribute table rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentGraph {
    segments: BTreeMap<AttributeKey, Line>,
    connectors: BTreeMap<AttributeKey, Connector>,
    tolerance: f64,
}

impl SegmentGraph {
    pub fn new() -> Self {
        Self {
            segments: BTreeMap::new(),
            connectors: BTreeMap::new(),
            tolerance: 1e-9,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, key: AttributeKey) -> bool {
        self.segments.contains_key(&key)
    }

    /// Insert a segment shape, replacing any existing shape under the same
    /// reference. Connectors are not updated automatically.
    pub fn add_segment(&mut self, key: AttributeKey, line: Line) {
        self.segments.insert(key, line);
    }

    pub fn segment(&self, key: AttributeKey) -> Option<&Line> {
        self.segments.get(&key)
    }

    /// Supply a connector directly (for maps whose builder already knows
    /// the adjacency).
    pub fn set_connector(&mut self, key: AttributeKey, connector: Connector) {
        self.connectors.insert(key, connector);
    }

    pub fn connector(&self, key: AttributeKey) -> Option<&Connector> {
        self.connectors.get(&key)
    }

    /// Shape references in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = AttributeKey> + '_ {
        self.segments.keys().copied()
    }

    /// The coincidence tolerance connections were derived with.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Rebuild all connectors by linking segments that share an endpoint
    /// within `tolerance`. Endpoints are bucketed on a grid of that pitch;
    /// neighbouring cells are probed so coincident points straddling a
    /// cell boundary still match.
    pub fn make_connections(&mut self, tolerance: f64) {
        self.tolerance = tolerance;

        let mut cells: HashMap<(i64, i64), Vec<(AttributeKey, Point2)>> = HashMap::new();
        let cell_of = |p: &Point2| -> (i64, i64) {
            ((p.x / tolerance).round() as i64, (p.y / tolerance).round() as i64)
        };
        for (key, line) in &self.segments {
            for point in [line.a, line.b] {
                cells.entry(cell_of(&point)).or_default().push((*key, point));
            }
        }

        let mut neighbours: BTreeMap<AttributeKey, SmallVec<[AttributeKey; 8]>> = self
            .segments
            .keys()
            .map(|k| (*k, SmallVec::new()))
            .collect();

        for (key, line) in &self.segments {
            for point in [line.a, line.b] {
                let (cx, cy) = cell_of(&point);
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        let Some(bucket) = cells.get(&(cx + dx, cy + dy)) else {
                            continue;
                        };
                        for (other, other_point) in bucket {
                            if other != key && point.approx_eq(other_point, tolerance) {
                                neighbours.entry(*key).or_default().push(*other);
                            }
                        }
                    }
                }
            }
        }

        self.connectors = neighbours
            .into_iter()
            .map(|(key, list)| (key, Connector::new(list)))
            .collect();
    }

    /// The shared endpoint of two connected segments, if any.
    pub fn junction_between(&self, a: AttributeKey, b: AttributeKey) -> Option<Point2> {
        let la = self.segments.get(&a)?;
        let lb = self.segments.get(&b)?;
        for pa in [la.a, la.b] {
            for pb in [lb.a, lb.b] {
                if pa.approx_eq(&pb, self.tolerance) {
                    return Some(pa);
                }
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
