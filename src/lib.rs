//! # spacegraph-rs: Spatial-Network Analysis Core
//!
//! An attribute store and multi-metric shortest-path engine for segment
//! networks (streets, sightlines) in Rust.
//!
//! ## Design Principles
//!
//! 1. **Table owns the data**: `AttributeTable` is the single owner of all
//!    per-shape rows and columns; algorithms and views borrow it
//! 2. **Keys, not pointers**: sorted views (`make_attribute_index`,
//!    `AttributeTableView`) hold `AttributeKey`s and re-resolve through the
//!    table, never aliased row references
//! 3. **Graph is consumed, not owned**: `SegmentGraph` adjacency comes from
//!    an external map builder; path algorithms only read it
//! 4. **One run, two columns**: each shortest-path algorithm writes exactly
//!    one measure column and one order column, resetting them first so
//!    reruns are idempotent
//!
//! ## Quick Start
//!
//! ```rust
//! use spacegraph_rs::{
//!     AttributeKey, AttributeTable, Line, MetricShortestPath, Point2, SegmentGraph,
//! };
//!
//! # fn example() -> spacegraph_rs::Result<()> {
//! // Three collinear street segments: 0 -- 1 -- 2
//! let mut graph = SegmentGraph::new();
//! for i in 0..3 {
//!     let x = i as f64;
//!     graph.add_segment(
//!         AttributeKey(i),
//!         Line::new(Point2::new(x, 0.0), Point2::new(x + 1.0, 0.0)),
//!     );
//! }
//! graph.make_connections(1e-9);
//!
//! let mut table = AttributeTable::new();
//! for key in graph.keys() {
//!     table.add_row(key)?;
//! }
//!
//! MetricShortestPath::new(AttributeKey(0), AttributeKey(2))
//!     .run(&graph, &mut table, None)?;
//!
//! let order = table.column_index("Metric Shortest Path Order")?;
//! assert_eq!(table.row(AttributeKey(2))?.value(order), Some(2.0));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod attributes;
pub mod geom;
pub mod graph;
pub mod layers;
pub mod paths;

// ============================================================================
// Re-exports: Attribute store
// ============================================================================

pub use attributes::{
    AttributeColumn, AttributeKey, AttributeRow, AttributeTable, AttributeTableHandle,
    AttributeTableView, DisplayColumn, DisplayParams, IndexEntry, make_attribute_index,
};

// ============================================================================
// Re-exports: Geometry and graph
// ============================================================================

pub use geom::{Line, Point2};
pub use graph::{Connector, SegmentGraph};

// ============================================================================
// Re-exports: Layers
// ============================================================================

pub use layers::{LayerManager, is_object_visible};

// ============================================================================
// Re-exports: Shortest paths
// ============================================================================

pub use paths::{AngularShortestPath, MetricShortestPath, Progress, TopologicalShortestPath};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("duplicate key {0}")]
    DuplicateKey(AttributeKey),

    #[error("row not found for key {0}")]
    KeyNotFound(AttributeKey),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("column index {0} out of range")]
    ColumnIndexOutOfRange(usize),

    #[error("duplicate layer: {0}")]
    DuplicateLayer(String),

    #[error("layer limit reached ({0} layers)")]
    LayerLimit(usize),

    #[error("shortest path needs exactly two selected shapes, got {0}")]
    InvalidSelection(usize),

    #[error("run cancelled by progress callback")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
