//! The columnar attribute store: per-shape rows, named columns, sorted
//! index snapshots and display views.

mod index;
mod table;
mod view;

pub use index::{IndexEntry, make_attribute_index};
pub use table::{AttributeColumn, AttributeKey, AttributeRow, AttributeTable, DisplayParams};
pub use view::{AttributeTableHandle, AttributeTableView, DisplayColumn};
