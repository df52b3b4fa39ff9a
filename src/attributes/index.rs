//! Sorted snapshots of a table, used for ranked display.
//!
//! An index is a snapshot, not a live view: it holds keys (and the sort
//! value at build time) and must be rebuilt after any structural table
//! change. Mutation happens by re-resolving the key through the table.

use super::table::{AttributeKey, AttributeTable};
use crate::Result;

/// One entry of a sorted index: the row's key plus the value it was sorted
/// by when the index was built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    pub key: AttributeKey,
    pub value: f64,
}

/// Build an index over `column`: entries sorted ascending by value, ties
/// broken by ascending key. Length always equals the table's row count.
pub fn make_attribute_index(table: &AttributeTable, column: usize) -> Result<Vec<IndexEntry>> {
    let mut index: Vec<IndexEntry> = Vec::with_capacity(table.num_rows());
    for (key, row) in table.iter() {
        let value = match row.value(column) {
            Some(v) => v,
            None => return Err(crate::Error::ColumnIndexOutOfRange(column)),
        };
        index.push(IndexEntry { key, value });
    }
    index.sort_by(|a, b| a.value.total_cmp(&b.value).then_with(|| a.key.cmp(&b.key)));
    Ok(index)
}

// ============================================================================
// Tests
// ============================================================================
