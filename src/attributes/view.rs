//! Stateful, lazily rebuilt wrappers around a table index, used for ranked
//! display and value normalisation.
//!
//! `AttributeTableView` borrows the table immutably (display-side);
//! `AttributeTableHandle` borrows it mutably and lets callers write through
//! ranked entries. Both cache their index and rebuild it on the first
//! access after the display column changes.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

use super::index::{IndexEntry, make_attribute_index};
use super::table::{AttributeKey, AttributeRow, AttributeTable, DisplayParams, normalise};
use crate::Result;

// ============================================================================
// DisplayColumn
// ============================================================================

/// What a view is displaying: a concrete column, the current selection, or
/// nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayColumn {
    /// Full-table index sorted by this column; range is the column's
    /// global [min, max].
    Column(usize),
    /// Index restricted to currently selected rows, sorted by key; values
    /// normalise over the selected keys' range.
    Selection,
    /// Empty index; values normalise the key over the whole table's key
    /// range, and the display params are the table's own aggregate object.
    None,
}

// ============================================================================
// AttributeTableView
// ============================================================================

/// Read-only display view over a table.
pub struct AttributeTableView<'a> {
    table: &'a AttributeTable,
    display: DisplayColumn,
    cache: RwLock<Vec<IndexEntry>>,
    stale: AtomicBool,
}

impl<'a> AttributeTableView<'a> {
    pub fn new(table: &'a AttributeTable) -> Self {
        Self {
            table,
            display: DisplayColumn::None,
            cache: RwLock::new(Vec::new()),
            stale: AtomicBool::new(true),
        }
    }

    pub fn display_column(&self) -> DisplayColumn {
        self.display
    }

    /// Change the display column and invalidate the cached index; the next
    /// `table_index` call rebuilds it.
    pub fn set_display_column(&mut self, display: DisplayColumn) -> Result<()> {
        if let DisplayColumn::Column(index) = display {
            self.table.column(index)?;
        }
        self.display = display;
        *self.stale.get_mut() = true;
        Ok(())
    }

    /// The sorted index for the current display column, rebuilding it if
    /// stale.
    pub fn table_index(&self) -> RwLockReadGuard<'_, Vec<IndexEntry>> {
        if self.stale.load(Ordering::Acquire) {
            let mut cache = self.cache.write();
            *cache = build_index(self.table, self.display);
            self.stale.store(false, Ordering::Release);
        }
        self.cache.read()
    }

    /// The active display params: the column's own for `Column(i)`,
    /// otherwise the table's aggregate object (same identity, so
    /// `std::ptr::eq` against `table.display_params()` holds exactly when
    /// no column is active).
    pub fn display_params(&self) -> &DisplayParams {
        display_params_for(self.table, self.display)
    }

    /// Normalise a row into [0, 1] against the active range (see
    /// `DisplayColumn` variants for which range that is).
    pub fn normalised_value(&self, key: AttributeKey, row: &AttributeRow) -> f64 {
        normalised_for(self.table, self.display, key, row)
    }
}

// ============================================================================
// AttributeTableHandle
// ============================================================================

/// Mutable counterpart of `AttributeTableView`: same cached index, plus
/// write access to rows resolved by key.
pub struct AttributeTableHandle<'a> {
    table: &'a mut AttributeTable,
    display: DisplayColumn,
    cache: Vec<IndexEntry>,
    stale: bool,
}

impl<'a> AttributeTableHandle<'a> {
    pub fn new(table: &'a mut AttributeTable) -> Self {
        Self {
            table,
            display: DisplayColumn::None,
            cache: Vec::new(),
            stale: true,
        }
    }

    pub fn display_column(&self) -> DisplayColumn {
        self.display
    }

    pub fn set_display_column(&mut self, display: DisplayColumn) -> Result<()> {
        if let DisplayColumn::Column(index) = display {
            self.table.column(index)?;
        }
        self.display = display;
        self.stale = true;
        Ok(())
    }

    /// The sorted index for the current display column. A snapshot: writes
    /// through `row_mut` after this call do not re-sort it until the
    /// display column is set again.
    pub fn table_index(&mut self) -> &[IndexEntry] {
        if self.stale {
            self.cache = build_index(self.table, self.display);
            self.stale = false;
        }
        &self.cache
    }

    pub fn table(&self) -> &AttributeTable {
        self.table
    }

    /// Write access to a row picked out of the index.
    pub fn row_mut(&mut self, key: AttributeKey) -> Result<&mut AttributeRow> {
        self.table.row_mut(key)
    }

    pub fn display_params(&self) -> &DisplayParams {
        display_params_for(self.table, self.display)
    }

    pub fn normalised_value(&self, key: AttributeKey, row: &AttributeRow) -> f64 {
        normalised_for(self.table, self.display, key, row)
    }
}

// ============================================================================
// Shared internals
// ============================================================================

fn build_index(table: &AttributeTable, display: DisplayColumn) -> Vec<IndexEntry> {
    match display {
        // the column index was validated when the display column was set
        DisplayColumn::Column(index) => make_attribute_index(table, index).unwrap_or_default(),
        DisplayColumn::Selection => table
            .iter()
            .filter(|(_, row)| row.is_selected())
            .map(|(key, _)| IndexEntry { key, value: key.0 as f64 })
            .collect(),
        DisplayColumn::None => Vec::new(),
    }
}

fn display_params_for(table: &AttributeTable, display: DisplayColumn) -> &DisplayParams {
    match display {
        DisplayColumn::Column(index) => match table.column(index) {
            Ok(column) => column.display_params(),
            Err(_) => table.display_params(),
        },
        _ => table.display_params(),
    }
}

fn normalised_for(
    table: &AttributeTable,
    display: DisplayColumn,
    key: AttributeKey,
    row: &AttributeRow,
) -> f64 {
    match display {
        DisplayColumn::Column(index) => {
            let range = table.column_range(index).ok().flatten();
            normalise(row.value(index).unwrap_or(-1.0), range)
        }
        DisplayColumn::Selection => {
            let selected = table.selected_keys();
            let range = match (selected.first(), selected.last()) {
                (Some(lo), Some(hi)) => Some((lo.0 as f64, hi.0 as f64)),
                _ => None,
            };
            normalise_key(key.0 as f64, range)
        }
        DisplayColumn::None => {
            let range = table.key_range().map(|(lo, hi)| (lo as f64, hi as f64));
            normalise_key(key.0 as f64, range)
        }
    }
}

/// Key (reference-number) normalisation: no sentinel rule, degenerate
/// ranges map to 0.5.
fn normalise_key(value: f64, range: Option<(f64, f64)>) -> f64 {
    match range {
        Some((min, max)) if max > min => (value - min) / (max - min),
        _ => 0.5,
    }
}

// ============================================================================
// Tests
// ============================================================================
