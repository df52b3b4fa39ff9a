//! `AttributeTable`, owner of all per-shape rows and columns.
//!
//! Rows are keyed by `AttributeKey` and always iterate in ascending key
//! order regardless of insertion order. Columns are positionally indexed;
//! adding a column backfills every existing row with the sentinel `-1`.
//! Value ranges are recomputed on demand by scanning rows, never
//! incrementally maintained.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layers::LayerManager;
use crate::{Error, Result};

/// Sentinel stored in cells that have never been written (and in shortest
/// path outputs for off-path shapes).
pub(crate) const SENTINEL: f64 = -1.0;

// ============================================================================
// AttributeKey
// ============================================================================

/// Opaque, totally ordered identifier for one shape/row. Externally
/// assigned, not auto-incremented; also used as the shape reference in
/// `SegmentGraph`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AttributeKey(pub i64);

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// DisplayParams
// ============================================================================

/// Colour-stop parameters used by renderers when mapping normalised values
/// to a colour ramp. The table carries one aggregate object and each column
/// carries its own; views hand back one or the other *by reference*, so
/// callers can compare identities with `std::ptr::eq`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayParams {
    pub blue: f32,
    pub red: f32,
}

impl Default for DisplayParams {
    fn default() -> Self {
        Self { blue: 0.0, red: 1.0 }
    }
}

// ============================================================================
// AttributeColumn
// ============================================================================

/// A named, positionally indexed column slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeColumn {
    name: String,
    locked: bool,
    hidden: bool,
    display_params: DisplayParams,
}

impl AttributeColumn {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locked: false,
            hidden: false,
            display_params: DisplayParams::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn display_params(&self) -> &DisplayParams {
        &self.display_params
    }

    pub fn set_display_params(&mut self, params: DisplayParams) {
        self.display_params = params;
    }
}

// ============================================================================
// AttributeRow
// ============================================================================

/// One row of the table: one `f64` per column, a selection flag and an
/// OR-accumulated layer bitmask. Bit 0 is the "Everything" layer, so every
/// row starts with mask 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRow {
    values: Vec<f64>,
    selected: bool,
    layer_key: u64,
}

impl AttributeRow {
    fn new(num_columns: usize) -> Self {
        Self {
            values: vec![SENTINEL; num_columns],
            selected: false,
            layer_key: 1,
        }
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, column: usize) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn set_value(&mut self, column: usize, value: f64) -> Result<()> {
        match self.values.get_mut(column) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::ColumnIndexOutOfRange(column)),
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn layer_key(&self) -> u64 {
        self.layer_key
    }

    /// OR a layer bit into this row's mask. Bits accumulate; a row may
    /// belong to several layers at once.
    pub fn add_layer_key(&mut self, mask: u64) {
        self.layer_key |= mask;
    }

    fn push_column(&mut self) {
        self.values.push(SENTINEL);
    }

    fn remove_column(&mut self, column: usize) {
        self.values.remove(column);
    }
}

// ============================================================================
// AttributeTable
// ============================================================================

/// The storage engine: an ordered `AttributeKey -> AttributeRow` mapping
/// plus an ordered column list. Invariant: every row holds exactly one
/// value per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    columns: Vec<AttributeColumn>,
    rows: BTreeMap<AttributeKey, AttributeRow>,
    display_params: DisplayParams,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Columns
    // ========================================================================

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Idempotent insert: returns the existing index if the name is taken,
    /// otherwise appends a column and backfills all rows with the sentinel.
    pub fn get_or_insert_column(&mut self, name: &str) -> usize {
        if let Ok(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(AttributeColumn::new(name));
        for row in self.rows.values_mut() {
            row.push_column();
        }
        self.columns.len() - 1
    }

    /// Like `get_or_insert_column`, but an existing column has every row's
    /// value reset to the sentinel. Column identity and position are
    /// unchanged.
    pub fn insert_or_reset_column(&mut self, name: &str) -> usize {
        if let Ok(index) = self.column_index(name) {
            for row in self.rows.values_mut() {
                row.values[index] = SENTINEL;
            }
            return index;
        }
        self.get_or_insert_column(name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_ok()
    }

    pub fn column(&self, index: usize) -> Result<&AttributeColumn> {
        self.columns
            .get(index)
            .ok_or(Error::ColumnIndexOutOfRange(index))
    }

    pub fn column_mut(&mut self, index: usize) -> Result<&mut AttributeColumn> {
        self.columns
            .get_mut(index)
            .ok_or(Error::ColumnIndexOutOfRange(index))
    }

    pub fn column_name(&self, index: usize) -> Result<&str> {
        Ok(self.column(index)?.name())
    }

    pub fn rename_column(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let index = self.column_index(old_name)?;
        self.columns[index].name = new_name.to_string();
        Ok(())
    }

    /// Removes a column and splices the corresponding value out of every
    /// row. Later columns shift one position left.
    pub fn remove_column(&mut self, index: usize) -> Result<()> {
        if index >= self.columns.len() {
            return Err(Error::ColumnIndexOutOfRange(index));
        }
        self.columns.remove(index);
        for row in self.rows.values_mut() {
            row.remove_column(index);
        }
        Ok(())
    }

    /// Value range [min, max] of a column over non-sentinel values, or
    /// `None` when no cell in the column has been written. Recomputed by
    /// scanning, so always current.
    pub fn column_range(&self, column: usize) -> Result<Option<(f64, f64)>> {
        if column >= self.columns.len() {
            return Err(Error::ColumnIndexOutOfRange(column));
        }
        let mut range: Option<(f64, f64)> = None;
        for row in self.rows.values() {
            let v = row.values[column];
            if v < 0.0 {
                continue;
            }
            range = Some(match range {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        Ok(range)
    }

    // ========================================================================
    // Rows
    // ========================================================================

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Fails with `DuplicateKey` when the key is already present; the table
    /// is left unchanged in that case.
    pub fn add_row(&mut self, key: AttributeKey) -> Result<&mut AttributeRow> {
        if self.rows.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }
        let num_columns = self.columns.len();
        Ok(self.rows.entry(key).or_insert_with(|| AttributeRow::new(num_columns)))
    }

    pub fn row(&self, key: AttributeKey) -> Result<&AttributeRow> {
        self.rows.get(&key).ok_or(Error::KeyNotFound(key))
    }

    pub fn row_mut(&mut self, key: AttributeKey) -> Result<&mut AttributeRow> {
        self.rows.get_mut(&key).ok_or(Error::KeyNotFound(key))
    }

    /// Non-failing lookup, for callers probing whether a key exists.
    pub fn get(&self, key: AttributeKey) -> Option<&AttributeRow> {
        self.rows.get(&key)
    }

    pub fn get_mut(&mut self, key: AttributeKey) -> Option<&mut AttributeRow> {
        self.rows.get_mut(&key)
    }

    /// Rows in ascending key order, independent of insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeKey, &AttributeRow)> {
        self.rows.iter().map(|(k, r)| (*k, r))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (AttributeKey, &mut AttributeRow)> {
        self.rows.iter_mut().map(|(k, r)| (*k, r))
    }

    pub fn keys(&self) -> impl Iterator<Item = AttributeKey> + '_ {
        self.rows.keys().copied()
    }

    /// Key range [min, max] over all rows, or `None` for an empty table.
    pub fn key_range(&self) -> Option<(i64, i64)> {
        let first = self.rows.keys().next()?;
        let last = self.rows.keys().next_back()?;
        Some((first.0, last.0))
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn set_selected(&mut self, key: AttributeKey, selected: bool) -> Result<()> {
        self.row_mut(key)?.set_selected(selected);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        for row in self.rows.values_mut() {
            row.selected = false;
        }
    }

    /// Selected keys in ascending order.
    pub fn selected_keys(&self) -> Vec<AttributeKey> {
        self.rows
            .iter()
            .filter(|(_, r)| r.selected)
            .map(|(k, _)| *k)
            .collect()
    }

    // ========================================================================
    // Display and normalisation
    // ========================================================================

    pub fn display_params(&self) -> &DisplayParams {
        &self.display_params
    }

    pub fn set_display_params(&mut self, params: DisplayParams) {
        self.display_params = params;
    }

    /// Normalise a row's column value into [0, 1] relative to the column's
    /// current range. Degenerate ranges (no written values, or min == max)
    /// map to 0.5; a sentinel cell maps to -1.
    pub fn normalised_value(&self, key: AttributeKey, column: usize) -> Result<f64> {
        let row = self.row(key)?;
        let range = self.column_range(column)?;
        let v = row.values[column];
        Ok(normalise(v, range))
    }

    // ========================================================================
    // Layer promotion
    // ========================================================================

    /// Promote a selection to a named layer: create the layer, OR its bit
    /// into every listed row's mask, then make the layer visible. Rows not
    /// listed are untouched. Returns the new layer index.
    pub fn push_selection_to_layer(
        &mut self,
        layers: &mut LayerManager,
        layer_name: &str,
        selected_keys: &[AttributeKey],
    ) -> Result<usize> {
        let layer = layers.add_layer(layer_name)?;
        let mask = layers.key(layer);
        for key in selected_keys {
            self.row_mut(*key)?.add_layer_key(mask);
        }
        layers.set_layer_visible(layer, true);
        Ok(layer)
    }
}

/// Shared normalisation rule: degenerate range first, then the sentinel
/// check, then the linear map.
pub(crate) fn normalise(value: f64, range: Option<(f64, f64)>) -> f64 {
    let Some((min, max)) = range else {
        return 0.5;
    };
    if max <= min {
        return 0.5;
    }
    if value < 0.0 {
        return -1.0;
    }
    (value - min) / (max - min)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_flags() {
        let mut table = AttributeTable::new();
        let idx = table.get_or_insert_column("colName");
        assert_eq!(table.column(idx).unwrap().name(), "colName");
        assert!(!table.column(idx).unwrap().is_hidden());
        assert!(!table.column(idx).unwrap().is_locked());

        table.column_mut(idx).unwrap().set_lock(true);
        assert!(!table.column(idx).unwrap().is_hidden());
        assert!(table.column(idx).unwrap().is_locked());

        table.column_mut(idx).unwrap().set_hidden(true);
        assert!(table.column(idx).unwrap().is_hidden());
        assert!(table.column(idx).unwrap().is_locked());
    }

    #[test]
    fn test_insert_and_reset_columns() {
        let mut table = AttributeTable::new();

        table.insert_or_reset_column("col1");
        table.get_or_insert_column("col2");
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.column_index("col2").unwrap(), 1);
        assert_eq!(table.column_name(1).unwrap(), "col2");

        table.add_row(AttributeKey(0)).unwrap();
        assert_eq!(table.row(AttributeKey(0)).unwrap().value(0), Some(-1.0));

        table.row_mut(AttributeKey(0)).unwrap().set_value(0, 1.2).unwrap();
        assert_eq!(table.row(AttributeKey(0)).unwrap().value(0), Some(1.2));

        // get-or-insert on an existing name keeps the values
        let idx = table.get_or_insert_column("col1");
        assert_eq!(idx, 0);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.row(AttributeKey(0)).unwrap().value(0), Some(1.2));

        // insert-or-reset on an existing name wipes them
        let idx = table.insert_or_reset_column("col1");
        assert_eq!(idx, 0);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.row(AttributeKey(0)).unwrap().value(0), Some(-1.0));

        // fresh column backfills existing rows
        let new_idx = table.get_or_insert_column("newCol");
        assert_eq!(new_idx, 2);
        assert_eq!(table.row(AttributeKey(0)).unwrap().value(2), Some(-1.0));

        table.rename_column("col1", "col_foo").unwrap();
        assert_eq!(table.column_name(0).unwrap(), "col_foo");
        assert!(matches!(
            table.column_index("col1"),
            Err(crate::Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_remove_column_shifts_values() {
        let mut table = AttributeTable::new();
        table.get_or_insert_column("a");
        table.get_or_insert_column("b");
        table.get_or_insert_column("c");

        let row = table.add_row(AttributeKey(0)).unwrap();
        row.set_value(0, 0.1).unwrap();
        row.set_value(1, 1.1).unwrap();
        row.set_value(2, 2.1).unwrap();

        table.remove_column(1).unwrap();
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.column_name(1).unwrap(), "c");

        let row = table.row(AttributeKey(0)).unwrap();
        assert_eq!(row.num_values(), 2);
        assert_eq!(row.value(0), Some(0.1));
        assert_eq!(row.value(1), Some(2.1));
        assert_eq!(row.value(2), None);
    }

    #[test]
    fn test_existing_and_missing_rows() {
        let mut table = AttributeTable::new();
        table.get_or_insert_column("col1");
        table.add_row(AttributeKey(0)).unwrap();
        table.add_row(AttributeKey(1)).unwrap();

        assert!(table.row(AttributeKey(0)).is_ok());
        assert!(matches!(
            table.row(AttributeKey(5)),
            Err(crate::Error::KeyNotFound(AttributeKey(5)))
        ));
        assert!(table.get(AttributeKey(1)).is_some());
        assert!(table.get(AttributeKey(5)).is_none());

        assert!(matches!(
            table.add_row(AttributeKey(1)),
            Err(crate::Error::DuplicateKey(AttributeKey(1)))
        ));
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn test_iteration_in_key_order() {
        let mut table = AttributeTable::new();
        table.get_or_insert_column("col1");
        table.add_row(AttributeKey(10)).unwrap().set_value(0, 10.0).unwrap();
        table.add_row(AttributeKey(3)).unwrap().set_value(0, 3.0).unwrap();
        table.add_row(AttributeKey(7)).unwrap().set_value(0, 7.0).unwrap();

        let keys: Vec<i64> = table.keys().map(|k| k.0).collect();
        assert_eq!(keys, vec![3, 7, 10]);
        let values: Vec<f64> = table.iter().map(|(_, r)| r.value(0).unwrap()).collect();
        assert_eq!(values, vec![3.0, 7.0, 10.0]);
    }

    #[test]
    fn test_normalised_values() {
        let mut table = AttributeTable::new();
        table.get_or_insert_column("col1");
        table.get_or_insert_column("col2");
        table.add_row(AttributeKey(0)).unwrap().set_value(0, 1.0).unwrap();
        table.add_row(AttributeKey(1)).unwrap().set_value(0, 0.5).unwrap();
        table.add_row(AttributeKey(2)).unwrap().set_value(0, 2.0).unwrap();

        // untouched column: no written values anywhere -> 0.5
        assert_eq!(table.normalised_value(AttributeKey(0), 1).unwrap(), 0.5);

        assert!((table.normalised_value(AttributeKey(0), 0).unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(table.normalised_value(AttributeKey(1), 0).unwrap(), 0.0);
        assert_eq!(table.normalised_value(AttributeKey(2), 0).unwrap(), 1.0);

        // single written value: min == max -> 0.5 for everyone
        table.add_row(AttributeKey(3)).unwrap().set_value(1, 1.0).unwrap();
        assert_eq!(table.normalised_value(AttributeKey(1), 1).unwrap(), 0.5);
        assert_eq!(table.normalised_value(AttributeKey(3), 1).unwrap(), 0.5);

        // a second value opens the range; sentinel cells normalise to -1
        table.row_mut(AttributeKey(0)).unwrap().set_value(1, 1.1).unwrap();
        assert!(table.normalised_value(AttributeKey(3), 1).unwrap().abs() < 1e-9);
        assert_eq!(table.normalised_value(AttributeKey(1), 1).unwrap(), -1.0);
    }

    #[test]
    fn test_selection() {
        let mut table = AttributeTable::new();
        table.add_row(AttributeKey(4)).unwrap();
        table.add_row(AttributeKey(1)).unwrap();
        table.add_row(AttributeKey(9)).unwrap();

        table.set_selected(AttributeKey(9), true).unwrap();
        table.set_selected(AttributeKey(1), true).unwrap();
        assert_eq!(
            table.selected_keys(),
            vec![AttributeKey(1), AttributeKey(9)]
        );

        table.clear_selection();
        assert!(table.selected_keys().is_empty());
    }

    #[test]
    fn test_push_selection_to_layer() {
        use crate::layers::is_object_visible;

        let mut table = AttributeTable::new();
        let mut layers = LayerManager::new();
        table.add_row(AttributeKey(0)).unwrap();
        table.add_row(AttributeKey(10)).unwrap();

        let layer = table
            .push_selection_to_layer(&mut layers, "sel layer", &[AttributeKey(10)])
            .unwrap();

        assert_eq!(table.row(AttributeKey(10)).unwrap().layer_key(), 1 | layers.key(layer));
        assert_eq!(table.row(AttributeKey(0)).unwrap().layer_key(), 1);

        assert!(is_object_visible(&layers, table.row(AttributeKey(10)).unwrap()));
        assert!(!is_object_visible(&layers, table.row(AttributeKey(0)).unwrap()));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut table = AttributeTable::new();
        table.get_or_insert_column("foo");
        table.add_row(AttributeKey(0)).unwrap().set_value(0, 1.5).unwrap();
        table.add_row(AttributeKey(42)).unwrap();

        let json = serde_json::to_string(&table).unwrap();
        let copy: AttributeTable = serde_json::from_str(&json).unwrap();
        assert_eq!(copy, table);
    }
}
