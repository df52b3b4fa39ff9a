//! Named layers over the attribute table.
//!
//! Each layer owns one bit of a 64-bit mask; rows carry an OR-accumulated
//! mask of the layers they belong to. Layer 0 is the implicit "Everything"
//! layer (bit 0), present and visible from the start.

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeRow;
use crate::{Error, Result};

const MAX_LAYERS: usize = 64;

/// Registry of named layers plus the set of currently visible layer bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerManager {
    names: Vec<String>,
    visible_layers: u64,
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            names: vec!["Everything".to_string()],
            visible_layers: 1,
        }
    }

    pub fn num_layers(&self) -> usize {
        self.names.len()
    }

    /// Register a new layer. New layers start out invisible.
    pub fn add_layer(&mut self, name: &str) -> Result<usize> {
        if self.names.iter().any(|n| n == name) {
            return Err(Error::DuplicateLayer(name.to_string()));
        }
        if self.names.len() == MAX_LAYERS {
            return Err(Error::LayerLimit(MAX_LAYERS));
        }
        self.names.push(name.to_string());
        Ok(self.names.len() - 1)
    }

    pub fn layer_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// The single bit identifying a layer in row masks.
    pub fn key(&self, index: usize) -> u64 {
        1u64 << (index % MAX_LAYERS)
    }

    /// True when any bit of `mask` is currently visible.
    pub fn is_visible(&self, mask: u64) -> bool {
        self.visible_layers & mask != 0
    }

    pub fn is_layer_visible(&self, index: usize) -> bool {
        self.is_visible(self.key(index))
    }

    /// Visibility algebra: showing the "Everything" layer hides all others
    /// and vice versa; named layers accumulate while "Everything" is off.
    pub fn set_layer_visible(&mut self, index: usize, visible: bool) {
        if index == 0 {
            self.visible_layers = if visible { 1 } else { 0 };
            return;
        }
        let key = self.key(index);
        if visible {
            self.visible_layers |= key;
            self.visible_layers &= !1;
        } else {
            self.visible_layers &= !key;
        }
    }
}

/// Whether a row is visible under the manager's current layer settings.
pub fn is_object_visible(layers: &LayerManager, row: &AttributeRow) -> bool {
    layers.is_visible(row.layer_key())
}

// ============================================================================
// Tests
// ============================================================================
