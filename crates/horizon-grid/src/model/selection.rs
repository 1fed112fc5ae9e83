//! Key-based selection model.
//!
//! [`SelectionModel`] tracks an ordered set of [`RowKey`]s. The table store
//! keeps one for selected rows and one for expanded rows.
//!
//! # Example
//!
//! ```
//! use horizon_grid::model::{RowKey, SelectionModel};
//!
//! let mut selection = SelectionModel::new();
//!
//! selection.selection_changed.connect(|(selected, deselected)| {
//!     println!("Selection changed: +{} -{}", selected.len(), deselected.len());
//! });
//!
//! selection.replace(vec![RowKey::from(1), RowKey::from(2)]);
//! assert!(selection.is_selected(&RowKey::from(2)));
//! ```

use std::collections::HashSet;

use horizon_grid_core::Signal;

use super::value::RowKey;

/// Manages a set of selected keys.
///
/// Keys keep the order they were selected in; duplicates are ignored.
///
/// # Signals
///
/// - `selection_changed`: Emitted when selection changes, with (selected, deselected) keys
pub struct SelectionModel {
    /// Set of selected keys for O(1) lookup.
    selected_ids: HashSet<RowKey>,

    /// Ordered list of selected keys.
    selected_keys: Vec<RowKey>,

    /// Emitted when selection changes. Args: (selected, deselected)
    pub selection_changed: Signal<(Vec<RowKey>, Vec<RowKey>)>,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SelectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionModel")
            .field("selected_keys", &self.selected_keys)
            .finish_non_exhaustive()
    }
}

impl SelectionModel {
    /// Creates an empty selection model.
    pub fn new() -> Self {
        Self {
            selected_ids: HashSet::new(),
            selected_keys: Vec::new(),
            selection_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Selection Queries
    // =========================================================================

    /// Checks if a key is selected.
    pub fn is_selected(&self, key: &RowKey) -> bool {
        self.selected_ids.contains(key)
    }

    /// Returns true if any keys are selected.
    pub fn has_selection(&self) -> bool {
        !self.selected_keys.is_empty()
    }

    /// Returns the number of selected keys.
    pub fn selected_count(&self) -> usize {
        self.selected_keys.len()
    }

    /// Returns the selected keys in selection order.
    pub fn selected_keys(&self) -> &[RowKey] {
        &self.selected_keys
    }

    // =========================================================================
    // Selection Operations
    // =========================================================================

    /// Replaces the selection with `keys`.
    ///
    /// Emits `selection_changed` with the keys that were added and removed,
    /// if any.
    pub fn replace(&mut self, keys: impl IntoIterator<Item = RowKey>) {
        let previous = std::mem::take(&mut self.selected_keys);
        let previous_ids = std::mem::take(&mut self.selected_ids);

        for key in keys {
            self.add_to_selection(key);
        }

        let newly_selected: Vec<RowKey> = self
            .selected_keys
            .iter()
            .filter(|key| !previous_ids.contains(*key))
            .cloned()
            .collect();
        let newly_deselected: Vec<RowKey> = previous
            .into_iter()
            .filter(|key| !self.selected_ids.contains(key))
            .collect();

        if !newly_selected.is_empty() || !newly_deselected.is_empty() {
            self.selection_changed
                .emit((newly_selected, newly_deselected));
        }
    }

    /// Adds one key to the selection.
    pub fn select(&mut self, key: RowKey) {
        if self.add_to_selection(key.clone()) {
            self.selection_changed.emit((vec![key], Vec::new()));
        }
    }

    /// Removes one key from the selection.
    pub fn deselect(&mut self, key: &RowKey) {
        if self.selected_ids.remove(key) {
            self.selected_keys.retain(|k| k != key);
            self.selection_changed
                .emit((Vec::new(), vec![key.clone()]));
        }
    }

    /// Drops keys for which `keep` returns false, without emitting.
    ///
    /// Used when the underlying rows are replaced and stale keys must go.
    pub fn retain(&mut self, mut keep: impl FnMut(&RowKey) -> bool) {
        let ids = &mut self.selected_ids;
        self.selected_keys.retain(|key| {
            let kept = keep(key);
            if !kept {
                ids.remove(key);
            }
            kept
        });
    }

    /// Clears all selection.
    pub fn clear_selection(&mut self) {
        if self.selected_keys.is_empty() {
            return;
        }

        let deselected = std::mem::take(&mut self.selected_keys);
        self.selected_ids.clear();
        self.selection_changed.emit((Vec::new(), deselected));
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn add_to_selection(&mut self, key: RowKey) -> bool {
        if self.selected_ids.insert(key.clone()) {
            self.selected_keys.push(key);
            true
        } else {
            false
        }
    }
}
