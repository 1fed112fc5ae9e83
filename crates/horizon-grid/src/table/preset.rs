//! Selection presets offered in the selection column's menu.

use std::convert::Infallible;
use std::str::FromStr;

use horizon_grid_core::logging::targets;

use crate::error::{GridError, Result};
use crate::model::{RowKey, RowStore};

use super::Table;

/// A named selection preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionPreset {
    /// Every eligible key.
    All,
    /// Nothing.
    None,
    /// Eligible keys not currently selected.
    Invert,
    /// Eligible keys at even positions (0-based), i.e. the 1st, 3rd, ...
    Odd,
    /// Eligible keys at odd positions (0-based), i.e. the 2nd, 4th, ...
    Even,
    /// An unrecognized preset; selects the eligible keys as they are.
    Other(String),
}

impl FromStr for SelectionPreset {
    type Err = Infallible;

    fn from_str(key: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match key {
            "all" => Self::All,
            "none" => Self::None,
            "invert" => Self::Invert,
            "odd" => Self::Odd,
            "even" => Self::Even,
            other => Self::Other(other.to_string()),
        })
    }
}

impl SelectionPreset {
    /// Compute the new selection from the `eligible` keys of the current
    /// view and the `selected` keys.
    ///
    /// Parity is taken over positions in `eligible`.
    pub fn apply(&self, eligible: &[RowKey], selected: &[RowKey]) -> Vec<RowKey> {
        match self {
            Self::All | Self::Other(_) => eligible.to_vec(),
            Self::None => Vec::new(),
            Self::Invert => eligible
                .iter()
                .filter(|key| !selected.contains(key))
                .cloned()
                .collect(),
            Self::Odd => eligible.iter().step_by(2).cloned().collect(),
            Self::Even => eligible.iter().skip(1).step_by(2).cloned().collect(),
        }
    }
}

impl<S: RowStore> Table<S> {
    /// Run the preset named `key` over the `eligible` keys and replace the
    /// selection with the result.
    ///
    /// # Errors
    ///
    /// [`GridError::SelectionNotConfigured`] without row selection.
    pub fn apply_selection_preset(&self, key: &str, eligible: &[RowKey]) -> Result<Vec<RowKey>> {
        let schema = self.schema();
        let selection = schema
            .row_selection
            .as_ref()
            .ok_or(GridError::SelectionNotConfigured)?;

        let preset = match key.parse::<SelectionPreset>() {
            Ok(preset) => preset,
            Err(never) => match never {},
        };

        let mut store = self.store.write();
        let keys = preset.apply(eligible, &store.current_selected_row_keys());
        tracing::debug!(target: targets::SELECTION, ?preset, count = keys.len(), "selection preset");
        store.update_selected(keys.clone(), selection.key_field.as_deref());
        Ok(keys)
    }
}
