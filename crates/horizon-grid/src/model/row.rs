//! Rows of the table model.

use serde_json::Value;
use slotmap::new_key_type;

use super::value::{Record, RowKey, create_object, merge_into};

new_key_type! {
    /// Handle to a row in a [`super::TableStore`].
    ///
    /// Handles stay valid until the row is dropped by a full reset; a stale
    /// handle simply fails to resolve.
    pub struct RowId;
}

/// Where a row is in its quick-edit cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EditState {
    /// No edit in progress.
    #[default]
    Idle,
    /// Values were merged into the row.
    Editing,
    /// The diff against the pristine snapshot is being computed.
    Diffing,
    /// A remote save is in flight.
    Saving,
    /// The edit was accepted.
    Committed,
    /// The edit was reverted to the pristine snapshot.
    RolledBack,
}

/// One record of the table.
#[derive(Debug, Clone)]
pub struct Row {
    pub(crate) id: RowId,
    pub(crate) key: RowKey,
    pub(crate) path: String,
    pub(crate) index: usize,
    pub(crate) depth: usize,
    pub(crate) data: Value,
    pub(crate) pristine: Value,
    pub(crate) locals: Value,
    pub(crate) children: Vec<RowId>,
    pub(crate) pristine_children: Vec<RowId>,
    pub(crate) parent: Option<RowId>,
    pub(crate) moved: bool,
    pub(crate) edit_state: EditState,
}

impl Row {
    pub(crate) fn new(id: RowId, key: RowKey, data: Value) -> Self {
        Self {
            id,
            key,
            path: String::new(),
            index: 0,
            depth: 0,
            pristine: data.clone(),
            locals: Value::Null,
            data,
            children: Vec::new(),
            pristine_children: Vec::new(),
            parent: None,
            moved: false,
            edit_state: EditState::Idle,
        }
    }

    /// The row's handle.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Row identity within the store.
    pub fn key(&self) -> &RowKey {
        &self.key
    }

    /// Stable position: `"3"` for top-level rows, `"3.1"` for nested ones.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Position among its siblings.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Nesting depth, `0` for top-level rows.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Current field values.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Last committed snapshot.
    pub fn pristine(&self) -> &Value {
        &self.pristine
    }

    /// Data visible to expressions: the enclosing scope overlaid with the
    /// row's fields and its `index`.
    pub fn locals(&self) -> &Value {
        &self.locals
    }

    /// Nested rows.
    pub fn children(&self) -> &[RowId] {
        &self.children
    }

    pub fn parent(&self) -> Option<RowId> {
        self.parent
    }

    /// `true` if the row was reordered since the last reset.
    pub fn is_moved(&self) -> bool {
        self.moved
    }

    pub fn edit_state(&self) -> EditState {
        self.edit_state
    }

    /// `true` if the current data differs from the pristine snapshot.
    pub fn modified(&self) -> bool {
        self.data != self.pristine
    }

    /// Merge `values` into the row's data.
    ///
    /// With `keep_pristine` the snapshot advances to the new data, so no diff
    /// remains to save.
    pub fn change(&mut self, values: &Value, keep_pristine: bool) {
        merge_into(&mut self.data, values);
        if keep_pristine {
            self.pristine = self.data.clone();
        }
        self.edit_state = EditState::Editing;
    }

    /// Revert the data to the pristine snapshot.
    pub fn reset(&mut self) {
        self.data = self.pristine.clone();
    }

    pub(crate) fn set_edit_state(&mut self, state: EditState) {
        self.edit_state = state;
    }

    pub(crate) fn refresh_locals(&mut self, scope: &Value) {
        let mut overlay = match &self.data {
            Value::Object(fields) => fields.clone(),
            _ => Record::new(),
        };
        overlay.insert("index".into(), Value::from(self.index));
        self.locals = create_object(scope, overlay);
    }
}
