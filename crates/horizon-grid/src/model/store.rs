//! The row store.
//!
//! [`RowStore`] is the boundary between the table component and the state it
//! renders: the ordered row list, selection and expansion sets, column
//! visibility, sort and query state. The component only ever goes through the
//! trait's mutators and accessors. [`TableStore`] is the in-memory
//! implementation.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use horizon_grid_core::{PerfSpan, Signal, logging::targets};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotmap::SlotMap;

use super::row::{EditState, Row, RowId};
use super::selection::SelectionModel;
use super::value::{DEFAULT_KEY_FIELD, Record, RowKey, create_object, key_of, merge_into};
use crate::error::SaveError;
use crate::remote::{NoTransport, RemoteMessages, SaveTransport};
use crate::schema::{ColumnSchema, SaveApi};

/// Computes a stable identity for a record at a position.
///
/// Used to match incoming records against existing rows when rows are
/// reused across resets.
pub type IdentityFn = Arc<dyn Fn(&Value, usize) -> String + Send + Sync>;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A column as tracked by the store: its schema plus visibility.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnState {
    schema: ColumnSchema,
    index: usize,
    toggled: bool,
}

impl ColumnState {
    /// The column schema as configured.
    pub fn pristine(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Position in the configured column list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// `true` if the column is shown.
    pub fn is_toggled(&self) -> bool {
        self.toggled
    }
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-facing message raised by a remote save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Signals emitted by a [`TableStore`].
pub struct StoreSignals {
    /// Emitted after the row list was reinitialized. Args: top-level row count
    pub rows_reset: Signal<usize>,
    /// Emitted after two rows were exchanged. Args: (old index, new index)
    pub rows_exchanged: Signal<(usize, usize)>,
    /// Emitted when a column's visibility changes. Args: (column index, toggled)
    pub column_toggled: Signal<(usize, bool)>,
    /// Emitted when a remote save settles with a message to show.
    pub notice: Signal<Notice>,
}

impl Default for StoreSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreSignals {
    pub fn new() -> Self {
        Self {
            rows_reset: Signal::new(),
            rows_exchanged: Signal::new(),
            column_toggled: Signal::new(),
            notice: Signal::new(),
        }
    }
}

/// State the table component reads and mutates.
///
/// Keys are always compared through a key field; when none is given the
/// field is `key`.
pub trait RowStore: Send + Sync {
    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Replace the row list.
    ///
    /// With `reuse`, rows whose identity matches an incoming record keep
    /// their [`RowId`]. `children_field` names the field holding nested
    /// records.
    fn init_rows(
        &mut self,
        rows: Vec<Value>,
        identity: Option<IdentityFn>,
        reuse: bool,
        children_field: Option<&str>,
    );

    /// Set the scope rows inherit into their locals.
    fn update_scope(&mut self, scope: Value);

    /// Resolve a row by its index among its siblings. `levels` are the
    /// indexes of its ancestors, outermost first.
    fn row_by_index(&self, index: usize, levels: &[usize]) -> Option<RowId>;

    fn row(&self, id: RowId) -> Option<&Row>;

    /// `false` once a row was dropped by a reset.
    fn is_alive(&self, id: RowId) -> bool {
        self.row(id).is_some()
    }

    /// Merge `values` into a row. Returns `None` for dead rows.
    fn change_row(&mut self, id: RowId, values: &Value, keep_pristine: bool) -> Option<&Row>;

    /// Revert a row to its pristine snapshot.
    fn reset_row(&mut self, id: RowId) -> Option<&Row>;

    fn set_edit_state(&mut self, id: RowId, state: EditState);

    /// Move `row` from `old_index` to `new_index` among its siblings.
    fn exchange(&mut self, old_index: usize, new_index: usize, row: RowId);

    /// Top-level row handles in display order.
    fn rows(&self) -> Vec<RowId>;

    // -------------------------------------------------------------------------
    // Selection & expansion
    // -------------------------------------------------------------------------

    fn update_selected(&mut self, keys: Vec<RowKey>, key_field: Option<&str>);

    fn update_selected_all(&mut self, key_field: Option<&str>);

    fn update_expanded(&mut self, keys: Vec<RowKey>, key_field: Option<&str>);

    fn selected_rows(&self) -> Vec<&Row>;

    fn unselected_rows(&self) -> Vec<&Row>;

    fn current_selected_row_keys(&self) -> Vec<RowKey>;

    fn current_expanded_keys(&self) -> Vec<RowKey>;

    // -------------------------------------------------------------------------
    // Reordering
    // -------------------------------------------------------------------------

    fn moved_rows(&self) -> Vec<&Row>;

    /// Number of exchanges since the last reset.
    fn moved(&self) -> usize;

    /// Discard edits and reorderings.
    fn reset(&mut self);

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Top-level row data in display order.
    fn data_source(&self) -> Vec<Value>;

    /// Top-level row data with nested children taken from their rows.
    fn rows_data_with_modified_children(&self) -> Vec<Value>;

    /// `base` overlaid with `items`, `selectedItems` and `unSelectedItems`.
    fn context_data(&self, base: &Value) -> Value;

    /// Send a save request through the store's transport.
    fn save_remote(
        &self,
        api: &SaveApi,
        payload: Value,
        messages: Option<RemoteMessages>,
    ) -> BoxFuture<'static, Result<Value, SaveError>>;

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    fn update_columns(&mut self, columns: Vec<ColumnSchema>);

    fn update_columns_togglable(&mut self, togglable: Option<Value>);

    fn columns(&self) -> &[ColumnState];

    /// Columns currently shown.
    fn filtered_columns(&self) -> Vec<ColumnSchema>;

    fn togglable(&self) -> bool;

    /// Flip one column's visibility. Returns the new state.
    fn toggle_column(&mut self, index: usize) -> Option<bool>;

    fn toggle_all_columns(&mut self);

    // -------------------------------------------------------------------------
    // Sorting & query
    // -------------------------------------------------------------------------

    fn order_by(&self) -> Option<&str>;

    fn order(&self) -> Option<SortOrder>;

    fn set_order(&mut self, order_by: Option<String>, order: Option<SortOrder>);

    fn query(&self) -> &Value;

    /// Merge `values` into the query.
    fn update_query(&mut self, values: &Value);
}

/// In-memory [`RowStore`].
///
/// Rows live in a slot map; stale [`RowId`]s from before a reset fail to
/// resolve instead of aliasing new rows.
pub struct TableStore {
    rows: SlotMap<RowId, Row>,
    roots: Vec<RowId>,
    pristine_roots: Vec<RowId>,
    row_key_field: String,
    children_field: Option<String>,
    scope: Value,

    selection: SelectionModel,
    selection_key_field: String,
    expansion: SelectionModel,
    expansion_key_field: String,

    columns: Vec<ColumnState>,
    columns_togglable: Option<Value>,
    order_by: Option<String>,
    order: Option<SortOrder>,
    query: Value,
    moved: usize,

    transport: Arc<dyn SaveTransport>,
    signals: Arc<StoreSignals>,
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableStore")
            .field("rows", &self.rows.len())
            .field("selected", &self.selection.selected_keys())
            .field("expanded", &self.expansion.selected_keys())
            .field("columns", &self.columns.len())
            .field("moved", &self.moved)
            .finish_non_exhaustive()
    }
}

impl TableStore {
    /// Create an empty store without remote persistence.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(NoTransport))
    }

    /// Create an empty store that saves through `transport`.
    pub fn with_transport(transport: Arc<dyn SaveTransport>) -> Self {
        Self {
            rows: SlotMap::with_key(),
            roots: Vec::new(),
            pristine_roots: Vec::new(),
            row_key_field: DEFAULT_KEY_FIELD.to_string(),
            children_field: None,
            scope: Value::Object(Record::new()),
            selection: SelectionModel::new(),
            selection_key_field: DEFAULT_KEY_FIELD.to_string(),
            expansion: SelectionModel::new(),
            expansion_key_field: DEFAULT_KEY_FIELD.to_string(),
            columns: Vec::new(),
            columns_togglable: None,
            order_by: None,
            order: None,
            query: Value::Object(Record::new()),
            moved: 0,
            transport,
            signals: Arc::new(StoreSignals::new()),
        }
    }

    /// Field giving rows their display key. Defaults to `key`.
    pub fn with_row_key_field(mut self, field: impl Into<String>) -> Self {
        self.row_key_field = field.into();
        self
    }

    pub fn signals(&self) -> &StoreSignals {
        &self.signals
    }

    /// The selection set.
    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// The expansion set.
    pub fn expansion(&self) -> &SelectionModel {
        &self.expansion
    }

    /// Number of live rows, nested rows included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every row, depth-first in display order.
    fn flattened(&self) -> Vec<&Row> {
        let mut out = Vec::with_capacity(self.rows.len());
        let mut stack: Vec<RowId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(row) = self.rows.get(id) {
                out.push(row);
                stack.extend(row.children.iter().rev().copied());
            }
        }
        out
    }

    fn has_row_with_key(&self, field: &str, key: &RowKey) -> bool {
        self.rows
            .values()
            .any(|row| key_of(&row.pristine, field).as_ref() == Some(key))
    }

    fn build_rows(
        &mut self,
        records: Vec<Value>,
        parent: Option<RowId>,
        parent_path: Option<&str>,
        depth: usize,
        identity: Option<&IdentityFn>,
        reusable: &mut HashMap<String, VecDeque<RowId>>,
    ) -> Vec<RowId> {
        let mut ids = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let path = match parent_path {
                Some(parent_path) => format!("{parent_path}.{index}"),
                None => index.to_string(),
            };
            let key = key_of(&record, &self.row_key_field)
                .unwrap_or_else(|| RowKey::Str(path.clone()));
            let ident = match identity {
                Some(identity) => identity(&record, index),
                None => key.to_string(),
            };

            let nested = self
                .children_field
                .as_deref()
                .and_then(|field| record.get(field))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            let reused = reusable
                .get_mut(&ident)
                .and_then(VecDeque::pop_front)
                .filter(|id| self.rows.contains_key(*id));
            let id = match reused {
                Some(id) => {
                    if let Some(row) = self.rows.get_mut(id) {
                        row.key = key;
                        row.pristine = record.clone();
                        row.data = record;
                        row.edit_state = EditState::Idle;
                        row.moved = false;
                    }
                    id
                }
                None => self
                    .rows
                    .insert_with_key(|id| Row::new(id, key, record)),
            };

            let children = self.build_rows(nested, Some(id), Some(&path), depth + 1, identity, reusable);
            if let Some(row) = self.rows.get_mut(id) {
                row.path = path;
                row.index = index;
                row.depth = depth;
                row.parent = parent;
                row.pristine_children = children.clone();
                row.children = children;
            }
            ids.push(id);
        }
        ids
    }

    fn siblings_mut(&mut self, parent: Option<RowId>) -> Option<&mut Vec<RowId>> {
        match parent {
            Some(parent) => self.rows.get_mut(parent).map(|row| &mut row.children),
            None => Some(&mut self.roots),
        }
    }

    fn reindex(&mut self, parent: Option<RowId>) {
        let siblings = match parent {
            Some(parent) => self
                .rows
                .get(parent)
                .map(|row| row.children.clone())
                .unwrap_or_default(),
            None => self.roots.clone(),
        };
        for (index, id) in siblings.into_iter().enumerate() {
            if let Some(row) = self.rows.get_mut(id) {
                row.index = index;
                row.refresh_locals(&self.scope);
            }
        }
    }

    fn refresh_all_locals(&mut self) {
        let scope = &self.scope;
        for row in self.rows.values_mut() {
            row.refresh_locals(scope);
        }
    }

    fn data_with_children(&self, id: RowId) -> Value {
        let Some(row) = self.rows.get(id) else {
            return Value::Null;
        };
        let mut data = row.data.clone();
        if let (Some(field), false) = (self.children_field.as_deref(), row.children.is_empty()) {
            let children: Vec<Value> = row
                .children
                .iter()
                .map(|child| self.data_with_children(*child))
                .collect();
            if let Value::Object(fields) = &mut data {
                fields.insert(field.to_string(), Value::Array(children));
            }
        }
        data
    }
}

impl RowStore for TableStore {
    fn init_rows(
        &mut self,
        rows: Vec<Value>,
        identity: Option<IdentityFn>,
        reuse: bool,
        children_field: Option<&str>,
    ) {
        let _perf = PerfSpan::new("init_rows");

        // Rows sharing an identity are reused in display order.
        let mut reusable: HashMap<String, VecDeque<RowId>> = HashMap::new();
        if reuse {
            for row in self.flattened() {
                let ident = match &identity {
                    Some(identity) => identity(&row.pristine, row.index),
                    None => row.key.to_string(),
                };
                reusable.entry(ident).or_default().push_back(row.id);
            }
        } else {
            self.rows.clear();
        }

        self.children_field = children_field.map(str::to_string);
        let roots = self.build_rows(rows, None, None, 0, identity.as_ref(), &mut reusable);

        for stale in reusable.into_values().flatten() {
            self.rows.remove(stale);
        }

        self.roots = roots.clone();
        self.pristine_roots = roots;
        self.moved = 0;
        self.refresh_all_locals();

        let selection_field = self.selection_key_field.clone();
        let expansion_field = self.expansion_key_field.clone();
        let live: Vec<(Option<RowKey>, Option<RowKey>)> = self
            .rows
            .values()
            .map(|row| {
                (
                    key_of(&row.pristine, &selection_field),
                    key_of(&row.pristine, &expansion_field),
                )
            })
            .collect();
        self.selection
            .retain(|key| live.iter().any(|(s, _)| s.as_ref() == Some(key)));
        self.expansion
            .retain(|key| live.iter().any(|(_, e)| e.as_ref() == Some(key)));

        tracing::debug!(
            target: targets::STORE,
            rows = self.roots.len(),
            total = self.rows.len(),
            reuse,
            "rows initialized"
        );
        self.signals.rows_reset.emit(self.roots.len());
    }

    fn update_scope(&mut self, scope: Value) {
        self.scope = scope;
        self.refresh_all_locals();
    }

    fn row_by_index(&self, index: usize, levels: &[usize]) -> Option<RowId> {
        let mut siblings = &self.roots;
        for level in levels {
            let id = siblings.get(*level)?;
            siblings = &self.rows.get(*id)?.children;
        }
        siblings.get(index).copied()
    }

    fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.get(id)
    }

    fn change_row(&mut self, id: RowId, values: &Value, keep_pristine: bool) -> Option<&Row> {
        let scope = &self.scope;
        let row = self.rows.get_mut(id)?;
        row.change(values, keep_pristine);
        row.refresh_locals(scope);
        Some(row)
    }

    fn reset_row(&mut self, id: RowId) -> Option<&Row> {
        let scope = &self.scope;
        let row = self.rows.get_mut(id)?;
        row.reset();
        row.refresh_locals(scope);
        Some(row)
    }

    fn set_edit_state(&mut self, id: RowId, state: EditState) {
        if let Some(row) = self.rows.get_mut(id) {
            row.set_edit_state(state);
        }
    }

    fn exchange(&mut self, old_index: usize, new_index: usize, row: RowId) {
        let Some(parent) = self.rows.get(row).map(|r| r.parent) else {
            return;
        };
        let Some(siblings) = self.siblings_mut(parent) else {
            return;
        };

        let from = if siblings.get(old_index) == Some(&row) {
            old_index
        } else {
            match siblings.iter().position(|id| *id == row) {
                Some(position) => position,
                None => return,
            }
        };
        siblings.remove(from);
        let to = new_index.min(siblings.len());
        siblings.insert(to, row);

        if let Some(moved) = self.rows.get_mut(row) {
            moved.moved = true;
        }
        self.moved += 1;
        self.reindex(parent);

        tracing::debug!(target: targets::STORE, from, to, moved = self.moved, "rows exchanged");
        self.signals.rows_exchanged.emit((from, to));
    }

    fn rows(&self) -> Vec<RowId> {
        self.roots.clone()
    }

    fn update_selected(&mut self, keys: Vec<RowKey>, key_field: Option<&str>) {
        let field = key_field.unwrap_or(DEFAULT_KEY_FIELD).to_string();
        let keys: Vec<RowKey> = keys
            .into_iter()
            .filter(|key| self.has_row_with_key(&field, key))
            .collect();
        tracing::trace!(target: targets::SELECTION, count = keys.len(), field = %field, "update selected");
        self.selection_key_field = field;
        self.selection.replace(keys);
    }

    fn update_selected_all(&mut self, key_field: Option<&str>) {
        let field = key_field.unwrap_or(DEFAULT_KEY_FIELD);
        let keys: Vec<RowKey> = self
            .flattened()
            .into_iter()
            .filter_map(|row| key_of(&row.pristine, field))
            .collect();
        self.selection_key_field = field.to_string();
        self.selection.replace(keys);
    }

    fn update_expanded(&mut self, keys: Vec<RowKey>, key_field: Option<&str>) {
        let field = key_field.unwrap_or(DEFAULT_KEY_FIELD).to_string();
        let keys: Vec<RowKey> = keys
            .into_iter()
            .filter(|key| self.has_row_with_key(&field, key))
            .collect();
        self.expansion_key_field = field;
        self.expansion.replace(keys);
    }

    fn selected_rows(&self) -> Vec<&Row> {
        self.flattened()
            .into_iter()
            .filter(|row| {
                key_of(&row.pristine, &self.selection_key_field)
                    .is_some_and(|key| self.selection.is_selected(&key))
            })
            .collect()
    }

    fn unselected_rows(&self) -> Vec<&Row> {
        self.flattened()
            .into_iter()
            .filter(|row| {
                !key_of(&row.pristine, &self.selection_key_field)
                    .is_some_and(|key| self.selection.is_selected(&key))
            })
            .collect()
    }

    fn current_selected_row_keys(&self) -> Vec<RowKey> {
        self.selection.selected_keys().to_vec()
    }

    fn current_expanded_keys(&self) -> Vec<RowKey> {
        self.expansion.selected_keys().to_vec()
    }

    fn moved_rows(&self) -> Vec<&Row> {
        self.flattened().into_iter().filter(|row| row.moved).collect()
    }

    fn moved(&self) -> usize {
        self.moved
    }

    fn reset(&mut self) {
        self.roots = self.pristine_roots.clone();
        for row in self.rows.values_mut() {
            row.children = row.pristine_children.clone();
            row.reset();
            row.moved = false;
            row.edit_state = EditState::Idle;
        }
        let mut parents: Vec<Option<RowId>> = vec![None];
        parents.extend(self.rows.keys().map(Some));
        for parent in parents {
            self.reindex(parent);
        }
        self.moved = 0;
        tracing::debug!(target: targets::STORE, "store reset");
    }

    fn data_source(&self) -> Vec<Value> {
        self.roots
            .iter()
            .filter_map(|id| self.rows.get(*id))
            .map(|row| row.data.clone())
            .collect()
    }

    fn rows_data_with_modified_children(&self) -> Vec<Value> {
        self.roots
            .iter()
            .map(|id| self.data_with_children(*id))
            .collect()
    }

    fn context_data(&self, base: &Value) -> Value {
        let mut overlay = Record::new();
        overlay.insert("items".into(), Value::Array(self.data_source()));
        overlay.insert(
            "selectedItems".into(),
            Value::Array(self.selected_rows().iter().map(|r| r.data.clone()).collect()),
        );
        overlay.insert(
            "unSelectedItems".into(),
            Value::Array(self.unselected_rows().iter().map(|r| r.data.clone()).collect()),
        );
        create_object(base, overlay)
    }

    fn save_remote(
        &self,
        api: &SaveApi,
        payload: Value,
        messages: Option<RemoteMessages>,
    ) -> BoxFuture<'static, Result<Value, SaveError>> {
        let request = self.transport.save(api, payload);
        let signals = self.signals.clone();
        let url = api.url().to_string();
        Box::pin(async move {
            let messages = messages.unwrap_or_default();
            match request.await {
                Ok(response) => {
                    tracing::debug!(target: targets::STORE, url = %url, "remote save succeeded");
                    if let Some(message) = messages.success {
                        signals.notice.emit(Notice {
                            level: NoticeLevel::Success,
                            message,
                        });
                    }
                    Ok(response)
                }
                Err(err) => {
                    let message = messages
                        .error
                        .unwrap_or_else(|| err.message().to_string());
                    signals.notice.emit(Notice {
                        level: NoticeLevel::Error,
                        message,
                    });
                    Err(err)
                }
            }
        })
    }

    fn update_columns(&mut self, columns: Vec<ColumnSchema>) {
        self.columns = columns
            .into_iter()
            .enumerate()
            .map(|(index, schema)| ColumnState {
                toggled: schema.is_toggled(),
                schema,
                index,
            })
            .collect();
        tracing::trace!(target: targets::COLUMNS, count = self.columns.len(), "columns updated");
    }

    fn update_columns_togglable(&mut self, togglable: Option<Value>) {
        self.columns_togglable = togglable;
    }

    fn columns(&self) -> &[ColumnState] {
        &self.columns
    }

    fn filtered_columns(&self) -> Vec<ColumnSchema> {
        self.columns
            .iter()
            .filter(|column| column.toggled)
            .map(|column| column.schema.clone())
            .collect()
    }

    fn togglable(&self) -> bool {
        match &self.columns_togglable {
            None | Some(Value::Null) => false,
            Some(Value::Bool(togglable)) => *togglable,
            Some(Value::String(mode)) if mode == "auto" => self.columns.len() > 5,
            Some(Value::String(mode)) => !mode.is_empty(),
            Some(_) => true,
        }
    }

    fn toggle_column(&mut self, index: usize) -> Option<bool> {
        let column = self.columns.get_mut(index)?;
        column.toggled = !column.toggled;
        let toggled = column.toggled;
        self.signals.column_toggled.emit((index, toggled));
        Some(toggled)
    }

    fn toggle_all_columns(&mut self) {
        let show = self.columns.iter().any(|column| !column.toggled);
        for column in &mut self.columns {
            if column.toggled != show {
                column.toggled = show;
                self.signals.column_toggled.emit((column.index, show));
            }
        }
    }

    fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    fn order(&self) -> Option<SortOrder> {
        self.order
    }

    fn set_order(&mut self, order_by: Option<String>, order: Option<SortOrder>) {
        self.order_by = order_by;
        self.order = order;
    }

    fn query(&self) -> &Value {
        &self.query
    }

    fn update_query(&mut self, values: &Value) {
        merge_into(&mut self.query, values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn store_with(rows: Value) -> TableStore {
        let mut store = TableStore::new();
        let rows = rows.as_array().cloned().unwrap_or_default();
        store.init_rows(rows, None, false, Some("children"));
        store
    }

    fn keys(raw: &[i64]) -> Vec<RowKey> {
        raw.iter().copied().map(RowKey::Int).collect()
    }

    #[test]
    fn test_init_rows_paths_and_children() {
        let store = store_with(json!([
            {"key": 1, "children": [{"key": 11}, {"key": 12}]},
            {"key": 2}
        ]));

        assert_eq!(store.len(), 4);
        let first = store.row_by_index(0, &[]).unwrap();
        let nested = store.row_by_index(1, &[0]).unwrap();
        assert_eq!(store.row(first).unwrap().path(), "0");
        assert_eq!(store.row(nested).unwrap().path(), "0.1");
        assert_eq!(store.row(nested).unwrap().depth(), 1);
        assert_eq!(store.row(nested).unwrap().parent(), Some(first));
        assert!(store.row_by_index(5, &[]).is_none());
    }

    #[test]
    fn test_reset_invalidates_old_handles() {
        let mut store = store_with(json!([{"key": 1}]));
        let old = store.row_by_index(0, &[]).unwrap();

        store.init_rows(vec![json!({"key": 1})], None, false, None);
        assert!(!store.is_alive(old));
        assert!(store.change_row(old, &json!({"x": 1}), false).is_none());
    }

    #[test]
    fn test_reuse_keeps_handles_for_matching_identity() {
        let mut store = store_with(json!([{"key": 1}, {"key": 2}]));
        let first = store.row_by_index(0, &[]).unwrap();
        let second = store.row_by_index(1, &[]).unwrap();

        store.init_rows(
            vec![json!({"key": 2, "v": "new"}), json!({"key": 3})],
            None,
            true,
            None,
        );

        assert!(!store.is_alive(first));
        assert_eq!(store.row_by_index(0, &[]), Some(second));
        assert_eq!(store.row(second).unwrap().data()["v"], json!("new"));
        assert_eq!(store.row(second).unwrap().index(), 0);
    }

    #[test]
    fn test_reuse_with_duplicate_keys_drops_stale_rows() {
        let mut store = TableStore::new();
        let rows = vec![json!({"key": 1}), json!({"key": 1})];
        store.init_rows(rows.clone(), None, true, None);
        let first = store.row_by_index(0, &[]).unwrap();
        let second = store.row_by_index(1, &[]).unwrap();

        for _ in 0..3 {
            store.init_rows(rows.clone(), None, true, None);
            assert_eq!(store.len(), 2);
        }
        assert_eq!(store.row_by_index(0, &[]), Some(first));
        assert_eq!(store.row_by_index(1, &[]), Some(second));

        store.init_rows(vec![json!({"key": 1})], None, true, None);
        assert_eq!(store.len(), 1);
        assert!(store.is_alive(first));
        assert!(!store.is_alive(second));
    }

    #[test]
    fn test_identity_function_drives_reuse() {
        let identity: IdentityFn = Arc::new(|record, _| record["uid"].to_string());
        let mut store = TableStore::new();
        store.init_rows(vec![json!({"uid": "a"})], Some(identity.clone()), true, None);
        let id = store.row_by_index(0, &[]).unwrap();

        store.init_rows(vec![json!({"uid": "b"}), json!({"uid": "a"})], Some(identity), true, None);
        assert_eq!(store.row_by_index(1, &[]), Some(id));
    }

    #[test]
    fn test_selection_uses_key_field() {
        let mut store = store_with(json!([
            {"id": 1, "key": "a"},
            {"id": 2, "key": "b"},
            {"id": 3, "key": "c"}
        ]));

        store.update_selected(keys(&[1, 3, 9]), Some("id"));
        assert_eq!(store.current_selected_row_keys(), keys(&[1, 3]));
        assert_eq!(store.selected_rows().len(), 2);
        assert_eq!(store.unselected_rows()[0].data()["key"], json!("b"));

        store.update_selected_all(None);
        assert_eq!(store.current_selected_row_keys().len(), 3);
        assert_eq!(store.current_selected_row_keys()[0], RowKey::from("a"));

        store.update_selected(Vec::new(), None);
        assert!(store.selected_rows().is_empty());
    }

    #[test]
    fn test_expansion_is_independent() {
        let mut store = store_with(json!([{"key": 1}, {"key": 2}]));
        store.update_selected(keys(&[1]), None);
        store.update_expanded(keys(&[2]), None);

        assert_eq!(store.current_selected_row_keys(), keys(&[1]));
        assert_eq!(store.current_expanded_keys(), keys(&[2]));
    }

    #[test]
    fn test_exchange_and_reset() {
        let mut store = store_with(json!([{"key": 1}, {"key": 2}, {"key": 3}]));
        let first = store.row_by_index(0, &[]).unwrap();

        store.exchange(0, 2, first);
        assert_eq!(store.moved(), 1);
        assert_eq!(store.row_by_index(2, &[]), Some(first));
        assert_eq!(store.moved_rows().len(), 1);
        assert_eq!(
            store.data_source(),
            vec![json!({"key": 2}), json!({"key": 3}), json!({"key": 1})]
        );

        store.reset();
        assert_eq!(store.moved(), 0);
        assert_eq!(store.row_by_index(0, &[]), Some(first));
        assert!(store.moved_rows().is_empty());
    }

    #[test]
    fn test_change_row_refreshes_locals() {
        let mut store = store_with(json!([{"key": 1, "name": "A"}]));
        store.update_scope(json!({"page": 2}));
        let id = store.row_by_index(0, &[]).unwrap();

        let row = store.change_row(id, &json!({"name": "B"}), false).unwrap();
        assert!(row.modified());
        assert_eq!(row.locals()["name"], json!("B"));
        assert_eq!(row.locals()["page"], json!(2));

        let row = store.reset_row(id).unwrap();
        assert_eq!(row.data()["name"], json!("A"));
    }

    #[test]
    fn test_rows_data_with_modified_children() {
        let mut store = store_with(json!([{"key": 1, "children": [{"key": 11, "v": 0}]}]));
        let child = store.row_by_index(0, &[0]).unwrap();
        store.change_row(child, &json!({"v": 5}), false);

        assert_eq!(
            store.rows_data_with_modified_children(),
            vec![json!({"key": 1, "children": [{"key": 11, "v": 5}]})]
        );
    }

    #[test]
    fn test_context_data() {
        let mut store = store_with(json!([{"key": 1}, {"key": 2}]));
        store.update_selected(keys(&[2]), None);

        let ctx = store.context_data(&json!({"page": 1}));
        assert_eq!(ctx["page"], json!(1));
        assert_eq!(ctx["items"], json!([{"key": 1}, {"key": 2}]));
        assert_eq!(ctx["selectedItems"], json!([{"key": 2}]));
        assert_eq!(ctx["unSelectedItems"], json!([{"key": 1}]));
    }

    #[test]
    fn test_column_toggling() {
        let mut store = TableStore::new();
        store.update_columns(vec![
            ColumnSchema::new("a"),
            ColumnSchema {
                toggled: Some(false),
                ..ColumnSchema::new("b")
            },
        ]);

        assert_eq!(store.filtered_columns().len(), 1);
        assert_eq!(store.toggle_column(1), Some(true));
        assert_eq!(store.filtered_columns().len(), 2);

        store.toggle_all_columns();
        assert!(store.filtered_columns().is_empty());
        store.toggle_all_columns();
        assert_eq!(store.filtered_columns().len(), 2);
        assert_eq!(store.toggle_column(7), None);
    }

    #[test]
    fn test_togglable_modes() {
        let mut store = TableStore::new();
        assert!(!store.togglable());

        store.update_columns_togglable(Some(json!(true)));
        assert!(store.togglable());

        store.update_columns_togglable(Some(json!("auto")));
        assert!(!store.togglable());
        store.update_columns((0..6).map(|i| ColumnSchema::new(format!("c{i}"))).collect());
        assert!(store.togglable());

        store.update_columns_togglable(Some(json!({"align": "right"})));
        assert!(store.togglable());
    }

    #[tokio::test]
    async fn test_save_remote_reports_error_notice() {
        let store = TableStore::new();
        let notices = Arc::new(Mutex::new(Vec::new()));
        let notices_clone = notices.clone();
        store.signals().notice.connect(move |notice| {
            notices_clone.lock().push(notice.clone());
        });

        let messages = RemoteMessages {
            success: Some("saved".into()),
            error: Some("could not save".into()),
        };
        let result = store
            .save_remote(&SaveApi::parse("/api/save"), json!({}), Some(messages))
            .await;

        assert!(result.is_err());
        let notices = notices.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "could not save");
    }
}
