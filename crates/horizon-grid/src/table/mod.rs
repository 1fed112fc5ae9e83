//! The table component.
//!
//! [`Table`] reconciles externally supplied rows with a [`RowStore`], builds
//! render descriptors from the declarative [`TableSchema`] and handles user
//! interaction: selection, sorting, filtering, reordering, row clicks and
//! quick edits. Every user-triggered mutation first dispatches a cancelable
//! event through the table's [`EventDispatcher`] and is abandoned if a
//! listener prevents it.
//!
//! [`TableSignals`] are emitted with no lock held, so their slots may call
//! back into the table. Store signals ([`StoreSignals`](crate::model::StoreSignals))
//! fire while the table holds the store's write lock; their slots must not.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::{Table, TableProps, TableSchema, TableStore};
//! use serde_json::json;
//!
//! let schema = TableSchema::from_json(r#"{
//!     "source": "${rows}",
//!     "columns": [{"key": "name", "title": "Name", "type": "text"}],
//!     "rowSelection": {"type": "checkbox", "keyField": "id", "selectedRowKeys": [2]}
//! }"#).unwrap();
//!
//! let data = json!({"rows": [{"id": 1, "name": "Ada"}, {"id": 2, "name": "Grace"}]});
//! let table = Table::builder(TableProps::new(schema).with_data(data)).build(TableStore::new());
//!
//! table.signals().selected.connect(|(selected, _unselected)| {
//!     println!("{} selected", selected.len());
//! });
//! table.mount();
//!
//! let render = table.render().unwrap();
//! assert_eq!(render.data_source.len(), 2);
//! ```

mod action;
pub mod columns;
mod events;
pub mod node;
mod preset;
mod quick_edit;
mod render;
pub mod span;
mod sync;

use std::fmt;
use std::sync::Arc;

use horizon_grid_core::{EventDispatcher, NoopDispatcher, Signal, logging::targets};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::Serialize;
use serde_json::Value;

use crate::expr::{Evaluator, VariableEvaluator, is_pure_variable};
use crate::model::{IdentityFn, RowId, RowStore, SortOrder, TableStore};
use crate::schema::{SaveApi, TableSchema};

pub use action::TableAction;
pub use events::{FilterRequest, HandlerOutcome, SortRequest};
pub use preset::SelectionPreset;
pub use quick_edit::{QuickChangeOptions, QuickEditOutcome, QuickSaveRequest, SaveRequest};
pub use render::{
    CheckboxProps, ColumnToggler, ExpandableConfig, Heading, ItemActionsConfig, RowClassName,
    RowSelectionConfig, SummaryEntry, TableRender, Toolbar, ToolbarItem, build_summary,
};

/// Inputs of a table that may change over its lifetime.
///
/// Row arrays and context data are compared by identity (`Arc::ptr_eq`)
/// when new props arrive; hand the table a new `Arc` to signal a change.
#[derive(Clone)]
pub struct TableProps {
    pub schema: Arc<TableSchema>,
    /// Explicit rows. Win over `items` and over the schema's `source`.
    pub value: Option<Arc<Vec<Value>>>,
    /// Explicit rows, used when `value` is absent.
    pub items: Option<Arc<Vec<Value>>>,
    /// Context data the `source` expression and rows resolve against.
    pub data: Arc<Value>,
    /// Row identity used when reusing rows across resets.
    pub get_entry_id: Option<IdentityFn>,
}

impl fmt::Debug for TableProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableProps")
            .field("schema", &self.schema)
            .field("value", &self.value.as_ref().map(|rows| rows.len()))
            .field("items", &self.items.as_ref().map(|rows| rows.len()))
            .field("data", &self.data)
            .field("get_entry_id", &self.get_entry_id.is_some())
            .finish()
    }
}

impl TableProps {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            value: None,
            items: None,
            data: Arc::new(Value::Object(Default::default())),
            get_entry_id: None,
        }
    }

    pub fn with_value(mut self, rows: Vec<Value>) -> Self {
        self.value = Some(Arc::new(rows));
        self
    }

    pub fn with_items(mut self, rows: Vec<Value>) -> Self {
        self.items = Some(Arc::new(rows));
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Arc::new(data);
        self
    }

    pub fn with_entry_id(mut self, identity: IdentityFn) -> Self {
        self.get_entry_id = Some(identity);
        self
    }

    /// The explicit row array, `value` first.
    pub fn rows(&self) -> Option<&Arc<Vec<Value>>> {
        self.value.as_ref().or(self.items.as_ref())
    }
}

fn same_rows(a: Option<&Arc<Vec<Value>>>, b: Option<&Arc<Vec<Value>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// A request to run a named action elsewhere, e.g. an immediate save.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub action_type: String,
    pub api: SaveApi,
    pub data: Value,
}

/// Notifications emitted by a [`Table`].
pub struct TableSignals {
    /// Selection was announced. Args: (selected rows, unselected rows)
    pub selected: Signal<(Vec<Value>, Vec<Value>)>,
    /// A sort was applied.
    pub sorted: Signal<SortRequest>,
    /// A column filter was applied.
    pub filtered: Signal<FilterRequest>,
    /// A row was clicked. Args: (row data, row index)
    pub row_clicked: Signal<(Value, Option<usize>)>,
    /// Reordered rows should be persisted. Args: (moved rows, all rows)
    pub order_saved: Signal<(Vec<Value>, Vec<Value>)>,
    /// An edit advanced a row's pristine snapshot. Args: (row data, row path)
    pub pristine_changed: Signal<(Value, String)>,
    /// A quick edit should be saved by the host instead of the table.
    pub save_requested: Signal<QuickSaveRequest>,
    /// An action should run on the host's action bus.
    pub action_requested: Signal<ActionRequest>,
    /// A component should reload. Args: (target name, payload)
    pub reload_requested: Signal<(String, Value)>,
    /// A message to show the user.
    pub alert: Signal<String>,
    /// A row's edit was reverted after a failed save.
    pub edit_reset: Signal<RowId>,
}

impl Default for TableSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSignals {
    pub fn new() -> Self {
        Self {
            selected: Signal::new(),
            sorted: Signal::new(),
            filtered: Signal::new(),
            row_clicked: Signal::new(),
            order_saved: Signal::new(),
            pristine_changed: Signal::new(),
            save_requested: Signal::new(),
            action_requested: Signal::new(),
            reload_requested: Signal::new(),
            alert: Signal::new(),
            edit_reset: Signal::new(),
        }
    }
}

/// Builder for [`Table`].
pub struct TableBuilder {
    props: TableProps,
    evaluator: Arc<dyn Evaluator>,
    dispatcher: Arc<dyn EventDispatcher>,
}

impl TableBuilder {
    /// Use `evaluator` for span, selection, expansion and class name
    /// expressions.
    pub fn evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Deliver cancelable events through `dispatcher`.
    pub fn dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Build the table over `store`. Call [`Table::mount`] once listeners
    /// are connected.
    pub fn build<S: RowStore>(self, store: S) -> Table<S> {
        Table {
            store: RwLock::new(store),
            props: RwLock::new(self.props),
            evaluator: self.evaluator,
            dispatcher: self.dispatcher,
            signals: TableSignals::new(),
        }
    }
}

/// A schema-driven data grid over a [`RowStore`].
pub struct Table<S: RowStore = TableStore> {
    store: RwLock<S>,
    props: RwLock<TableProps>,
    evaluator: Arc<dyn Evaluator>,
    dispatcher: Arc<dyn EventDispatcher>,
    signals: TableSignals,
}

impl<S: RowStore> fmt::Debug for Table<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("props", &*self.props.read())
            .finish_non_exhaustive()
    }
}

impl Table<TableStore> {
    /// Start building a table.
    pub fn builder(props: TableProps) -> TableBuilder {
        TableBuilder {
            props,
            evaluator: Arc::new(VariableEvaluator),
            dispatcher: Arc::new(NoopDispatcher),
        }
    }
}

impl<S: RowStore> Table<S> {
    pub fn signals(&self) -> &TableSignals {
        &self.signals
    }

    /// Read access to the store.
    pub fn store(&self) -> RwLockReadGuard<'_, S> {
        self.store.read()
    }

    /// The current props.
    pub fn props(&self) -> TableProps {
        self.props.read().clone()
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    fn schema(&self) -> Arc<TableSchema> {
        self.props.read().schema.clone()
    }

    /// Push the initial props into the store: columns, column toggling,
    /// scope, then rows, selection and expansion.
    pub fn mount(&self) {
        let props = self.props.read().clone();
        let reset = {
            let mut store = self.store.write();
            store.update_columns_togglable(props.schema.columns_togglable.clone());
            store.update_columns(props.schema.columns.clone());
            store.update_scope((*props.data).clone());
            sync::sync_rows(&mut *store, self.evaluator.as_ref(), &props, None)
        };
        if reset {
            self.sync_selected();
        }
    }

    /// Apply new props.
    ///
    /// Rows are re-synchronized when `source`, `value` or `items` changed,
    /// or, without explicit rows, when the context data changed or the
    /// source is a pure variable. Columns are replaced when they differ
    /// structurally.
    pub fn receive_props(&self, next: TableProps) {
        let prev = std::mem::replace(&mut *self.props.write(), next.clone());

        let data_changed = !Arc::ptr_eq(&prev.data, &next.data);
        let rows_changed = prev.schema.source != next.schema.source
            || !same_rows(prev.value.as_ref(), next.value.as_ref())
            || !same_rows(prev.items.as_ref(), next.items.as_ref());
        let pure_source = next
            .schema
            .source
            .as_deref()
            .is_some_and(is_pure_variable);
        let no_explicit_rows = next.value.is_none() && next.items.is_none();

        let reset = {
            let mut store = self.store.write();

            if prev.schema.columns_togglable != next.schema.columns_togglable {
                store.update_columns_togglable(next.schema.columns_togglable.clone());
            }
            if data_changed {
                store.update_scope((*next.data).clone());
            }

            let reset = if rows_changed || (no_explicit_rows && (data_changed || pure_source)) {
                sync::sync_rows(&mut *store, self.evaluator.as_ref(), &next, Some(&prev))
            } else {
                false
            };

            if prev.schema.columns != next.schema.columns {
                store.update_columns(next.schema.columns.clone());
            }
            reset
        };

        tracing::debug!(target: targets::SYNC, data_changed, rows_changed, reset, "props received");
        if reset {
            self.sync_selected();
        }
    }

    /// Announce the current selected and unselected rows.
    pub fn sync_selected(&self) {
        let (selected, unselected) = {
            let store = self.store.read();
            (
                store.selected_rows().iter().map(|row| row.data().clone()).collect(),
                store.unselected_rows().iter().map(|row| row.data().clone()).collect(),
            )
        };
        self.signals.selected.emit((selected, unselected));
    }

    /// Flip a column's visibility from the column toggler.
    pub fn toggle_column(&self, index: usize) -> Option<bool> {
        self.store.write().toggle_column(index)
    }

    /// Show all columns, or hide all if all are shown.
    pub fn toggle_all_columns(&self) {
        self.store.write().toggle_all_columns();
    }

    /// Current sort state.
    pub fn sort_state(&self) -> (Option<String>, Option<SortOrder>) {
        let store = self.store.read();
        (store.order_by().map(str::to_string), store.order())
    }
}
