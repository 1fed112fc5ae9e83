//! User interaction handlers.
//!
//! Each handler dispatches a cancelable event first and leaves the table
//! untouched when a listener prevents it.

use horizon_grid_core::{GridEvent, logging::targets};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::value::{Record, create_object};
use crate::model::{RowKey, RowStore, SortOrder};

use super::Table;

/// Whether a handler went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Applied,
    /// A listener prevented the event.
    Prevented,
}

/// A column sort request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRequest {
    pub order_by: Option<String>,
    #[serde(rename = "orderDir")]
    pub order: Option<SortOrder>,
}

/// A column filter request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub filter_name: String,
    pub filter_value: Value,
}

impl<S: RowStore> Table<S> {
    async fn dispatch(&self, event: GridEvent, overlay: Record) -> bool {
        let payload = create_object(&self.props.read().data, overlay);
        let outcome = self.dispatcher.dispatch(event, payload).await;
        if outcome.prevented() {
            tracing::debug!(target: targets::EVENTS, %event, "prevented");
        }
        outcome.prevented()
    }

    /// Selection changed in the painting widget.
    ///
    /// Dispatches `selectedChange`, then stores `selected_keys` and
    /// announces the rows through `selected`.
    pub async fn handle_selected(
        &self,
        selected_rows: Vec<Value>,
        selected_keys: Vec<RowKey>,
        unselected_rows: Vec<Value>,
    ) -> HandlerOutcome {
        let mut overlay = Record::new();
        overlay.insert("selectedItems".into(), Value::Array(selected_rows.clone()));
        overlay.insert("unSelectedItems".into(), Value::Array(unselected_rows.clone()));
        if self.dispatch(GridEvent::SelectedChange, overlay).await {
            return HandlerOutcome::Prevented;
        }

        let key_field = self
            .schema()
            .row_selection
            .as_ref()
            .and_then(|selection| selection.key_field.clone());
        self.store
            .write()
            .update_selected(selected_keys, key_field.as_deref());
        self.signals.selected.emit((selected_rows, unselected_rows));
        HandlerOutcome::Applied
    }

    /// A column header requested a sort.
    pub async fn handle_sort(&self, request: SortRequest) -> HandlerOutcome {
        let mut overlay = Record::new();
        overlay.insert(
            "orderBy".into(),
            request.order_by.clone().map_or(Value::Null, Value::from),
        );
        overlay.insert(
            "orderDir".into(),
            request.order.map_or(Value::Null, |order| Value::from(order.as_str())),
        );
        if self.dispatch(GridEvent::ColumnSort, overlay).await {
            return HandlerOutcome::Prevented;
        }

        self.store
            .write()
            .set_order(request.order_by.clone(), request.order);
        self.signals.sorted.emit(request);
        HandlerOutcome::Applied
    }

    /// A column header requested a filter.
    pub async fn handle_filter(&self, request: FilterRequest) -> HandlerOutcome {
        let mut overlay = Record::new();
        overlay.insert("filterName".into(), Value::from(request.filter_name.clone()));
        overlay.insert("filterValue".into(), request.filter_value.clone());
        if self.dispatch(GridEvent::ColumnFilter, overlay).await {
            return HandlerOutcome::Prevented;
        }

        let mut query = Record::new();
        query.insert(request.filter_name.clone(), request.filter_value.clone());
        self.store.write().update_query(&Value::Object(query));
        self.signals.filtered.emit(request);
        HandlerOutcome::Applied
    }

    /// A row was clicked. `row_item` is `null` for clicks outside a row.
    pub async fn handle_row_click(&self, row_item: Value, row_index: Option<usize>) -> HandlerOutcome {
        let mut overlay = Record::new();
        overlay.insert("rowItem".into(), row_item.clone());
        if self.dispatch(GridEvent::RowClick, overlay).await {
            return HandlerOutcome::Prevented;
        }

        if !row_item.is_null() {
            self.signals.row_clicked.emit((row_item, row_index));
        }
        HandlerOutcome::Applied
    }

    /// A row was dragged from `old_index` to `new_index` among its
    /// siblings. `levels` locate its parent. Returns `false` if no row
    /// was found.
    ///
    /// Applies at once; the cancel point is `orderChange` in
    /// [`Table::handle_save_order`].
    pub fn handle_order_change(&self, old_index: usize, new_index: usize, levels: &[usize]) -> bool {
        let mut store = self.store.write();
        let Some(row) = store.row_by_index(old_index, levels) else {
            tracing::debug!(target: targets::EVENTS, old_index, ?levels, "no row to move");
            return false;
        };
        store.exchange(old_index, new_index, row);
        true
    }

    /// Submit the current row order.
    ///
    /// Dispatches `orderChange` with the moved rows, then emits
    /// `order_saved` when rows moved and someone listens.
    pub async fn handle_save_order(&self) -> HandlerOutcome {
        let moved: Vec<Value> = {
            let store = self.store.read();
            store.moved_rows().iter().map(|row| row.data().clone()).collect()
        };

        let mut overlay = Record::new();
        overlay.insert("movedItems".into(), Value::Array(moved.clone()));
        if self.dispatch(GridEvent::OrderChange, overlay).await {
            return HandlerOutcome::Prevented;
        }

        if moved.is_empty() || !self.signals.order_saved.is_connected() {
            return HandlerOutcome::Applied;
        }

        let items = self.store.read().rows_data_with_modified_children();
        self.signals.order_saved.emit((moved, items));
        HandlerOutcome::Applied
    }

    /// Discard edits and reorderings.
    pub fn reset(&self) {
        self.store.write().reset();
    }
}
