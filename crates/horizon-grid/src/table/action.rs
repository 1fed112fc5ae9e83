//! Actions the host can invoke on a table.

use horizon_grid_core::logging::targets;
use serde_json::Value;

use crate::error::{GridError, Result};
use crate::expr::ExprContext;
use crate::model::RowStore;
use crate::model::value::key_of;

use super::Table;

/// A selection action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    /// Select every row.
    SelectAll,
    /// Clear the selection.
    ClearAll,
    /// Select the rows for which the expression is truthy.
    Select { selected_row_keys_expr: String },
}

impl TableAction {
    /// Build an action from its name and arguments.
    ///
    /// `select` reads its expression from `args.selectedRowKeysExpr`; a
    /// missing expression selects nothing.
    ///
    /// # Errors
    ///
    /// [`GridError::UnknownAction`] for names other than `selectAll`,
    /// `clearAll` and `select`.
    pub fn parse(action_type: &str, args: &Value) -> Result<Self> {
        match action_type {
            "selectAll" => Ok(Self::SelectAll),
            "clearAll" => Ok(Self::ClearAll),
            "select" => Ok(Self::Select {
                selected_row_keys_expr: args
                    .get("selectedRowKeysExpr")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }),
            other => Err(GridError::UnknownAction(other.to_string())),
        }
    }
}

impl<S: RowStore> Table<S> {
    /// Run `action` against the row selection.
    ///
    /// # Errors
    ///
    /// [`GridError::SelectionNotConfigured`] without row selection.
    pub fn do_action(&self, action: TableAction) -> Result<()> {
        let props = self.props();
        let selection = props
            .schema
            .row_selection
            .as_ref()
            .ok_or(GridError::SelectionNotConfigured)?;
        let key_field = selection.key_field.as_deref();

        tracing::debug!(target: targets::ACTION, ?action, "action");

        let mut store = self.store.write();
        match action {
            TableAction::SelectAll => store.update_selected_all(key_field),
            TableAction::ClearAll => store.update_selected(Vec::new(), key_field),
            TableAction::Select {
                selected_row_keys_expr,
            } => {
                let context = store.context_data(&props.data);
                let items = context
                    .get("items")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                let keys = if selected_row_keys_expr.is_empty() {
                    Vec::new()
                } else {
                    items
                        .iter()
                        .enumerate()
                        .filter(|(index, item)| {
                            self.evaluator.test(
                                &selected_row_keys_expr,
                                &ExprContext::row((*item).clone(), *index).to_value(),
                            )
                        })
                        .filter_map(|(_, item)| key_of(item, selection.key_field()))
                        .collect()
                };
                store.update_selected(keys, key_field);
            }
        }
        Ok(())
    }
}
