//! Row, selection and expansion synchronization.

use std::sync::Arc;

use horizon_grid_core::logging::targets;
use serde_json::Value;

use crate::expr::{Evaluator, ExprContext};
use crate::model::RowStore;
use crate::model::RowKey;
use crate::model::value::{key_of, truthy};

use super::TableProps;

/// Reconcile the store's rows with `props`.
///
/// Explicit rows (`value`, then `items`) reset the store when their array
/// identity differs from `prev`. Otherwise a `source` expression is resolved
/// against the context data; rows reset when it resolves to an array and
/// differs from what it resolved to under `prev`.
///
/// After a reset, initial selection and expansion keys are applied when
/// non-empty. Returns `true` if the rows were reset.
pub(crate) fn sync_rows<S: RowStore + ?Sized>(
    store: &mut S,
    evaluator: &dyn Evaluator,
    props: &TableProps,
    prev: Option<&TableProps>,
) -> bool {
    let schema = &props.schema;

    let explicit = props.rows().filter(|rows| {
        prev.is_none_or(|prev| !prev.rows().is_some_and(|prev_rows| Arc::ptr_eq(prev_rows, rows)))
    });

    let mut rows: Vec<Value> = Vec::new();
    let mut update = false;

    if let Some(explicit) = explicit {
        update = true;
        rows = explicit.to_vec();
    } else if let Some(source) = schema.source.as_deref() {
        let resolved = evaluator.resolve_source(source, &props.data);
        let previous = prev.map(|prev| evaluator.resolve_source(source, &prev.data));

        let unchanged = previous
            .as_ref()
            .is_some_and(|previous| truthy(previous) && *previous == resolved);
        if !unchanged {
            if let Value::Array(items) = resolved {
                update = true;
                rows = items;
            }
        }
    }

    if !update {
        tracing::trace!(target: targets::SYNC, "rows unchanged");
        return false;
    }

    store.init_rows(
        rows.clone(),
        props.get_entry_id.clone(),
        schema.reuse_row,
        schema.children_column_name.as_deref(),
    );
    tracing::debug!(target: targets::SYNC, count = rows.len(), "rows reset");

    if let Some(selection) = &schema.row_selection {
        let keys = initial_keys(
            evaluator,
            &rows,
            selection.selected_row_keys_expr.as_deref(),
            selection.selected_row_keys.as_deref(),
            selection.key_field(),
        );
        if !keys.is_empty() {
            store.update_selected(keys, selection.key_field.as_deref());
        }
    }

    if let Some(expandable) = &schema.expandable {
        let keys = initial_keys(
            evaluator,
            &rows,
            expandable.expanded_row_keys_expr.as_deref(),
            expandable.expanded_row_keys.as_deref(),
            expandable.key_field(),
        );
        if !keys.is_empty() {
            store.update_expanded(keys, expandable.key_field.as_deref());
        }
    }

    true
}

/// Keys of the rows matching `expr`, or the static `keys` without one.
fn initial_keys(
    evaluator: &dyn Evaluator,
    rows: &[Value],
    expr: Option<&str>,
    keys: Option<&[RowKey]>,
    key_field: &str,
) -> Vec<RowKey> {
    match expr {
        Some(expr) => rows
            .iter()
            .enumerate()
            .filter(|(index, row)| {
                evaluator.test(expr, &ExprContext::row((*row).clone(), *index).to_value())
            })
            .filter_map(|(_, row)| key_of(row, key_field))
            .collect(),
        None => keys.map(<[RowKey]>::to_vec).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{FnEvaluator, VariableEvaluator};
    use crate::model::TableStore;
    use crate::schema::TableSchema;
    use serde_json::json;

    fn props(schema: Value) -> TableProps {
        TableProps::new(TableSchema::from_value(schema).unwrap())
    }

    #[test]
    fn test_explicit_rows_identity() {
        let mut store = TableStore::new();
        let first = props(json!({})).with_value(vec![json!({"key": 1})]);
        assert!(sync_rows(&mut store, &VariableEvaluator, &first, None));

        let same = first.clone();
        assert!(!sync_rows(&mut store, &VariableEvaluator, &same, Some(&first)));

        let copy = first.clone().with_value(vec![json!({"key": 1})]);
        assert!(sync_rows(&mut store, &VariableEvaluator, &copy, Some(&first)));
    }

    #[test]
    fn test_value_wins_over_items() {
        let mut store = TableStore::new();
        let props = props(json!({}))
            .with_items(vec![json!({"key": "i"})])
            .with_value(vec![json!({"key": "v1"}), json!({"key": "v2"})]);
        sync_rows(&mut store, &VariableEvaluator, &props, None);
        assert_eq!(store.data_source().len(), 2);
    }

    #[test]
    fn test_source_structural_equality() {
        let mut store = TableStore::new();
        let prev = props(json!({"source": "${rows}"})).with_data(json!({"rows": [{"key": 1}]}));
        assert!(sync_rows(&mut store, &VariableEvaluator, &prev, None));

        let equal = prev.clone().with_data(json!({"rows": [{"key": 1}]}));
        assert!(!sync_rows(&mut store, &VariableEvaluator, &equal, Some(&prev)));

        let changed = prev.clone().with_data(json!({"rows": [{"key": 2}]}));
        assert!(sync_rows(&mut store, &VariableEvaluator, &changed, Some(&prev)));
    }

    #[test]
    fn test_source_not_array_keeps_rows() {
        let mut store = TableStore::new();
        let prev = props(json!({"source": "${rows}"})).with_data(json!({"rows": [{"key": 1}]}));
        sync_rows(&mut store, &VariableEvaluator, &prev, None);

        let next = prev.clone().with_data(json!({"rows": "nope"}));
        assert!(!sync_rows(&mut store, &VariableEvaluator, &next, Some(&prev)));
        assert_eq!(store.data_source().len(), 1);
    }

    #[test]
    fn test_selection_expression_wins() {
        let evaluator = FnEvaluator::new(|expr: &str, data: &Value| {
            assert_eq!(expr, "pick");
            Value::Bool(data["record"]["id"] == json!(2) || data["rowIndex"] == json!(2))
        });
        let mut store = TableStore::new();
        let props = props(json!({
            "rowSelection": {
                "keyField": "id",
                "selectedRowKeys": [1],
                "selectedRowKeysExpr": "pick"
            }
        }))
        .with_value(vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);

        sync_rows(&mut store, &evaluator, &props, None);
        assert_eq!(
            store.current_selected_row_keys(),
            vec![RowKey::from(2), RowKey::from(3)]
        );
    }

    #[test]
    fn test_initial_expansion_keys() {
        let mut store = TableStore::new();
        let props = props(json!({"expandable": {"expandedRowKeys": ["b"]}}))
            .with_value(vec![json!({"key": "a"}), json!({"key": "b"})]);
        sync_rows(&mut store, &VariableEvaluator, &props, None);
        assert_eq!(store.current_expanded_keys(), vec![RowKey::from("b")]);
        assert!(store.current_selected_row_keys().is_empty());
    }
}
