//! Row synchronization, initial selection and reset behavior.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_grid::{QuickChangeOptions, RowKey, RowStore, Table, TableProps, TableStore};
use serde_json::json;

use common::{field_evaluator, mounted, schema};

#[test]
fn test_expression_wins_over_static_selection() {
    let props = TableProps::new(schema(json!({
        "rowSelection": {
            "type": "checkbox",
            "selectedRowKeys": [2],
            "selectedRowKeysExpr": "record.picked"
        }
    })))
    .with_value(vec![
        json!({"key": 1, "picked": true}),
        json!({"key": 2, "picked": false}),
    ]);
    let table = Table::builder(props)
        .evaluator(field_evaluator())
        .build(TableStore::new());
    table.mount();

    assert_eq!(table.store().current_selected_row_keys(), vec![RowKey::Int(1)]);
}

#[test]
fn test_expanded_keys_from_expression() {
    let props = TableProps::new(schema(json!({
        "expandable": {"keyField": "id", "expandedRowKeysExpr": "record.open"}
    })))
    .with_value(vec![
        json!({"id": 1, "open": false}),
        json!({"id": 2, "open": true}),
        json!({"id": 3, "open": true}),
    ]);
    let table = Table::builder(props)
        .evaluator(field_evaluator())
        .build(TableStore::new());
    table.mount();

    assert_eq!(
        table.store().current_expanded_keys(),
        vec![RowKey::Int(2), RowKey::Int(3)]
    );
}

#[test]
fn test_static_keys_of_missing_rows_are_dropped() {
    let table = mounted(
        json!({"rowSelection": {"selectedRowKeys": ["a", "zz"]}}),
        vec![json!({"key": "a"}), json!({"key": "b"})],
    );
    assert_eq!(
        table.store().current_selected_row_keys(),
        vec![RowKey::from("a")]
    );
}

#[test]
fn test_value_wins_over_items_and_source() {
    let props = TableProps::new(schema(json!({"source": "${rows}"})))
        .with_data(json!({"rows": [{"key": "s"}]}))
        .with_items(vec![json!({"key": "i"})])
        .with_value(vec![json!({"key": "v1"}), json!({"key": "v2"})]);
    let table = Table::builder(props).build(TableStore::new());
    table.mount();

    let store = table.store();
    assert_eq!(store.data_source(), vec![json!({"key": "v1"}), json!({"key": "v2"})]);
}

#[test]
fn test_equal_source_data_does_not_reset() {
    let props = TableProps::new(schema(json!({"source": "${rows}"})))
        .with_data(json!({"rows": [{"key": 1}, {"key": 2}], "page": 1}));
    let table = Table::builder(props.clone()).build(TableStore::new());
    table.mount();

    let resets = Arc::new(AtomicUsize::new(0));
    let resets_clone = resets.clone();
    table.store().signals().rows_reset.connect(move |_| {
        resets_clone.fetch_add(1, Ordering::SeqCst);
    });

    // New context data, same rows.
    let same_rows = json!({"rows": [{"key": 1}, {"key": 2}], "page": 2});
    table.receive_props(props.clone().with_data(same_rows));
    assert_eq!(resets.load(Ordering::SeqCst), 0);

    table.receive_props(props.with_data(json!({"rows": [{"key": 3}]})));
    assert_eq!(resets.load(Ordering::SeqCst), 1);
    assert_eq!(table.store().data_source(), vec![json!({"key": 3})]);
}

#[test]
fn test_source_resolving_to_non_array_keeps_rows() {
    let props = TableProps::new(schema(json!({"source": "${rows}"})))
        .with_data(json!({"rows": [{"key": 1}]}));
    let table = Table::builder(props.clone()).build(TableStore::new());
    table.mount();

    table.receive_props(props.with_data(json!({"rows": "not rows"})));
    assert_eq!(table.store().data_source(), vec![json!({"key": 1})]);
}

#[tokio::test]
async fn test_reset_is_deterministic() {
    let rows = vec![
        json!({"key": "a", "name": "Ada"}),
        json!({"key": "b", "name": "Grace"}),
        json!({"key": "c", "name": "Edsger"}),
    ];
    let table = mounted(json!({}), rows.clone());

    let first = table.store().row_by_index(0, &[]).unwrap();
    table
        .handle_quick_change(first, json!({"name": "Barbara"}), QuickChangeOptions::save_pristine())
        .await
        .unwrap();
    let second = table.store().row_by_index(1, &[]).unwrap();
    // No save API: the built-in save is refused and the edit stays.
    let refused = table
        .handle_quick_change(second, json!({"name": "Linus"}), QuickChangeOptions::default())
        .await;
    assert!(refused.is_err());
    assert_eq!(table.store().row(second).unwrap().data()["name"], "Linus");
    assert!(table.handle_order_change(0, 2, &[]));
    assert_eq!(table.store().moved(), 1);

    table.reset();
    let once = table.store().data_source();
    table.reset();
    let twice = table.store().data_source();

    assert_eq!(once, twice);
    assert_eq!(table.store().moved(), 0);
    assert_eq!(once[0], json!({"key": "a", "name": "Barbara"}));
    assert_eq!(once[1], rows[1]);
    assert_eq!(once[2], rows[2]);
}

#[test]
fn test_reused_rows_keep_their_ids() {
    let props = TableProps::new(schema(json!({"reUseRow": true})))
        .with_value(vec![json!({"key": "a"}), json!({"key": "b"})]);
    let table = Table::builder(props.clone()).build(TableStore::new());
    table.mount();
    let before = table.store().row_by_index(1, &[]).unwrap();

    table.receive_props(props.with_value(vec![json!({"key": "b"}), json!({"key": "c"})]));

    let store = table.store();
    assert_eq!(store.row_by_index(0, &[]), Some(before));
    assert!(store.is_alive(before));
}
