//! Horizon Grid Quick Edit Example
//!
//! Mounts a table over a handful of rows, prints the rendered body with its
//! merged cells, then runs two quick edits against an in-memory save
//! endpoint: one accepted, one rejected and rolled back.
//!
//! Run with: RUST_LOG=horizon_grid=debug cargo run -p horizon-grid --example quick_edit

use std::sync::Arc;

use futures_util::future::BoxFuture;
use horizon_grid::{
    QuickChangeOptions, RowStore, SaveApi, SaveError, SaveTransport, Table, TableProps,
    TableSchema, TableStore,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

/// Accepts any row with a non-empty name.
struct InMemoryEndpoint;

impl SaveTransport for InMemoryEndpoint {
    fn save(&self, api: &SaveApi, payload: Value) -> BoxFuture<'static, Result<Value, SaveError>> {
        let url = api.url().to_string();
        Box::pin(async move {
            match payload.get("name").and_then(Value::as_str) {
                Some(name) if !name.is_empty() => {
                    println!("  {url} accepted {name:?}");
                    Ok(json!({"ok": true}))
                }
                _ => Err(SaveError::with_status("name must not be empty", 422)),
            }
        })
    }
}

fn print_body(table: &Table) {
    let Some(mut render) = table.render() else {
        return;
    };
    let body = table.render_body(&mut render);
    for (record, cells) in render.data_source.iter().zip(&body) {
        let marks: Vec<&str> = cells
            .iter()
            .map(|cell| match cell {
                Some(cell) if cell.props.is_suppressed() => "merged",
                Some(_) => "cell",
                None => "-",
            })
            .collect();
        println!("  {record} => {marks:?}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let schema = TableSchema::from_value(json!({
        "quickSaveItemApi": "put:/api/people",
        "columns": [
            {"key": "team", "title": "Team", "type": "text", "rowSpanExpr": "${record.teamSize}"},
            {"key": "name", "title": "Name", "type": "text"}
        ]
    }))?;
    let props = TableProps::new(schema).with_value(vec![
        json!({"id": 1, "team": "Compilers", "name": "Grace", "teamSize": 2}),
        json!({"id": 2, "team": "Compilers", "name": "Frances"}),
        json!({"id": 3, "team": "Kernels", "name": "Ken"}),
    ]);
    let store = TableStore::with_transport(Arc::new(InMemoryEndpoint));
    let table = Table::builder(props).build(store);

    table.signals().edit_reset.connect(|row| println!("  reverted {row:?}"));
    table.mount();

    println!("Rendered body:");
    print_body(&table);

    let row = table.store().row_by_index(1, &[]).ok_or("missing row")?;

    println!("Renaming row 1:");
    let outcome = table
        .handle_quick_change(row, json!({"name": "Barbara"}), QuickChangeOptions::default())
        .await?;
    println!("  outcome: {outcome:?}");

    println!("Clearing the name of row 1:");
    let outcome = table
        .handle_quick_change(row, json!({"name": ""}), QuickChangeOptions::reset_on_failed())
        .await?;
    println!("  outcome: {outcome:?}");

    if let Some(current) = table.store().row(row) {
        println!("  row 1 is now {}", current.data());
    }
    Ok(())
}
