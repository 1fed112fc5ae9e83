//! Tests for the HTTP save transport.

use std::sync::Arc;
use std::time::Duration;

use horizon_grid::{
    QuickChangeOptions, QuickEditOutcome, RowStore, SaveApi, SaveTransport, Table, TableProps,
    TableSchema, TableStore,
};
use horizon_grid_net::{HttpSaveTransport, NetworkError};
use parking_lot::Mutex;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpSaveTransport {
    HttpSaveTransport::builder()
        .base_url(server.uri())
        .expect("Invalid base url")
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build transport")
}

#[tokio::test]
async fn test_post_payload_and_unwrap_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/save"))
        .and(body_partial_json(json!({"id": 7})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": 0, "data": {"ok": true}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data = transport(&server)
        .send(&SaveApi::parse("/api/save"), json!({"id": 7, "name": "Ada"}))
        .await
        .expect("Save failed");
    assert_eq!(data, json!({"ok": true}));
}

#[tokio::test]
async fn test_method_prefix_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rows/1"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpSaveTransport::builder()
        .base_url(server.uri())
        .unwrap()
        .bearer_auth("secret")
        .unwrap()
        .build()
        .unwrap();

    let data = transport
        .send(&SaveApi::parse("put:/rows/1"), json!({}))
        .await
        .expect("Save failed");
    assert!(data.is_null());
}

#[tokio::test]
async fn test_get_sends_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0})))
        .expect(1)
        .mount(&server)
        .await;

    transport(&server)
        .send(&SaveApi::parse("get:/lookup"), json!({"id": 3}))
        .await
        .expect("Save failed");
}

#[tokio::test]
async fn test_body_status_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": 422, "msg": "name taken"})),
        )
        .mount(&server)
        .await;

    let err = transport(&server)
        .send(&SaveApi::parse("/api/save"), json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::Rejected { status: 422, .. }));
    assert_eq!(err.to_string(), "name taken");
}

#[tokio::test]
async fn test_http_error_maps_to_save_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"msg": "down"})))
        .mount(&server)
        .await;

    let err = transport(&server)
        .save(&SaveApi::parse("/api/save"), json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.message(), "down");
}

#[tokio::test]
async fn test_table_quick_save_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rows"))
        .and(body_partial_json(json!({
            "ids": "1",
            "indexes": ["0"],
            "rowsDiff": {"name": "Grace"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let schema = TableSchema::from_value(json!({
        "quickSaveApi": "/api/rows",
        "reload": "list"
    }))
    .unwrap();
    let props = TableProps::new(schema).with_value(vec![json!({"id": 1, "name": "Ada"})]);
    let store = TableStore::with_transport(Arc::new(transport(&server)));
    let table = Table::builder(props).build(store);
    table.mount();

    let reloads = Arc::new(Mutex::new(Vec::new()));
    let reloads_clone = reloads.clone();
    table
        .signals()
        .reload_requested
        .connect(move |(target, _)| reloads_clone.lock().push(target.clone()));

    let row = table.store().row_by_index(0, &[]).unwrap();
    let outcome = table
        .handle_quick_change(row, json!({"name": "Grace"}), QuickChangeOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, QuickEditOutcome::Saved);
    assert_eq!(*reloads.lock(), vec!["list".to_string()]);
}
