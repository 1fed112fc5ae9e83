//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use horizon_grid::{
    Evaluator, EventDispatcher, FnEvaluator, GridEvent, RendererEvent, SaveApi, SaveError,
    SaveTransport, Table, TableProps, TableSchema, TableStore,
};
use parking_lot::Mutex;
use serde_json::Value;

/// Records every dispatched event; prevents the ones it was told to.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<(GridEvent, Value)>>,
    prevent: Mutex<Vec<GridEvent>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn preventing(events: &[GridEvent]) -> Arc<Self> {
        let dispatcher = Self::default();
        dispatcher.prevent.lock().extend_from_slice(events);
        Arc::new(dispatcher)
    }

    pub fn events(&self) -> Vec<(GridEvent, Value)> {
        self.events.lock().clone()
    }

    pub fn names(&self) -> Vec<GridEvent> {
        self.events.lock().iter().map(|(event, _)| *event).collect()
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: GridEvent, payload: Value) -> BoxFuture<'_, RendererEvent> {
        self.events.lock().push((event, payload));
        let prevented = self.prevent.lock().contains(&event);
        Box::pin(async move {
            if prevented {
                RendererEvent::prevented_event()
            } else {
                RendererEvent::proceed()
            }
        })
    }
}

/// A transport answering from a script of results, recording each call.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<Value, SaveError>>>,
    calls: Mutex<Vec<(SaveApi, Value)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn succeeding() -> Arc<Self> {
        let transport = Self::new();
        transport.push(Ok(Value::Null));
        transport
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let transport = Self::new();
        transport.push(Err(SaveError::new(message)));
        transport
    }

    pub fn push(&self, result: Result<Value, SaveError>) {
        self.script.lock().push_back(result);
    }

    pub fn calls(&self) -> Vec<(SaveApi, Value)> {
        self.calls.lock().clone()
    }
}

impl SaveTransport for MockTransport {
    fn save(&self, api: &SaveApi, payload: Value) -> BoxFuture<'static, Result<Value, SaveError>> {
        self.calls.lock().push((api.clone(), payload));
        let result = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SaveError::new("unscripted save")));
        Box::pin(async move { result })
    }
}

/// An evaluator reading `record.<field>` for expressions of the form
/// `record.<field>`, and constants otherwise.
pub fn field_evaluator() -> Arc<dyn Evaluator> {
    Arc::new(FnEvaluator::new(|expr: &str, ctx: &Value| {
        match expr.strip_prefix("record.") {
            Some(field) => ctx["record"].get(field).cloned().unwrap_or(Value::Null),
            None => Value::String(expr.to_string()),
        }
    }))
}

pub fn schema(json: Value) -> TableSchema {
    TableSchema::from_value(json).expect("invalid schema")
}

/// A mounted table over `rows`.
pub fn mounted(schema_json: Value, rows: Vec<Value>) -> Table {
    let props = TableProps::new(schema(schema_json)).with_value(rows);
    let table = Table::builder(props).build(TableStore::new());
    table.mount();
    table
}
