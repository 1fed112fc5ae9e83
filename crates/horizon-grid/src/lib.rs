//! Horizon Grid - a schema-driven data grid engine.
//!
//! This crate holds everything between a declarative table configuration and
//! the widget that paints it:
//!
//! - **Model**: rows with pristine snapshots, key-based selection and
//!   expansion, column visibility, sort and query state ([`model`])
//! - **Synchronizer**: decides when incoming rows replace the model and
//!   applies initial selection and expansion
//! - **Column Builder**: turns the column tree into header and cell
//!   renderers, resolving merged cells per render pass
//! - **Quick edits**: diffing against the pristine snapshot and saving
//!   through a [`SaveTransport`], with rollback on failure
//! - **Selection presets and actions**: `all`, `invert`, `odd`, ... and
//!   `selectAll`, `clearAll`, `select`
//!
//! Expressions in the configuration are evaluated through the [`Evaluator`]
//! trait; user interactions are announced through a cancelable
//! [`EventDispatcher`] before they mutate anything.
//!
//! # Example
//!
//! ```
//! use horizon_grid::{Table, TableProps, TableSchema, TableStore};
//! use serde_json::json;
//!
//! let schema = TableSchema::from_value(json!({
//!     "columns": [
//!         {"key": "city", "title": "City", "type": "text", "rowSpanExpr": "${record.span}"},
//!         {"key": "name", "title": "Name", "type": "text"}
//!     ]
//! })).unwrap();
//!
//! let props = TableProps::new(schema).with_value(vec![
//!     json!({"city": "Oslo", "name": "Ada", "span": 2}),
//!     json!({"city": "Oslo", "name": "Grace"}),
//! ]);
//! let table = Table::builder(props).build(TableStore::new());
//! table.mount();
//!
//! let mut render = table.render().unwrap();
//! let body = table.render_body(&mut render);
//! let merged = body[1][0].as_ref().unwrap();
//! assert!(merged.props.is_suppressed());
//! ```

pub mod error;
pub mod expr;
pub mod model;
pub mod remote;
pub mod schema;
pub mod table;

pub use error::{GridError, Result, SaveError};
pub use expr::{Evaluator, ExprContext, FnEvaluator, VariableEvaluator};
pub use model::{EditState, Row, RowId, RowKey, RowStore, SortOrder, TableStore};
pub use remote::{NoTransport, RemoteMessages, SaveTransport};
pub use schema::{ColumnSchema, SaveApi, TableSchema};
pub use table::{
    ActionRequest, HandlerOutcome, QuickChangeOptions, QuickEditOutcome, SelectionPreset, Table,
    TableAction, TableBuilder, TableProps, TableSignals,
};

pub use horizon_grid_core::{
    EventDispatcher, GridEvent, ListenerBus, NoopDispatcher, Propagation, RendererEvent, Signal,
};

static_assertions::assert_impl_all!(TableStore: Send, Sync);
static_assertions::assert_impl_all!(Table: Send, Sync);
