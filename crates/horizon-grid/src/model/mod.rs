//! The table data model.
//!
//! Rows hold schemaless JSON records with a pristine snapshot for
//! quick-edit diffs. The [`RowStore`] trait is the only way the table
//! component reads or mutates that state; [`TableStore`] implements it in
//! memory.
//!
//! # Core Types
//!
//! - `Row` / `RowId`: one record and its handle
//! - `RowKey`: identity of a row in selection and expansion sets
//! - `SelectionModel`: ordered key set with change notifications
//! - `RowStore` / `TableStore`: the store boundary and its implementation
//!
//! # Example
//!
//! ```
//! use horizon_grid::model::{RowKey, RowStore, TableStore};
//! use serde_json::json;
//!
//! let mut store = TableStore::new();
//! store.init_rows(vec![json!({"id": 1}), json!({"id": 2})], None, false, None);
//!
//! store.update_selected(vec![RowKey::from(2)], Some("id"));
//! assert_eq!(store.selected_rows()[0].data(), &json!({"id": 2}));
//! ```

mod row;
pub mod selection;
mod store;
pub mod value;

pub use row::{EditState, Row, RowId};
pub use selection::SelectionModel;
pub use store::{
    ColumnState, IdentityFn, Notice, NoticeLevel, RowStore, SortOrder, StoreSignals, TableStore,
};
pub use value::{Record, RowKey};
