//! HTTP persistence for Horizon Grid.
//!
//! [`HttpSaveTransport`] implements [`horizon_grid::SaveTransport`] over
//! `reqwest`, so a table's quick saves reach a REST endpoint:
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use horizon_grid::TableStore;
//! use horizon_grid_net::HttpSaveTransport;
//!
//! let transport = HttpSaveTransport::builder()
//!     .base_url("https://api.example.com")?
//!     .timeout(Duration::from_secs(10))
//!     .bearer_auth(token)?
//!     .build()?;
//!
//! let store = TableStore::with_transport(Arc::new(transport));
//! ```
//!
//! Endpoints answer with JSON. A body whose `status` is non-zero is a
//! rejection and its `msg` is shown to the user.

pub mod error;
pub mod save;

pub use error::{NetworkError, Result};
pub use save::{HttpSaveTransport, HttpSaveTransportBuilder, HttpSaveTransportConfig};

static_assertions::assert_impl_all!(HttpSaveTransport: Send, Sync, Clone);
