//! Core systems for Horizon Grid.
//!
//! This crate provides the plumbing the grid component is built on:
//!
//! - **Signal/Slot System**: synchronous notifications to external observers
//! - **Renderer Events**: awaited, cancelable notifications dispatched before
//!   every user-triggered mutation
//! - **Logging**: `tracing` targets and timing spans
//!
//! # Signal Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let reload = Signal::<String>::new();
//! reload.connect(|target| println!("reload {target}"));
//! reload.emit("crud-list".to_string());
//! ```
//!
//! # Cancelable Event Example
//!
//! ```
//! use horizon_grid_core::{EventDispatcher, GridEvent, NoopDispatcher};
//!
//! # futures_util::FutureExt::now_or_never(async {
//! let outcome = NoopDispatcher
//!     .dispatch(GridEvent::RowClick, serde_json::Value::Null)
//!     .await;
//! if !outcome.prevented() {
//!     // mutate
//! }
//! # });
//! ```

mod event;
pub mod logging;
pub mod signal;

pub use event::{
    EventDispatcher, GridEvent, ListenerBus, ListenerId, NoopDispatcher, Propagation,
    RendererEvent,
};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
