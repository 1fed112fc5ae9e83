//! Cancelable renderer events.
//!
//! Every user-triggered mutation of a grid (select, sort, filter, reorder,
//! row click) first announces itself through an [`EventDispatcher`]. The
//! dispatch is awaited; if any listener prevents the event the mutation is
//! abandoned and the prior state stays untouched.
//!
//! ```
//! use horizon_grid_core::{EventDispatcher, GridEvent, ListenerBus, Propagation};
//! use serde_json::json;
//!
//! # futures_util::FutureExt::now_or_never(async {
//! let bus = ListenerBus::new();
//! bus.listen(GridEvent::ColumnSort, |_payload| async { Propagation::Prevent });
//!
//! let outcome = bus.dispatch(GridEvent::ColumnSort, json!({"orderBy": "name"})).await;
//! assert!(outcome.prevented());
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

/// Names of the cancelable events a grid dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridEvent {
    /// Row selection is about to change.
    SelectedChange,
    /// A column sort was requested.
    ColumnSort,
    /// A column filter was requested.
    ColumnFilter,
    /// A row was clicked.
    RowClick,
    /// Reordered rows are about to be submitted.
    OrderChange,
}

impl GridEvent {
    /// The wire name listeners subscribe to.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectedChange => "selectedChange",
            Self::ColumnSort => "columnSort",
            Self::ColumnFilter => "columnFilter",
            Self::RowClick => "rowClick",
            Self::OrderChange => "orderChange",
        }
    }
}

impl fmt::Display for GridEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of dispatching an event to its listeners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererEvent {
    prevented: bool,
    stopped: bool,
}

impl RendererEvent {
    /// An event nobody objected to.
    pub fn proceed() -> Self {
        Self::default()
    }

    /// An event a listener prevented.
    pub fn prevented_event() -> Self {
        Self {
            prevented: true,
            stopped: false,
        }
    }

    /// `true` when the pending mutation must be abandoned.
    pub fn prevented(&self) -> bool {
        self.prevented
    }

    /// `true` when a listener stopped propagation to later listeners.
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Mark the event as prevented.
    pub fn prevent_default(&mut self) {
        self.prevented = true;
    }

    /// Stop delivering the event to remaining listeners.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }
}

/// Delivers cancelable events to external listeners.
///
/// Implementations must settle the returned future only after every listener
/// had its chance to prevent the event.
pub trait EventDispatcher: Send + Sync {
    /// Dispatch `event` with `payload` and report whether it was prevented.
    fn dispatch(&self, event: GridEvent, payload: Value) -> BoxFuture<'_, RendererEvent>;
}

/// A dispatcher with no listeners; nothing is ever prevented.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl EventDispatcher for NoopDispatcher {
    fn dispatch(&self, _event: GridEvent, _payload: Value) -> BoxFuture<'_, RendererEvent> {
        Box::pin(async { RendererEvent::proceed() })
    }
}

/// What a listener wants to happen after it ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Propagation {
    /// Let the event continue.
    #[default]
    Continue,
    /// Abandon the pending mutation; later listeners still run.
    Prevent,
    /// Do not deliver to later listeners.
    Stop,
    /// Prevent and stop.
    PreventAndStop,
}

new_key_type! {
    /// Identifies a listener registered on a [`ListenerBus`].
    pub struct ListenerId;
}

type Listener = Arc<dyn Fn(Value) -> BoxFuture<'static, Propagation> + Send + Sync>;

/// In-process [`EventDispatcher`] with async listeners.
///
/// Listeners for an event run one after another in registration order; each
/// is awaited before the next starts.
#[derive(Default)]
pub struct ListenerBus {
    listeners: Mutex<Listeners>,
}

#[derive(Default)]
struct Listeners {
    slots: SlotMap<ListenerId, Registration>,
    next_seq: u64,
}

struct Registration {
    // Slots are recycled, so order comes from this counter.
    seq: u64,
    event: GridEvent,
    listener: Listener,
}

impl fmt::Debug for ListenerBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerBus")
            .field("listeners", &self.listeners.lock().slots.len())
            .finish()
    }
}

impl ListenerBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async listener for `event`.
    pub fn listen<F, Fut>(&self, event: GridEvent, listener: F) -> ListenerId
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Propagation> + Send + 'static,
    {
        let boxed: Listener =
            Arc::new(move |payload| -> BoxFuture<'static, Propagation> { Box::pin(listener(payload)) });
        let mut listeners = self.listeners.lock();
        let seq = listeners.next_seq;
        listeners.next_seq += 1;
        listeners.slots.insert(Registration {
            seq,
            event,
            listener: boxed,
        })
    }

    /// Remove a listener.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.listeners.lock().slots.remove(id).is_some()
    }

    fn listeners_for(&self, event: GridEvent) -> Vec<Listener> {
        let listeners = self.listeners.lock();
        let mut matching: Vec<&Registration> = listeners
            .slots
            .values()
            .filter(|registration| registration.event == event)
            .collect();
        matching.sort_by_key(|registration| registration.seq);
        matching
            .into_iter()
            .map(|registration| registration.listener.clone())
            .collect()
    }
}

impl EventDispatcher for ListenerBus {
    fn dispatch(&self, event: GridEvent, payload: Value) -> BoxFuture<'_, RendererEvent> {
        let listeners = self.listeners_for(event);
        Box::pin(async move {
            let mut outcome = RendererEvent::proceed();
            for listener in listeners {
                match listener(payload.clone()).await {
                    Propagation::Continue => {}
                    Propagation::Prevent => outcome.prevent_default(),
                    Propagation::Stop => outcome.stop_propagation(),
                    Propagation::PreventAndStop => {
                        outcome.prevent_default();
                        outcome.stop_propagation();
                    }
                }
                if outcome.stopped() {
                    break;
                }
            }
            tracing::debug!(
                target: targets::EVENTS,
                event = %event,
                prevented = outcome.prevented(),
                "dispatched renderer event"
            );
            outcome
        })
    }
}
