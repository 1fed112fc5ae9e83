//! Signal/slot notifications for Horizon Grid.
//!
//! A [`Signal`] is the observer primitive the grid uses to announce state
//! that external listeners care about: selection changes, saved orders,
//! reload requests, user-visible alerts. Slots run synchronously on the
//! emitting thread, which for a grid is always the UI event loop.
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let selected = Signal::<Vec<String>>::new();
//!
//! let id = selected.connect(|keys| {
//!     println!("{} rows selected", keys.len());
//! });
//!
//! selected.emit(vec!["k1".to_string()]);
//! selected.disconnect(id);
//! ```
//!
//! Signals are not a cancellation mechanism. Anything that may be vetoed by a
//! listener goes through [`crate::EventDispatcher`] instead, which is awaited
//! before the mutation happens.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Identifies one slot connected to a [`Signal`].
    ///
    /// Returned by [`Signal::connect`]; pass it to [`Signal::disconnect`] to
    /// remove the slot again. Keys of removed slots are never reused.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal with any number of connected slots.
///
/// `Args` is the payload handed to every slot by reference. Use `()` for
/// payload-less notifications and tuples for several values.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.slots.lock().len())
            .field("blocked", &self.blocked.load(Ordering::Relaxed))
            .finish()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a signal with no connections.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot. Slots run in connection order.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.slots.lock().insert(Arc::new(slot))
    }

    /// Disconnect a slot. Returns `false` if the id was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    /// Disconnect every slot.
    pub fn disconnect_all(&self) {
        self.slots.lock().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns `true` if at least one slot is connected.
    ///
    /// The table uses this to mirror "is a callback configured" checks, e.g.
    /// a save-order request is only meaningful when someone listens for it.
    pub fn is_connected(&self) -> bool {
        !self.slots.lock().is_empty()
    }

    /// Suppress (or re-enable) emission.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Whether emission is currently suppressed.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Invoke every connected slot with `args`.
    ///
    /// The slot list is snapshotted before invocation, so a slot may connect
    /// or disconnect other slots without deadlocking; such changes apply to
    /// the next emission.
    #[tracing::instrument(skip_all, target = "horizon_grid_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<Slot<Args>> = self.slots.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, AtomicUsize};

    #[test]
    fn test_signal_connect_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(AtomicI32::new(0));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.store(value, Ordering::SeqCst);
        });

        signal.emit(42);
        assert_eq!(received.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = Signal::<i32>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        let id = signal.connect(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(2);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!signal.is_connected());
    }

    #[test]
    fn test_signal_blocked() {
        let signal = Signal::<()>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        signal.connect(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.set_blocked(true);
        signal.emit(());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        signal.set_blocked(false);
        signal.emit(());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_can_connect_during_emit() {
        let signal = Arc::new(Signal::<()>::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_signal = signal.clone();
        let inner_counter = counter.clone();
        signal.connect(move |_| {
            let c = inner_counter.clone();
            inner_signal.connect(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });
        });

        signal.emit(());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(signal.connection_count(), 2);
    }

    #[test]
    fn test_signal_with_tuple_args() {
        let signal = Signal::<(Vec<u32>, Vec<u32>)>::new();
        let totals = Arc::new(Mutex::new((0, 0)));

        let totals_clone = totals.clone();
        signal.connect(move |(selected, unselected)| {
            *totals_clone.lock() = (selected.len(), unselected.len());
        });

        signal.emit((vec![1, 2, 3], vec![4]));
        assert_eq!(*totals.lock(), (3, 1));
    }
}
