//! Per-event listener registry.
//!
//! Callbacks are keyed by event name and held as `Arc`s; pointer identity is
//! the set key, so registering the same `Arc` twice is a no-op and removal
//! takes the same `Arc` back. Dispatch isolates per-callback panics: a
//! misbehaving listener is caught and logged, and the remaining listeners
//! for that event still run.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{error, trace};

// ============================================================================
// Types
// ============================================================================

/// A registered event callback.
///
/// Receives the full message payload as received from the server (or the
/// synthesized payload for client-originated events such as
/// `connection_failed`).
pub type ListenerCallback = Arc<dyn Fn(&Value) + Send + Sync>;

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Map from event name to its callback set.
///
/// Shared between the client API and the connection event loop; all methods
/// take `&self`.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<FxHashMap<String, Vec<ListenerCallback>>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for an event.
    ///
    /// Returns `false` if this exact callback (`Arc` identity) was already
    /// registered for the event.
    pub fn add(&self, event: &str, callback: ListenerCallback) -> bool {
        let mut listeners = self.listeners.lock();
        let entry = listeners.entry(event.to_string()).or_default();

        if entry.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
            trace!(event, "listener already registered");
            return false;
        }
        entry.push(callback);
        true
    }

    /// Removes a callback from an event.
    ///
    /// Returns `false` if the callback was not registered.
    pub fn remove(&self, event: &str, callback: &ListenerCallback) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(entry) = listeners.get_mut(event) else {
            return false;
        };

        let before = entry.len();
        entry.retain(|existing| !Arc::ptr_eq(existing, callback));
        let removed = entry.len() < before;
        if entry.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Returns the number of callbacks registered for an event.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Delivers a payload to every callback registered for an event.
    ///
    /// Callbacks run outside the registry lock, so a listener may add or
    /// remove listeners. A panicking callback is isolated and logged;
    /// delivery to the remaining callbacks continues. Returns the number of
    /// callbacks invoked.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        let callbacks: Vec<ListenerCallback> = {
            let listeners = self.listeners.lock();
            listeners.get(event).cloned().unwrap_or_default()
        };

        for callback in &callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                error!(event, "listener panicked; continuing with remaining listeners");
            }
        }

        trace!(event, delivered = callbacks.len(), "dispatched");
        callbacks.len()
    }

    /// Removes every callback for every event.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock();
        f.debug_struct("ListenerRegistry")
            .field("events", &listeners.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
