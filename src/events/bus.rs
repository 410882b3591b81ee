//! Event Bus Module
//!
//! Minimal publish/subscribe registry keyed by event kind.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::trace;

use crate::error::{CacheError, ListenerError, Result};
use crate::events::{CacheEvent, EventKind};

/// Callback invoked for every event of the kind it was registered under.
pub type Listener<V> =
    Arc<dyn Fn(&CacheEvent<V>) -> std::result::Result<(), ListenerError> + Send + Sync>;

type Registry<V> = Mutex<HashMap<EventKind, Vec<(u64, Listener<V>)>>>;

// == Event Bus ==
/// Registry of listeners, invoked synchronously in registration order.
///
/// A listener error is not isolated: it aborts the remaining listeners of
/// that emit and is returned to whoever emitted.
pub struct EventBus<V> {
    listeners: Arc<Registry<V>>,
    next_id: AtomicU64,
}

impl<V> EventBus<V> {
    // == Constructor ==
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    // == Subscribe ==
    /// Registers `listener` under `kind`.
    ///
    /// The returned [`Subscription`] removes exactly this registration, even
    /// when an identical closure was subscribed more than once.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription<V>
    where
        F: Fn(&CacheEvent<V>) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: Listener<V> = Arc::new(listener);
        lock(&self.listeners)
            .entry(kind)
            .or_default()
            .push((id, listener));
        trace!(kind = %kind, id, "listener subscribed");

        Subscription {
            registry: Arc::downgrade(&self.listeners),
            kind,
            id,
        }
    }

    // == Emit ==
    /// Invokes every listener currently registered for `kind`.
    ///
    /// Listeners run on a snapshot of the registration list, so a listener
    /// may subscribe or unsubscribe without affecting the emit in progress.
    pub fn emit(&self, kind: EventKind, event: &CacheEvent<V>) -> Result<()> {
        let snapshot: Vec<Listener<V>> = match lock(&self.listeners).get(&kind) {
            Some(list) => list.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return Ok(()),
        };
        trace!(kind = %kind, listeners = snapshot.len(), "emitting event");

        for listener in snapshot {
            listener(event).map_err(|source| CacheError::Listener { kind, source })?;
        }
        Ok(())
    }

    /// Number of listeners registered under `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        lock(&self.listeners).get(&kind).map_or(0, Vec::len)
    }
}

impl<V> Default for EventBus<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for EventBus<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<EventKind, usize> = lock(&self.listeners)
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

// == Subscription ==
/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the listener registered.
#[must_use = "dropping a Subscription keeps the listener registered forever"]
pub struct Subscription<V> {
    registry: Weak<Registry<V>>,
    kind: EventKind,
    id: u64,
}

impl<V> Subscription<V> {
    /// Removes the listener this handle was created for.
    ///
    /// No-op if the bus has been dropped.
    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if let Some(list) = lock(&registry).get_mut(&self.kind) {
            list.retain(|(id, _)| *id != self.id);
        }
        trace!(kind = %self.kind, id = self.id, "listener unsubscribed");
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl<V> fmt::Debug for Subscription<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

// Listener invocations never happen under this lock, so a poisoned registry
// still holds a consistent list.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
