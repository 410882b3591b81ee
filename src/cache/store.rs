//! Cache Store Module
//!
//! Main cache engine: key/value map plus one expiration timer per key,
//! with lifecycle events published on an [`EventBus`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::timer::{ScheduledTask, Scheduler, TokioScheduler};
use crate::cache::{ConfigureOptions, SetParams, DEFAULT_EXPIRE_IN};
use crate::error::Result;
use crate::events::{CacheEvent, EventBus, EventKind};
use crate::inspector::Inspector;

/// Timer armed for a key, tagged with the generation it was armed in.
struct ArmedTimer {
    generation: u64,
    task: Box<dyn ScheduledTask>,
}

/// Everything guarded by the store's single lock.
struct StoreState<V> {
    cache: HashMap<String, V>,
    timers: HashMap<String, ArmedTimer>,
    default_expire_in: Duration,
    with_cache_tools: bool,
    next_generation: u64,
}

impl<V> StoreState<V> {
    fn cancel_timer(&mut self, key: &str) {
        if let Some(timer) = self.timers.remove(key) {
            timer.task.cancel();
        }
    }

    fn cancel_all_timers(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.task.cancel();
        }
    }
}

impl<V> Drop for StoreState<V> {
    fn drop(&mut self) {
        self.cancel_all_timers();
    }
}

struct Shared<V> {
    state: Mutex<StoreState<V>>,
    scheduler: Arc<dyn Scheduler>,
    bus: Arc<EventBus<V>>,
    inspector: Option<Arc<dyn Inspector<V>>>,
}

impl<V: Clone + Send + 'static> Shared<V> {
    fn lock(&self) -> MutexGuard<'_, StoreState<V>> {
        // Every operation mutates the maps before doing anything that could
        // panic, so the state behind a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Render Hook ==
    /// Hands a sorted snapshot to the inspector when tools are enabled.
    fn render(&self) {
        let Some(inspector) = &self.inspector else {
            return;
        };
        let entries = {
            let state = self.lock();
            if !state.with_cache_tools {
                return;
            }
            let mut entries: Vec<(String, V)> = state
                .cache
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries
        };
        inspector.render(&entries);
    }

    /// Timer callback: drops `key` unless a newer timer replaced this one.
    fn expire(&self, key: &str, generation: u64) {
        {
            let mut state = self.lock();
            match state.timers.get(key) {
                Some(timer) if timer.generation == generation => {}
                _ => return,
            }
            state.timers.remove(key);
            state.cache.remove(key);
        }
        debug!(key = %key, "cache entry expired");
        self.render();
    }
}

// == Cache Store ==
/// Key/value cache whose entries expire after a configurable window.
///
/// Cloning the store yields another handle to the same cache.
///
/// Every `set` (re)arms the key's timer; `remove` and `destroy` cancel
/// timers. Natural expiration is silent on the event bus.
pub struct CacheStore<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V: Clone + Send + 'static> CacheStore<V> {
    // == Constructor ==
    /// Creates a store whose timers run on the current Tokio runtime.
    ///
    /// Fails with `CacheError::NoRuntime` outside of a runtime.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Starts a builder for injecting the scheduler, bus or inspector.
    pub fn builder() -> CacheStoreBuilder<V> {
        CacheStoreBuilder::default()
    }

    // == Configure ==
    /// Merges `options` into the current configuration.
    ///
    /// Absent, zero or false values are ignored. When tools become enabled
    /// the inspector is bootstrapped once and rendered.
    pub fn configure(&self, options: ConfigureOptions) {
        let newly_enabled = {
            let mut state = self.shared.lock();
            if let Some(expire_in) = options.effective_expire_in() {
                state.default_expire_in = expire_in;
            }
            let newly_enabled = options.enables_tools() && !state.with_cache_tools;
            if newly_enabled {
                state.with_cache_tools = true;
            }
            info!(
                default_expire_in = ?state.default_expire_in,
                with_cache_tools = state.with_cache_tools,
                "cache configured"
            );
            newly_enabled
        };

        if newly_enabled {
            if let Some(inspector) = &self.shared.inspector {
                inspector.bootstrap();
                info!("cache inspector bootstrapped");
            }
            self.shared.render();
        }
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any previous value and
    /// restarting the key's expiration window.
    pub fn set(&self, key: impl Into<String>, value: V, params: SetParams) -> Result<()> {
        let key = key.into();
        let expire_in = {
            let mut state = self.shared.lock();
            state.cache.insert(key.clone(), value.clone());
            state.cancel_timer(&key);

            let expire_in = params.resolve(state.default_expire_in);
            let generation = state.next_generation;
            state.next_generation += 1;

            let task = self
                .shared
                .scheduler
                .schedule(expire_in, self.expiration_action(key.clone(), generation));
            state.timers.insert(key.clone(), ArmedTimer { generation, task });
            expire_in
        };
        debug!(key = %key, expire_in = ?expire_in, "cache set");

        self.shared.render();
        let event = CacheEvent::keyed(EventKind::Set, key, Some(value));
        self.shared.bus.emit(EventKind::Set, &event)
    }

    fn expiration_action(&self, key: String, generation: u64) -> Box<dyn FnOnce() + Send> {
        let shared: Weak<Shared<V>> = Arc::downgrade(&self.shared);
        Box::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.expire(&key, generation);
            }
        })
    }

    // == Get ==
    /// Returns the value stored under `key`, or `None` when absent.
    ///
    /// Never touches the key's timer.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        let value = self.shared.lock().cache.get(key).cloned();
        debug!(key = %key, hit = value.is_some(), "cache get");

        self.shared.render();
        let event = CacheEvent::keyed(EventKind::Get, key, value.clone());
        self.shared.bus.emit(EventKind::Get, &event)?;
        Ok(value)
    }

    // == Has ==
    /// Whether `key` is currently present. No events, no render.
    pub fn has(&self, key: &str) -> bool {
        self.shared.lock().cache.contains_key(key)
    }

    // == Remove ==
    /// Cancels the timer for `key` and deletes it.
    ///
    /// The emitted event's `value` is read after deletion and is therefore
    /// always `None`.
    pub fn remove(&self, key: &str) -> Result<()> {
        let value_after = {
            let mut state = self.shared.lock();
            state.cancel_timer(key);
            state.cache.remove(key);
            state.cache.get(key).cloned()
        };
        debug!(key = %key, "cache remove");

        self.shared.render();
        let event = CacheEvent::keyed(EventKind::Remove, key, value_after);
        self.shared.bus.emit(EventKind::Remove, &event)
    }

    // == Destroy ==
    /// Cancels every timer and clears the cache.
    pub fn destroy(&self) -> Result<()> {
        let removed = {
            let mut state = self.shared.lock();
            state.cancel_all_timers();
            let removed = state.cache.len();
            state.cache.clear();
            removed
        };
        debug!(removed, "cache destroyed");

        self.shared.render();
        self.shared
            .bus
            .emit(EventKind::Destroy, &CacheEvent::global(EventKind::Destroy))
    }

    // == Keys ==
    /// Current keys, in the map's iteration order.
    pub fn keys(&self) -> Vec<String> {
        self.shared.lock().cache.keys().cloned().collect()
    }

    // == On ==
    /// Subscribes an infallible callback to `kind`.
    ///
    /// There is no way to unsubscribe through this entry point; use
    /// [`EventBus::subscribe`] via [`CacheStore::events`] for that.
    pub fn on<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&CacheEvent<V>) + Send + Sync + 'static,
    {
        let _subscription = self.shared.bus.subscribe(kind, move |event| {
            callback(event);
            Ok(())
        });
    }

    /// The bus this store publishes on.
    pub fn events(&self) -> &Arc<EventBus<V>> {
        &self.shared.bus
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.shared.lock().cache.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.shared.lock().cache.is_empty()
    }

    /// Expiration window applied when `set` gets no explicit one.
    pub fn default_expire_in(&self) -> Duration {
        self.shared.lock().default_expire_in
    }

    /// Whether `configure` has switched the inspector on.
    pub fn tools_enabled(&self) -> bool {
        self.shared.lock().with_cache_tools
    }

    #[cfg(test)]
    pub(crate) fn armed_timers(&self) -> usize {
        self.shared.lock().timers.len()
    }

    /// Checks under one lock that `timers` and `cache` hold the same keys.
    #[cfg(test)]
    pub(crate) fn timers_match_entries(&self) -> bool {
        let state = self.shared.lock();
        state.cache.len() == state.timers.len()
            && state.cache.keys().all(|k| state.timers.contains_key(k))
    }
}

// == Cache Store Builder ==
/// Wires a [`CacheStore`] together. Unset parts get defaults: the current
/// Tokio runtime, a fresh bus and no inspector.
pub struct CacheStoreBuilder<V> {
    scheduler: Option<Arc<dyn Scheduler>>,
    bus: Option<Arc<EventBus<V>>>,
    inspector: Option<Arc<dyn Inspector<V>>>,
}

impl<V> Default for CacheStoreBuilder<V> {
    fn default() -> Self {
        Self {
            scheduler: None,
            bus: None,
            inspector: None,
        }
    }
}

impl<V: Clone + Send + 'static> CacheStoreBuilder<V> {
    /// Runs expiration timers on `scheduler` instead of the current runtime.
    pub fn scheduler(mut self, scheduler: impl Scheduler) -> Self {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }

    /// Publishes on `bus`, e.g. to share one bus between stores.
    pub fn bus(mut self, bus: Arc<EventBus<V>>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Attaches the view refreshed by the render hook.
    pub fn inspector(mut self, inspector: Arc<dyn Inspector<V>>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Builds the store. Fails with `CacheError::NoRuntime` when no
    /// scheduler was given and no Tokio runtime is running.
    pub fn build(self) -> Result<CacheStore<V>> {
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::current()?),
        };

        Ok(CacheStore {
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState {
                    cache: HashMap::new(),
                    timers: HashMap::new(),
                    default_expire_in: DEFAULT_EXPIRE_IN,
                    with_cache_tools: false,
                    next_generation: 0,
                }),
                scheduler,
                bus: self.bus.unwrap_or_default(),
                inspector: self.inspector,
            }),
        })
    }
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("CacheStore")
            .field("entries", &state.cache.len())
            .field("timers", &state.timers.len())
            .field("default_expire_in", &state.default_expire_in)
            .field("with_cache_tools", &state.with_cache_tools)
            .finish()
    }
}
